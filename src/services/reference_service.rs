use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::models::{NrcData, RawDocument, ReferenceDocument, SelectOption, TownshipTree};

/// JSON lookup tables kept as files under one directory.
pub struct ReferenceService {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl ReferenceService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn path(&self, doc: ReferenceDocument) -> PathBuf {
        self.dir.join(doc.file_name())
    }

    async fn read_text(&self, doc: ReferenceDocument) -> AppResult<String> {
        let path = self.path(doc);
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Reference data unreadable");
            AppError::Internal(format!("Failed to read {} data.", doc.label()))
        })
    }

    pub async fn read_raw(&self, doc: ReferenceDocument) -> AppResult<RawDocument> {
        Ok(RawDocument {
            content: self.read_text(doc).await?,
        })
    }

    /// `content` must be a string holding valid JSON. It is stored pretty-printed.
    pub async fn write_raw(&self, doc: ReferenceDocument, content: Option<&Value>) -> AppResult<()> {
        let text = content
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::BadRequest("Content must be a JSON string.".to_string()))?;
        let parsed: Value = serde_json::from_str(text)
            .map_err(|_| AppError::BadRequest("Invalid JSON. Please check formatting.".to_string()))?;
        let mut pretty = serde_json::to_string_pretty(&parsed)?;
        pretty.push('\n');

        let _guard = self.write_lock.lock().await;
        let path = self.path(doc);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, pretty).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::info!(path = %path.display(), "Reference data saved");
        Ok(())
    }

    pub async fn snapshot(&self) -> AppResult<ReferenceSnapshot> {
        let nrc_text = self.read_text(ReferenceDocument::Nrc).await?;
        let township_text = self.read_text(ReferenceDocument::Township).await?;
        let nrc: NrcData = serde_json::from_str(&nrc_text).map_err(|e| {
            tracing::error!(error = %e, "NRC data malformed");
            AppError::Internal("Failed to read NRC data.".to_string())
        })?;
        let townships: TownshipTree = serde_json::from_str(&township_text).map_err(|e| {
            tracing::error!(error = %e, "Township data malformed");
            AppError::Internal("Failed to read township data.".to_string())
        })?;
        Ok(ReferenceSnapshot { nrc, townships })
    }
}

/// Parsed reference data backing the cascading selects.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSnapshot {
    pub nrc: NrcData,
    pub townships: TownshipTree,
}

impl ReferenceSnapshot {
    pub fn regions(&self) -> Vec<String> {
        self.townships.keys().cloned().collect()
    }

    /// Empty when the region is blank or unknown.
    pub fn districts(&self, region: &str) -> Vec<String> {
        self.townships
            .get(region)
            .map(|districts| districts.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn township_names(&self, region: &str, district: &str) -> Vec<String> {
        let mut names = self
            .townships
            .get(region)
            .and_then(|districts| districts.get(district))
            .cloned()
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn has_address(&self, region: &str, district: &str, township: &str) -> bool {
        self.townships
            .get(region)
            .and_then(|districts| districts.get(district))
            .map_or(false, |names| names.iter().any(|t| t == township))
    }

    pub fn nrc_states(&self) -> Vec<SelectOption> {
        self.nrc
            .nrc_states
            .iter()
            .map(|state| SelectOption {
                value: state.number.en.clone(),
                label: format!("{} - {}", state.number.en, state.name.en),
            })
            .collect()
    }

    pub fn nrc_townships(&self, state: &str) -> Vec<SelectOption> {
        let mut townships: Vec<_> = self
            .nrc
            .nrc_townships
            .iter()
            .filter(|t| t.state_code == state)
            .collect();
        townships.sort_by(|a, b| a.name.en.cmp(&b.name.en));
        townships
            .into_iter()
            .map(|t| SelectOption {
                value: t.short.en.clone(),
                label: format!("{} - {}", t.short.en, t.name.en),
            })
            .collect()
    }

    pub fn nrc_types(&self) -> Vec<SelectOption> {
        self.nrc
            .nrc_types
            .iter()
            .map(|t| SelectOption::plain(&t.name.en))
            .collect()
    }

    pub fn has_nrc_state(&self, state: &str) -> bool {
        self.nrc.nrc_states.iter().any(|s| s.number.en == state)
    }

    pub fn has_nrc_township(&self, state: &str, short: &str) -> bool {
        self.nrc
            .nrc_townships
            .iter()
            .any(|t| t.state_code == state && t.short.en == short)
    }

    pub fn has_nrc_type(&self, nrc_type: &str) -> bool {
        self.nrc.nrc_types.iter().any(|t| t.name.en == nrc_type)
    }
}
