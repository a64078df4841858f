use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceDocument {
    Nrc,
    Township,
}

impl ReferenceDocument {
    pub fn file_name(&self) -> &'static str {
        match self {
            ReferenceDocument::Nrc => "nrc-data.json",
            ReferenceDocument::Township => "township.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReferenceDocument::Nrc => "NRC",
            ReferenceDocument::Township => "township",
        }
    }

    pub fn saved_message(&self) -> &'static str {
        match self {
            ReferenceDocument::Nrc => "NRC data saved.",
            ReferenceDocument::Township => "Township data saved.",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mm: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NrcState {
    pub number: LocalizedText,
    pub name: LocalizedText,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NrcTownship {
    pub state_code: String,
    pub short: LocalizedText,
    pub name: LocalizedText,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NrcType {
    pub name: LocalizedText,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NrcData {
    #[serde(default)]
    pub nrc_states: Vec<NrcState>,
    #[serde(default)]
    pub nrc_townships: Vec<NrcTownship>,
    #[serde(default)]
    pub nrc_types: Vec<NrcType>,
}

/// region -> district -> townships
pub type TownshipTree = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn plain(value: &str) -> Self {
        Self {
            value: value.to_string(),
            label: value.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RawDocument {
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WriteDocumentRequest {
    /// Must be a string holding the JSON document.
    #[schema(value_type = String)]
    pub content: Option<serde_json::Value>,
}
