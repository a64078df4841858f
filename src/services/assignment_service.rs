use std::collections::BTreeSet;
use std::sync::Arc;

use axum::http::StatusCode;
use tokio::task::JoinSet;

use crate::error::{AppError, AppResult};
use crate::models::{AssignmentOutcome, Collector};
use crate::services::record_store::RecordStore;

pub struct AssignmentService {
    store: Arc<dyn RecordStore>,
}

/// Customers to hand to the collector and customers to release.
pub fn diff_assignments(
    current: &BTreeSet<String>,
    desired: &BTreeSet<String>,
) -> (Vec<String>, Vec<String>) {
    let assign = desired.difference(current).cloned().collect();
    let unassign = current.difference(desired).cloned().collect();
    (assign, unassign)
}

impl AssignmentService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Single customer. `None` or `"unassigned"` clears the assignment.
    pub async fn assign_customer(
        &self,
        customer_id: &str,
        collector_id: Option<&str>,
    ) -> AppResult<()> {
        let customer = self.store.get_customer(customer_id).await?;
        let collector = match collector_id.map(str::trim) {
            None | Some("") | Some("unassigned") => None,
            Some(id) => Some(self.store.get_collector(id).await?),
        };
        self.store
            .assign_collector(&customer.id, collector.as_ref())
            .await?;
        tracing::info!(
            customer_id = %customer.id,
            collector_id = collector.as_ref().map(|c| c.id.as_str()),
            "Collector assignment updated"
        );
        Ok(())
    }

    /// Makes `customer_ids` the exact set of customers owned by the collector.
    /// All changes are sent at once; nothing is rolled back on partial failure.
    pub async fn save_assignments(
        &self,
        collector_id: &str,
        customer_ids: &[String],
    ) -> AppResult<AssignmentOutcome> {
        let (collector, customers) =
            tokio::try_join!(self.store.get_collector(collector_id), self.store.list_customers())?;

        let current: BTreeSet<String> = customers
            .iter()
            .filter(|c| c.collector_id.as_deref() == Some(collector.id.as_str()))
            .map(|c| c.id.clone())
            .collect();
        let desired: BTreeSet<String> = customer_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        let known: BTreeSet<&str> = customers.iter().map(|c| c.id.as_str()).collect();
        if let Some(unknown) = desired.iter().find(|id| !known.contains(id.as_str())) {
            return Err(AppError::NotFound(format!("Customer {} not found", unknown)));
        }

        let (assign, unassign) = diff_assignments(&current, &desired);
        if assign.is_empty() && unassign.is_empty() {
            tracing::debug!(collector_id = %collector.id, "Assignments unchanged");
            return Ok(AssignmentOutcome {
                assigned: assign,
                unassigned: unassign,
            });
        }

        let collector = Arc::new(collector);
        let mut tasks = JoinSet::new();
        for id in &assign {
            tasks.spawn(update(self.store.clone(), id.clone(), Some(collector.clone())));
        }
        for id in &unassign {
            tasks.spawn(update(self.store.clone(), id.clone(), None));
        }

        let total = assign.len() + unassign.len();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(e.to_string()),
                Err(e) => failures.push(format!("assignment task aborted: {}", e)),
            }
        }

        if let Some(first) = failures.first() {
            tracing::warn!(
                collector_id = %collector.id,
                failed = failures.len(),
                total,
                "Some assignment requests failed"
            );
            return Err(AppError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: format!(
                    "Failed to assign customers: {} of {} requests failed ({})",
                    failures.len(),
                    total,
                    first
                ),
            });
        }

        tracing::info!(
            collector_id = %collector.id,
            assigned = assign.len(),
            unassigned = unassign.len(),
            "Assignments saved"
        );
        Ok(AssignmentOutcome {
            assigned: assign,
            unassigned: unassign,
        })
    }
}

async fn update(
    store: Arc<dyn RecordStore>,
    customer_id: String,
    collector: Option<Arc<Collector>>,
) -> AppResult<()> {
    store
        .assign_collector(&customer_id, collector.as_deref())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend_client::BackendClient;
    use crate::services::memory_store::MemoryStore;
    use crate::services::remote_store::RemoteStore;
    use crate::config::Config;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_diff_assignments() {
        let (assign, unassign) = diff_assignments(&set(&["1", "2"]), &set(&["2", "3"]));
        assert_eq!(assign, vec!["3"]);
        assert_eq!(unassign, vec!["1"]);
    }

    #[tokio::test]
    async fn test_save_assignments_applies_diff() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::seeded());
        let service = AssignmentService::new(store.clone());

        // Collector 1 owns 1, 2 and 5 in the demo data.
        let outcome = service
            .save_assignments("1", &["1".to_string(), "3".to_string()])
            .await
            .unwrap();
        assert_eq!(outcome.assigned, vec!["3"]);
        assert_eq!(outcome.unassigned, vec!["2", "5"]);

        let customers = store.list_customers().await.unwrap();
        let owned: Vec<&str> = customers
            .iter()
            .filter(|c| c.collector_id.as_deref() == Some("1"))
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(owned, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_unchanged_set_is_noop() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::seeded());
        let service = AssignmentService::new(store);
        let outcome = service
            .save_assignments("2", &["3".to_string(), "4".to_string()])
            .await
            .unwrap();
        assert!(outcome.assigned.is_empty());
        assert!(outcome.unassigned.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::seeded());
        let service = AssignmentService::new(store);
        let result = service.save_assignments("2", &["99".to_string()]).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_single_assignment_accepts_unassigned() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::seeded());
        let service = AssignmentService::new(store.clone());
        service.assign_customer("3", Some("unassigned")).await.unwrap();
        let customer = store.get_customer("3").await.unwrap();
        assert_eq!(customer.collector_id, None);
    }

    #[tokio::test]
    async fn test_partial_failure_reports_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collectors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 7, "collectorCode": "COL-7", "user": {"name": "Ko Min"}}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/customers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
                {"id": 1, "personalName": "A", "collectorCode": "COL-7"},
                {"id": 2, "personalName": "B"},
                {"id": 3, "personalName": "C"}
            ]})))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/customers/2"))
            .and(body_json(json!({"collectorCode": "COL-7"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/customers/3"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"message": "Database down"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/customers/1"))
            .and(body_json(json!({"collectorCode": null})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = BackendClient::new(&Config::for_tests(&server.uri())).unwrap();
        let service = AssignmentService::new(Arc::new(RemoteStore::new(backend)));
        let err = service
            .save_assignments("7", &["2".to_string(), "3".to_string()])
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to assign customers: 1 of 3 requests failed (Database down)"
        );
    }
}
