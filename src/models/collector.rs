use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AccountStatus, NrcInput};
use crate::utils::nrc::parse_nrc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Collector {
    pub id: String,
    pub collector_code: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub area: String,
    pub status: AccountStatus,
    pub nrc: String,
    pub address: String,
}

impl Collector {
    /// Value the remote API stores on a customer to reference this collector.
    pub fn assignment_value(&self) -> &str {
        match self.collector_code.as_deref() {
            Some(code) if !code.trim().is_empty() => code,
            _ => &self.id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectorPerformance {
    pub collector_id: String,
    pub name: String,
    pub assigned_customers: usize,
    pub total_bills: usize,
    pub paid_bills: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_collected: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub collection_rate: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectorWithStats {
    #[serde(flatten)]
    pub collector: Collector,
    /// `nrc` split back into the form's four fields for editing.
    pub nrc_parts: NrcInput,
    pub stats: CollectorPerformance,
}

impl CollectorWithStats {
    pub fn new(collector: Collector, stats: CollectorPerformance) -> Self {
        Self {
            nrc_parts: parse_nrc(&collector.nrc),
            collector,
            stats,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectorListResponse {
    pub collectors: Vec<CollectorWithStats>,
    pub total_collectors: usize,
    pub average_customers_per_collector: u64,
}

#[derive(Debug, Default, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct CollectorQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignCustomersRequest {
    /// Full set of customers the collector should own after the save.
    pub customer_ids: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentOutcome {
    pub assigned: Vec<String>,
    pub unassigned: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collector(nrc: &str) -> Collector {
        Collector {
            id: "1".to_string(),
            collector_code: Some("COL-1".to_string()),
            name: "John Collector".to_string(),
            phone: "0912345".to_string(),
            email: String::new(),
            area: "Kamayut".to_string(),
            status: AccountStatus::Enable,
            nrc: nrc.to_string(),
            address: String::new(),
        }
    }

    fn stats() -> CollectorPerformance {
        CollectorPerformance {
            collector_id: "1".to_string(),
            name: "John Collector".to_string(),
            assigned_customers: 0,
            total_bills: 0,
            paid_bills: 0,
            total_collected: Decimal::ZERO,
            collection_rate: Decimal::ZERO,
        }
    }

    #[test]
    fn test_listing_splits_stored_nrc() {
        let listed = CollectorWithStats::new(collector("12/KaMaYa(N)123456"), stats());
        let body = serde_json::to_value(&listed).unwrap();
        assert_eq!(body["nrc"], "12/KaMaYa(N)123456");
        assert_eq!(
            body["nrcParts"],
            json!({"state": "12", "township": "KaMaYa", "type": "N", "number": "123456"})
        );
        assert_eq!(body["collectorCode"], "COL-1");
    }

    #[test]
    fn test_listing_without_nrc_has_empty_parts() {
        let listed = CollectorWithStats::new(collector(""), stats());
        assert_eq!(listed.nrc_parts, NrcInput::default());
    }
}
