use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    #[default]
    Individual,
    Business,
}

/// Account status as the operator selects it. Customers collapse it to
/// active/inactive; collectors keep all three values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Enable,
    Disable,
    Takeoff,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Enable => "enable",
            AccountStatus::Disable => "disable",
            AccountStatus::Takeoff => "takeoff",
        }
    }

    pub fn to_customer_status(self) -> CustomerStatus {
        match self {
            AccountStatus::Enable => CustomerStatus::Active,
            AccountStatus::Disable | AccountStatus::Takeoff => CustomerStatus::Inactive,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "enable" => Some(AccountStatus::Enable),
            "disable" => Some(AccountStatus::Disable),
            "takeoff" => Some(AccountStatus::Takeoff),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub code: Option<String>,
    pub name: String,
    pub phone: String,
    pub address: String,
    /// Plan code the customer subscribes to.
    pub package: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_fee: Decimal,
    pub status: CustomerStatus,
    pub customer_type: CustomerType,
    /// Id of the assigned collector record.
    pub collector_id: Option<String>,
    pub join_date: String,
}

#[derive(Debug, Default, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuery {
    pub search: Option<String>,
    /// `all`, `active` or `inactive`
    pub status: Option<String>,
    /// `all`, `individual` or `business`
    pub customer_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: AccountStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignCollectorRequest {
    /// Collector id, or `unassigned` / null to clear.
    pub collector_id: Option<String>,
}
