use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub plan_code: String,
    pub plan_name: String,
    pub bandwidth_plan: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_fee: Decimal,
    pub currency: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum Currency {
    #[default]
    #[serde(rename = "MMK")]
    Mmk,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Mmk => "MMK",
            Currency::Usd => "USD",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Active,
    Draft,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[validate(length(min = 1, message = "Plan code is required."))]
    pub plan_code: String,
    #[validate(length(min = 1, message = "Plan name is required."))]
    pub plan_name: String,
    #[serde(default)]
    pub bandwidth_plan: String,
    /// Accepted as text, as typed in the form.
    #[validate(length(min = 1, message = "Monthly fee is required."))]
    pub monthly_fee: String,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub status: PlanStatus,
}

/// Body sent to the remote `/plans` endpoints.
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanPayload {
    pub plan_code: String,
    pub plan_name: String,
    pub bandwidth_plan: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_fee: Decimal,
    pub currency: String,
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PlanQuery {
    /// Only plans selectable during onboarding.
    #[serde(default)]
    pub active_only: bool,
}
