use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Paid,
    Unpaid,
    Overdue,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Paid => "paid",
            BillStatus::Unpaid => "unpaid",
            BillStatus::Overdue => "overdue",
        }
    }

    /// Unpaid and overdue bills are both still to be collected.
    pub fn is_due(&self) -> bool {
        matches!(self, BillStatus::Unpaid | BillStatus::Overdue)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Transfer,
    Online,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,
    pub customer_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: BillStatus,
    /// Display label of the billing period, e.g. "January 2024".
    pub bill_month: String,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub collector_id: Option<String>,
}

/// Append-only record written when a bill is marked paid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub bill_id: String,
    pub customer_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub collector_id: Option<String>,
    pub receipt_number: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBillStatusRequest {
    pub status: BillStatus,
    pub payment_method: Option<PaymentMethod>,
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BillStatusChange {
    pub bill: Bill,
    pub payment: Option<Payment>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBillsRequest {
    /// Billing period as `YYYY-MM`; defaults to the current month.
    pub bill_month: Option<String>,
    /// Defaults to fifteen days from today.
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct BillQuery {
    pub search: Option<String>,
    /// `all`, `paid`, `unpaid` or `overdue`
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillView {
    #[serde(flatten)]
    pub bill: Bill,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
}
