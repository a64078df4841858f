use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::{Bill, BillView, Collector, CollectorPerformance, Customer, Payment};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
    pub total_bills: usize,
    pub paid_bills: usize,
    pub unpaid_bills: usize,
    pub overdue_bills: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub collection_rate: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_customers: usize,
    pub active_customers: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub today_collection: Decimal,
    pub pending_bills: usize,
    pub overdue_bills: usize,
    pub summary: BillSummary,
    /// Bill count per status name.
    pub status_breakdown: BTreeMap<String, usize>,
    pub recent_bills: Vec<BillView>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub collection_rate: Decimal,
    pub active_customers: usize,
    pub summary: BillSummary,
    pub collector_performance: Vec<CollectorPerformance>,
    pub package_breakdown: Vec<PackageBreakdown>,
}

#[derive(Debug, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageBreakdown {
    pub package: String,
    pub customers: usize,
    /// Sum of the monthly fees of the package's customers.
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_revenue: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignedCustomer {
    #[serde(flatten)]
    pub customer: Customer,
    /// Most recent bill by due date.
    pub last_bill: Option<Bill>,
    pub last_paid_date: Option<NaiveDate>,
    pub due_bills: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectorDashboard {
    pub collector: Collector,
    pub customers: Vec<AssignedCustomer>,
    pub due_bills: Vec<BillView>,
    pub pending_count: usize,
    pub overdue_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub today_collection: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDashboard {
    pub customer: Customer,
    pub bills: Vec<Bill>,
    pub payments: Vec<Payment>,
    pub paid_count: usize,
    pub unpaid_count: usize,
    pub overdue_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_paid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding_amount: Decimal,
}
