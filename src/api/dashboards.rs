use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::today;
use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser, ADMIN_ROLES};
use crate::models::{AdminDashboard, CollectorDashboard, CustomerDashboard, Report, UserRole};
use crate::services::stats;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct CollectorDashboardQuery {
    /// Filters the assigned customers by name, phone or id.
    pub search: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_dashboard))
        .route("/reports", get(reports))
        .route("/collector", get(collector_dashboard))
        .route("/customer", get(customer_dashboard))
}

/// Operator overview
#[utoipa::path(
    get,
    path = "/api/dashboard/admin",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Admin dashboard", body = AdminDashboard),
        (status = 403, description = "Access denied")
    )
)]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<AdminDashboard>> {
    auth_user.require(ADMIN_ROLES)?;
    let (customers, bills, payments) = tokio::try_join!(
        state.store.list_customers(),
        state.store.list_bills(),
        state.store.list_payments()
    )?;
    Ok(Json(stats::admin_dashboard(
        &customers,
        &bills,
        &payments,
        today(),
    )))
}

/// Revenue, collection rates and collector performance
#[utoipa::path(
    get,
    path = "/api/dashboard/reports",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reports", body = Report),
        (status = 403, description = "Access denied")
    )
)]
pub async fn reports(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Report>> {
    auth_user.require(ADMIN_ROLES)?;
    let (customers, collectors, bills, payments) = tokio::try_join!(
        state.store.list_customers(),
        state.store.list_collectors(),
        state.store.list_bills(),
        state.store.list_payments()
    )?;
    Ok(Json(stats::report(&customers, &collectors, &bills, &payments)))
}

/// The signed-in collector's customers and due bills
#[utoipa::path(
    get,
    path = "/api/dashboard/collector",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    params(CollectorDashboardQuery),
    responses(
        (status = 200, description = "Collector dashboard", body = CollectorDashboard),
        (status = 403, description = "Access denied"),
        (status = 404, description = "No collector record for the account")
    )
)]
pub async fn collector_dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<CollectorDashboardQuery>,
) -> AppResult<Json<CollectorDashboard>> {
    auth_user.require(&[UserRole::Collector])?;
    let (collectors, customers, bills, payments) = tokio::try_join!(
        state.store.list_collectors(),
        state.store.list_customers(),
        state.store.list_bills(),
        state.store.list_payments()
    )?;
    let collector = auth_user.resolve_collector(&collectors)?;
    let dashboard = stats::collector_dashboard(
        collector,
        customers,
        &bills,
        &payments,
        query.search,
        today(),
    )?;
    Ok(Json(dashboard))
}

/// The signed-in customer's bills and payments
#[utoipa::path(
    get,
    path = "/api/dashboard/customer",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Customer dashboard", body = CustomerDashboard),
        (status = 403, description = "Access denied"),
        (status = 404, description = "No customer record for the account")
    )
)]
pub async fn customer_dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<CustomerDashboard>> {
    auth_user.require(&[UserRole::Customer])?;
    let (customers, bills, payments) = tokio::try_join!(
        state.store.list_customers(),
        state.store.list_bills(),
        state.store.list_payments()
    )?;
    let customer = auth_user.resolve_customer(&customers)?;
    Ok(Json(stats::customer_dashboard(customer, &bills, &payments)))
}
