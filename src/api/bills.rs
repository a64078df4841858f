use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};

use super::today;
use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser, ADMIN_ROLES};
use crate::models::{
    Bill, BillQuery, BillStatusChange, BillView, GenerateBillsRequest, UpdateBillStatusRequest,
    UserRole,
};
use crate::services::billing_service::attach_customers;
use crate::utils::search::filter_bills;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bills))
        .route("/generate", post(generate_bills))
        .route("/:id/status", patch(update_status))
}

/// Collector id the caller acts as; `None` for operators.
async fn acting_collector(state: &AppState, auth_user: &AuthUser) -> AppResult<Option<String>> {
    match auth_user.role {
        UserRole::Admin | UserRole::SuperAdmin => Ok(None),
        UserRole::Collector => {
            let collectors = state.store.list_collectors().await?;
            Ok(Some(auth_user.resolve_collector(&collectors)?.id))
        }
        UserRole::Customer => Err(AppError::Forbidden),
    }
}

/// Bills with customer details; collectors see their own bills only
#[utoipa::path(
    get,
    path = "/api/bills",
    tag = "bills",
    security(("bearer_auth" = [])),
    params(BillQuery),
    responses(
        (status = 200, description = "Matching bills", body = Vec<BillView>),
        (status = 400, description = "Unknown status filter"),
        (status = 403, description = "Access denied")
    )
)]
pub async fn list_bills(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<BillQuery>,
) -> AppResult<Json<Vec<BillView>>> {
    let collector_id = acting_collector(&state, &auth_user).await?;
    let (bills, customers) = tokio::try_join!(state.store.list_bills(), state.store.list_customers())?;

    let bills: Vec<Bill> = match collector_id {
        Some(id) => bills
            .into_iter()
            .filter(|b| b.collector_id.as_deref() == Some(id.as_str()))
            .collect(),
        None => bills,
    };
    Ok(Json(filter_bills(attach_customers(bills, &customers), &query)?))
}

/// Mark a bill paid, unpaid or overdue
#[utoipa::path(
    patch,
    path = "/api/bills/{id}/status",
    tag = "bills",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Bill id")),
    request_body = UpdateBillStatusRequest,
    responses(
        (status = 200, description = "Updated bill and the payment recorded, if any", body = BillStatusChange),
        (status = 403, description = "Bill belongs to another collector"),
        (status = 404, description = "Bill not found"),
        (status = 409, description = "Bill is already paid")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBillStatusRequest>,
) -> AppResult<Json<BillStatusChange>> {
    let collector_id = acting_collector(&state, &auth_user).await?;
    let change = state
        .billing_service()
        .update_bill_status(&id, &payload, collector_id.as_deref(), today())
        .await?;
    Ok(Json(change))
}

/// Create the month's bills for active customers
#[utoipa::path(
    post,
    path = "/api/bills/generate",
    tag = "bills",
    security(("bearer_auth" = [])),
    request_body = GenerateBillsRequest,
    responses(
        (status = 201, description = "Bills created", body = Vec<Bill>),
        (status = 422, description = "Malformed bill month")
    )
)]
pub async fn generate_bills(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<GenerateBillsRequest>,
) -> AppResult<(StatusCode, Json<Vec<Bill>>)> {
    auth_user.require(ADMIN_ROLES)?;
    let created = state
        .billing_service()
        .generate_bills(&payload, today())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
