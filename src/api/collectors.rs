use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, put},
    Json, Router,
};

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser, ADMIN_ROLES};
use crate::models::{
    AssignCustomersRequest, AssignmentOutcome, Collector, CollectorForm, CollectorListResponse,
    CollectorQuery, CollectorWithStats, MessageResponse, UpdateStatusRequest,
};
use crate::services::stats;
use crate::utils::search::filter_collectors;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_collectors).post(create_collector))
        .route("/:id", put(update_collector).delete(delete_collector))
        .route("/:id/status", patch(update_status))
        .route("/:id/assignments", put(save_assignments))
}

/// Collectors with their performance figures
#[utoipa::path(
    get,
    path = "/api/collectors",
    tag = "collectors",
    security(("bearer_auth" = [])),
    params(CollectorQuery),
    responses(
        (status = 200, description = "Collectors and totals", body = CollectorListResponse),
        (status = 403, description = "Access denied")
    )
)]
pub async fn list_collectors(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<CollectorQuery>,
) -> AppResult<Json<CollectorListResponse>> {
    auth_user.require(ADMIN_ROLES)?;
    let (collectors, customers, bills) = tokio::try_join!(
        state.store.list_collectors(),
        state.store.list_customers(),
        state.store.list_bills()
    )?;

    let total_collectors = collectors.len();
    let average =
        stats::average_customers_per_collector(customers.len(), total_collectors);
    let collectors = filter_collectors(collectors, &query)
        .into_iter()
        .map(|collector| {
            let performance = stats::collector_performance(&collector, &customers, &bills);
            CollectorWithStats::new(collector, performance)
        })
        .collect();

    Ok(Json(CollectorListResponse {
        collectors,
        total_collectors,
        average_customers_per_collector: average,
    }))
}

/// Create a collector account
#[utoipa::path(
    post,
    path = "/api/collectors",
    tag = "collectors",
    security(("bearer_auth" = [])),
    request_body = CollectorForm,
    responses(
        (status = 201, description = "Collector created", body = Collector),
        (status = 422, description = "Per-field validation errors")
    )
)]
pub async fn create_collector(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(form): Json<CollectorForm>,
) -> AppResult<(StatusCode, Json<Collector>)> {
    auth_user.require(ADMIN_ROLES)?;
    let collector = state.onboarding_service().create_collector(&form).await?;
    Ok((StatusCode::CREATED, Json(collector)))
}

/// Edit a collector with the same rules as creation
#[utoipa::path(
    put,
    path = "/api/collectors/{id}",
    tag = "collectors",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Collector id or code")),
    request_body = CollectorForm,
    responses(
        (status = 200, description = "Collector updated", body = Collector),
        (status = 404, description = "Collector not found"),
        (status = 422, description = "Per-field validation errors")
    )
)]
pub async fn update_collector(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(form): Json<CollectorForm>,
) -> AppResult<Json<Collector>> {
    auth_user.require(ADMIN_ROLES)?;
    let collector = state
        .onboarding_service()
        .update_collector(&id, &form)
        .await?;
    Ok(Json(collector))
}

/// Enable, disable or take off a collector
#[utoipa::path(
    patch,
    path = "/api/collectors/{id}/status",
    tag = "collectors",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Collector id or code")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated collector", body = Collector),
        (status = 404, description = "Collector not found")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Collector>> {
    auth_user.require(ADMIN_ROLES)?;
    let collector = state.store.get_collector(&id).await?;
    state
        .store
        .update_collector_status(&collector.id, payload.status)
        .await?;
    tracing::info!(collector_id = %collector.id, status = payload.status.as_str(), "Collector status changed");
    Ok(Json(state.store.get_collector(&collector.id).await?))
}

/// Replace the set of customers assigned to a collector
#[utoipa::path(
    put,
    path = "/api/collectors/{id}/assignments",
    tag = "collectors",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Collector id or code")),
    request_body = AssignCustomersRequest,
    responses(
        (status = 200, description = "Applied changes", body = AssignmentOutcome),
        (status = 502, description = "Some assignment requests failed")
    )
)]
pub async fn save_assignments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<AssignCustomersRequest>,
) -> AppResult<Json<AssignmentOutcome>> {
    auth_user.require(ADMIN_ROLES)?;
    let outcome = state
        .assignment_service()
        .save_assignments(&id, &payload.customer_ids)
        .await?;
    Ok(Json(outcome))
}

/// Soft delete: the collector is disabled
#[utoipa::path(
    delete,
    path = "/api/collectors/{id}",
    tag = "collectors",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Collector id or code")),
    responses(
        (status = 200, description = "Collector disabled", body = MessageResponse),
        (status = 404, description = "Collector not found")
    )
)]
pub async fn delete_collector(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    auth_user.require(ADMIN_ROLES)?;
    let collector = state.store.get_collector(&id).await?;
    state.store.delete_collector(&collector.id).await?;
    tracing::info!(collector_id = %collector.id, "Collector disabled");
    Ok(Json(MessageResponse::new("Collector disabled.")))
}
