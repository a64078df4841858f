use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser, ADMIN_ROLES};
use crate::models::{
    AssignCollectorRequest, Customer, CustomerOnboardingForm, CustomerQuery, MessageResponse,
    UpdateStatusRequest,
};
use crate::utils::search::filter_customers;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id", get(get_customer).delete(delete_customer))
        .route("/:id/status", patch(update_status))
        .route("/:id/collector", patch(assign_collector))
}

/// Customers matching the search term and filters
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(CustomerQuery),
    responses(
        (status = 200, description = "Matching customers", body = Vec<Customer>),
        (status = 400, description = "Unknown filter value"),
        (status = 403, description = "Access denied")
    )
)]
pub async fn list_customers(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<CustomerQuery>,
) -> AppResult<Json<Vec<Customer>>> {
    auth_user.require(ADMIN_ROLES)?;
    let customers = state.store.list_customers().await?;
    Ok(Json(filter_customers(customers, &query)?))
}

/// Onboard an individual or business customer
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "customers",
    security(("bearer_auth" = [])),
    request_body = CustomerOnboardingForm,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 422, description = "Per-field validation errors")
    )
)]
pub async fn create_customer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(form): Json<CustomerOnboardingForm>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    auth_user.require(ADMIN_ROLES)?;
    let customer = state.onboarding_service().create_customer(&form).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// One customer by id or customer code
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Customer id or code")),
    responses(
        (status = 200, description = "Customer", body = Customer),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn get_customer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Customer>> {
    auth_user.require(ADMIN_ROLES)?;
    Ok(Json(state.store.get_customer(&id).await?))
}

/// Enable, disable or take off a customer
#[utoipa::path(
    patch,
    path = "/api/customers/{id}/status",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Customer id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated customer", body = Customer),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Customer>> {
    auth_user.require(ADMIN_ROLES)?;
    let customer = state.store.get_customer(&id).await?;
    state
        .store
        .update_customer_status(&customer.id, payload.status)
        .await?;
    tracing::info!(customer_id = %customer.id, status = payload.status.as_str(), "Customer status changed");
    Ok(Json(state.store.get_customer(&customer.id).await?))
}

/// Assign a collector, or clear the assignment
#[utoipa::path(
    patch,
    path = "/api/customers/{id}/collector",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Customer id")),
    request_body = AssignCollectorRequest,
    responses(
        (status = 200, description = "Updated customer", body = Customer),
        (status = 404, description = "Customer or collector not found")
    )
)]
pub async fn assign_collector(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<AssignCollectorRequest>,
) -> AppResult<Json<Customer>> {
    auth_user.require(ADMIN_ROLES)?;
    state
        .assignment_service()
        .assign_customer(&id, payload.collector_id.as_deref())
        .await?;
    Ok(Json(state.store.get_customer(&id).await?))
}

/// Soft delete: the customer is disabled
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer disabled", body = MessageResponse),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    auth_user.require(ADMIN_ROLES)?;
    let customer = state.store.get_customer(&id).await?;
    state.store.delete_customer(&customer.id).await?;
    tracing::info!(customer_id = %customer.id, "Customer disabled");
    Ok(Json(MessageResponse::new("Customer disabled.")))
}
