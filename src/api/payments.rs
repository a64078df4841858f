use axum::{extract::State, routing::get, Json, Router};

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser};
use crate::models::{Payment, UserRole};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_payments))
}

/// Payment log, newest first, scoped to the caller's role
#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payments", body = Vec<Payment>),
        (status = 404, description = "No collector or customer record for the account")
    )
)]
pub async fn list_payments(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<Payment>>> {
    let payments = state.store.list_payments().await?;
    let mut payments: Vec<Payment> = match auth_user.role {
        UserRole::Admin | UserRole::SuperAdmin => payments,
        UserRole::Collector => {
            let collector = auth_user.resolve_collector(&state.store.list_collectors().await?)?;
            payments
                .into_iter()
                .filter(|p| p.collector_id.as_deref() == Some(collector.id.as_str()))
                .collect()
        }
        UserRole::Customer => {
            let customer = auth_user.resolve_customer(&state.store.list_customers().await?)?;
            payments
                .into_iter()
                .filter(|p| p.customer_id == customer.id)
                .collect()
        }
    };
    payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
    Ok(Json(payments))
}
