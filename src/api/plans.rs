use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use rust_decimal::Decimal;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{Plan, PlanPayload, PlanQuery, PlanRequest, PlanStatus, UserRole};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/:id", put(update_plan))
}

/// Form values to the remote plan body.
pub fn plan_payload(request: &PlanRequest) -> AppResult<PlanPayload> {
    request.validate()?;
    let monthly_fee = Decimal::from_str(request.monthly_fee.trim())
        .map_err(|_| AppError::validation("monthlyFee", "Monthly fee must be a number."))?;
    if monthly_fee.is_sign_negative() {
        return Err(AppError::validation(
            "monthlyFee",
            "Monthly fee must be a number.",
        ));
    }
    let bandwidth = request.bandwidth_plan.trim();

    Ok(PlanPayload {
        plan_code: request.plan_code.trim().to_string(),
        plan_name: request.plan_name.trim().to_string(),
        bandwidth_plan: (!bandwidth.is_empty()).then(|| bandwidth.to_string()),
        monthly_fee,
        currency: request.currency.as_str().to_string(),
        is_active: request.status == PlanStatus::Active,
    })
}

/// Service plan catalog
#[utoipa::path(
    get,
    path = "/api/plans",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(PlanQuery),
    responses(
        (status = 200, description = "Plans", body = Vec<Plan>)
    )
)]
pub async fn list_plans(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<PlanQuery>,
) -> AppResult<Json<Vec<Plan>>> {
    let plans = state.store.list_plans().await?;
    let plans = if query.active_only {
        plans.into_iter().filter(|p| p.is_active).collect()
    } else {
        plans
    };
    Ok(Json(plans))
}

/// Add a plan
#[utoipa::path(
    post,
    path = "/api/plans",
    tag = "plans",
    security(("bearer_auth" = [])),
    request_body = PlanRequest,
    responses(
        (status = 201, description = "Plan created", body = Plan),
        (status = 403, description = "Super-admin only"),
        (status = 409, description = "Plan code already exists"),
        (status = 422, description = "Per-field validation errors")
    )
)]
pub async fn create_plan(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<PlanRequest>,
) -> AppResult<(StatusCode, Json<Plan>)> {
    auth_user.require(&[UserRole::SuperAdmin])?;
    let body = plan_payload(&payload)?;
    let plan = state.store.create_plan(&body).await?;
    tracing::info!(plan_code = %plan.plan_code, "Plan created");
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Edit a plan
#[utoipa::path(
    put,
    path = "/api/plans/{id}",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Plan id")),
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Plan updated", body = Plan),
        (status = 403, description = "Super-admin only"),
        (status = 404, description = "Plan not found")
    )
)]
pub async fn update_plan(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<PlanRequest>,
) -> AppResult<Json<Plan>> {
    auth_user.require(&[UserRole::SuperAdmin])?;
    let body = plan_payload(&payload)?;
    let plan = state.store.update_plan(&id, &body).await?;
    tracing::info!(plan_id = %plan.id, "Plan updated");
    Ok(Json(plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Currency;

    fn request(fee: &str, bandwidth: &str, status: PlanStatus) -> PlanRequest {
        PlanRequest {
            plan_code: " FIBER-100 ".to_string(),
            plan_name: "Fiber 100".to_string(),
            bandwidth_plan: bandwidth.to_string(),
            monthly_fee: fee.to_string(),
            currency: Currency::Mmk,
            status,
        }
    }

    #[test]
    fn test_plan_payload_mapping() {
        let payload = plan_payload(&request("45000", "  ", PlanStatus::Draft)).unwrap();
        assert_eq!(payload.plan_code, "FIBER-100");
        assert_eq!(payload.bandwidth_plan, None);
        assert_eq!(payload.monthly_fee, Decimal::new(45000, 0));
        assert_eq!(payload.currency, "MMK");
        assert!(!payload.is_active);
    }

    #[test]
    fn test_plan_fee_must_be_numeric() {
        let err = plan_payload(&request("abc", "100 Mbps", PlanStatus::Active)).unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields["monthlyFee"], "Monthly fee must be a number.")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
