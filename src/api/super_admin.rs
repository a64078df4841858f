use axum::{extract::State, routing::post, Json, Router};
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::AppState;
use crate::models::{LoginResponse, SuperAdminLoginRequest};

pub fn routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Sign in with the configured super-admin credentials
#[utoipa::path(
    post,
    path = "/api/super-admin/login",
    tag = "super-admin",
    request_body = SuperAdminLoginRequest,
    responses(
        (status = 200, description = "Super-admin session opened", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<SuperAdminLoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    payload.validate()?;
    let response = state
        .session_service()
        .super_admin_login(&payload.identifier, &payload.password)
        .await?;
    Ok(Json(response))
}
