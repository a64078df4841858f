use axum::{extract::State, routing::post, Json, Router};

use crate::error::AppResult;
use crate::middleware::AppState;
use crate::models::{ForgotPasswordRequest, ResetLinkSent};

pub fn routes() -> Router<AppState> {
    Router::new().route("/send", post(send_reset_link))
}

/// Email a password reset link
#[utoipa::path(
    post,
    path = "/api/send",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent", body = ResetLinkSent),
        (status = 400, description = "Email is required."),
        (status = 500, description = "No reset token or email delivery failed")
    )
)]
pub async fn send_reset_link(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ResetLinkSent>> {
    let sent = state.password_service().send_reset_link(&payload).await?;
    Ok(Json(sent))
}
