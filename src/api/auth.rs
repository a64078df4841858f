use axum::{
    extract::State,
    routing::{get, patch, post},
    Json, Router,
};
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, ResetPasswordRequest,
    ResetToken, SecurityQuestion, SecurityQuestionResetRequest, SecurityQuestionsRequest,
    UpdateProfileRequest, User,
};

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct SecurityQuestionsResponse {
    pub questions: Vec<SecurityQuestion>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/profile", patch(update_profile))
        .route("/change-password", post(change_password))
        .route("/reset-password", post(reset_password))
        .route("/security-questions", post(security_questions))
        .route("/security-question-reset", post(security_question_reset))
}

/// Sign in with email or username
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Missing identifier or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    payload.validate()?;
    let response = state
        .session_service()
        .login(payload.identifier.trim(), &payload.password)
        .await?;
    Ok(Json(response))
}

/// Close the current session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<MessageResponse>> {
    state.session_service().logout(&auth_user.session_id).await?;
    Ok(Json(MessageResponse::new("Logged out.")))
}

/// Current session user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Signed-in user", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(auth_user: AuthUser) -> Json<User> {
    Json(auth_user.user)
}

/// Update account fields and the role's sub-profile
#[utoipa::path(
    patch,
    path = "/api/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Merged user record", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    let user = state
        .session_service()
        .update_profile(&auth_user.session_id, &payload)
        .await?;
    Ok(Json(user))
}

/// Change password; the session is closed on success
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Profile has no email address"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    payload.validate()?;
    state
        .session_service()
        .change_password(
            &auth_user.session_id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;
    Ok(Json(MessageResponse::new(
        "Password changed. Please sign in again.",
    )))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Missing token or password"),
        (status = 422, description = "Passwords do not match")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let response = state.password_service().reset_password(&payload).await?;
    Ok(Json(response))
}

/// Security questions of an account
#[utoipa::path(
    post,
    path = "/api/auth/security-questions",
    tag = "auth",
    request_body = SecurityQuestionsRequest,
    responses(
        (status = 200, description = "Questions to answer", body = SecurityQuestionsResponse)
    )
)]
pub async fn security_questions(
    State(state): State<AppState>,
    Json(payload): Json<SecurityQuestionsRequest>,
) -> AppResult<Json<SecurityQuestionsResponse>> {
    payload.validate()?;
    let questions = state
        .password_service()
        .security_questions(&payload.identifier)
        .await?;
    Ok(Json(SecurityQuestionsResponse { questions }))
}

/// Exchange answers for a reset token
#[utoipa::path(
    post,
    path = "/api/auth/security-question-reset",
    tag = "auth",
    request_body = SecurityQuestionResetRequest,
    responses(
        (status = 200, description = "Reset token", body = ResetToken),
        (status = 400, description = "Unanswered questions")
    )
)]
pub async fn security_question_reset(
    State(state): State<AppState>,
    Json(payload): Json<SecurityQuestionResetRequest>,
) -> AppResult<Json<ResetToken>> {
    payload.validate()?;
    let token = state.password_service().verify_answers(&payload).await?;
    Ok(Json(token))
}
