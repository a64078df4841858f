use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{
    ForgotPasswordRequest, MessageResponse, ResetLinkSent, ResetPasswordRequest, ResetToken,
    SecurityQuestion, SecurityQuestionResetRequest,
};
use crate::services::backend_client::BackendClient;
use crate::services::mail_service::MailService;
use crate::utils::normalize::value_to_string;

/// Account recovery: emailed reset links and security-question answers.
pub struct PasswordService {
    backend: BackendClient,
    mail: Arc<MailService>,
}

impl PasswordService {
    pub fn new(backend: BackendClient, mail: Arc<MailService>) -> Self {
        Self { backend, mail }
    }

    pub async fn send_reset_link(&self, request: &ForgotPasswordRequest) -> AppResult<ResetLinkSent> {
        let email = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::BadRequest("Email is required.".to_string()))?;

        let body = self
            .backend
            .send_json(
                Method::POST,
                "/auth/forgot-password",
                &json!({ "email": email }),
                "Failed to generate reset token.",
            )
            .await?;

        let token = body
            .get("token")
            .and_then(value_to_string)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Internal("Backend did not return reset token.".to_string()))?;
        let expires_at = body.get("expiresAt").and_then(value_to_string);

        let link = self.mail.reset_link(&token)?;
        self.mail.send_reset_email(email, &link).await?;

        Ok(ResetLinkSent {
            message: "Reset link sent. Please check your email.".to_string(),
            expires_at,
        })
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> AppResult<MessageResponse> {
        if request.token.trim().is_empty() {
            return Err(AppError::BadRequest("Invalid reset token.".to_string()));
        }
        if request.new_password.is_empty() || request.confirm_password.is_empty() {
            return Err(AppError::BadRequest(
                "Please fill in both password fields.".to_string(),
            ));
        }
        if request.new_password != request.confirm_password {
            return Err(AppError::validation("confirmPassword", "Passwords do not match."));
        }

        self.backend
            .send_json(
                Method::POST,
                "/auth/reset-password",
                &json!({ "token": request.token, "newPassword": request.new_password }),
                "Unable to reset password.",
            )
            .await?;

        tracing::info!("Password reset completed");
        Ok(MessageResponse::new("Password updated."))
    }

    pub async fn security_questions(&self, identifier: &str) -> AppResult<Vec<SecurityQuestion>> {
        let body = self
            .backend
            .send_json(
                Method::POST,
                "/auth/security-questions",
                &json!({ "identifier": identifier.trim() }),
                "Unable to load security questions. Please try again.",
            )
            .await?;

        Ok(body
            .get("questions")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(security_question).collect())
            .unwrap_or_default())
    }

    pub async fn verify_answers(&self, request: &SecurityQuestionResetRequest) -> AppResult<ResetToken> {
        if request.answers.is_empty() {
            return Err(AppError::BadRequest(
                "Please load your security questions first.".to_string(),
            ));
        }
        if request.answers.iter().any(|a| a.answer.trim().is_empty()) {
            return Err(AppError::BadRequest(
                "Please answer all security questions.".to_string(),
            ));
        }

        let body = self
            .backend
            .send_json(
                Method::POST,
                "/auth/security-question-reset",
                &json!({ "identifier": request.identifier.trim(), "answers": request.answers }),
                "Unable to verify your answers.",
            )
            .await?;

        let token = body
            .get("token")
            .and_then(value_to_string)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Internal("Backend did not return reset token.".to_string()))?;
        Ok(ResetToken { token })
    }
}

fn security_question(item: &Value) -> SecurityQuestion {
    let question = item
        .get("question")
        .and_then(value_to_string)
        .unwrap_or_default();
    let prompt = item
        .get("prompt")
        .and_then(value_to_string)
        .unwrap_or_else(|| question.clone());
    SecurityQuestion { question, prompt }
}
