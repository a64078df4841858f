use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::normalize::{de_opt_string, de_string};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Collector,
    Customer,
    SuperAdmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Collector => "collector",
            UserRole::Customer => "customer",
            UserRole::SuperAdmin => "super_admin",
        }
    }

    /// Route of the dashboard the role lands on after login.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            UserRole::Admin => "/admin",
            UserRole::Collector => "/collector",
            UserRole::Customer => "/customer",
            UserRole::SuperAdmin => "/super-admin/dashboard",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectorProfile {
    #[serde(
        default,
        deserialize_with = "de_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub township: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    #[serde(
        default,
        deserialize_with = "de_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

macro_rules! overlay_fields {
    ($target:expr, $source:expr, $($field:ident),+) => {
        $(
            if $source.$field.is_some() {
                $target.$field = $source.$field.clone();
            }
        )+
    };
}

impl CollectorProfile {
    /// Fields present in `other` win.
    pub fn overlay(&mut self, other: &CollectorProfile) {
        overlay_fields!(
            self, other, id, collector_code, address, township, region, route, notes, created_at,
            updated_at
        );
    }

    /// Copy without the server-managed identity and timestamps.
    pub fn editable(&self) -> CollectorProfile {
        CollectorProfile {
            id: None,
            created_at: None,
            updated_at: None,
            ..self.clone()
        }
    }
}

impl CustomerProfile {
    pub fn overlay(&mut self, other: &CustomerProfile) {
        overlay_fields!(
            self,
            other,
            id,
            customer_code,
            account_number,
            address,
            phone,
            package_name,
            billing_cycle,
            status_description,
            created_at,
            updated_at
        );
    }

    pub fn editable(&self) -> CustomerProfile {
        CustomerProfile {
            id: None,
            created_at: None,
            updated_at: None,
            ..self.clone()
        }
    }
}

/// Authenticated account as returned by the remote `/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "de_string")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub collector_profile: Option<CollectorProfile>,
    #[serde(default)]
    pub customer_profile: Option<CustomerProfile>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Enter your email or username."))]
    pub identifier: String,
    #[validate(length(min = 1, message = "Enter your password."))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub redirect_to: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
    pub collector_profile: Option<CollectorProfile>,
    pub customer_profile: Option<CustomerProfile>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Enter your current password."))]
    pub current_password: String,
    #[validate(length(min = 1, message = "Enter a new password."))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SuperAdminLoginRequest {
    #[validate(length(min = 1, message = "Enter your username."))]
    pub identifier: String,
    #[validate(length(min = 1, message = "Enter your password."))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetLinkSent {
    pub message: String,
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SecurityQuestionsRequest {
    #[validate(length(min = 1, message = "Enter your email or username."))]
    pub identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct SecurityQuestion {
    pub question: String,
    /// Text shown to the user; the question itself when the server sends none.
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SecurityAnswer {
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SecurityQuestionResetRequest {
    #[validate(length(min = 1, message = "Enter your email or username."))]
    pub identifier: String,
    pub answers: Vec<SecurityAnswer>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetToken {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
