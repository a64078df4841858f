use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{Collector, Customer, User, UserRole};
use crate::services::{
    AssignmentService, AuthService, BackendClient, BillingService, MailService,
    OnboardingService, PasswordService, RecordStore, ReferenceService, SessionRegistry,
    SessionService,
};

/// Roles allowed on the operator back office.
pub const ADMIN_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::SuperAdmin];

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    pub store: Arc<dyn RecordStore>,
    pub sessions: Arc<SessionRegistry>,
    pub reference: Arc<ReferenceService>,
    pub mail: Arc<MailService>,
}

impl AppState {
    pub fn session_service(&self) -> SessionService {
        SessionService::new(
            self.backend.clone(),
            self.sessions.clone(),
            self.config.clone(),
        )
    }

    pub fn billing_service(&self) -> BillingService {
        BillingService::new(self.store.clone())
    }

    pub fn assignment_service(&self) -> AssignmentService {
        AssignmentService::new(self.store.clone())
    }

    pub fn onboarding_service(&self) -> OnboardingService {
        OnboardingService::new(self.store.clone(), self.reference.clone())
    }

    pub fn password_service(&self) -> PasswordService {
        PasswordService::new(self.backend.clone(), self.mail.clone())
    }
}

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub role: UserRole,
    pub session_id: String,
    pub user: User,
}

impl AuthUser {
    pub fn require(&self, roles: &[UserRole]) -> AppResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, role = self.role.as_str(), "Access denied");
            Err(AppError::Forbidden)
        }
    }

    /// The collector record behind this account: profile id, then user id,
    /// then collector code (or username).
    pub fn resolve_collector(&self, collectors: &[Collector]) -> AppResult<Collector> {
        let profile = self.user.collector_profile.as_ref();
        let profile_id = profile.and_then(|p| p.id.as_deref());
        let codes: Vec<&str> = [
            profile.and_then(|p| p.collector_code.as_deref()),
            self.user.username.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        profile_id
            .and_then(|id| collectors.iter().find(|c| c.id == id))
            .or_else(|| collectors.iter().find(|c| c.id == self.user.id))
            .or_else(|| {
                collectors.iter().find(|c| {
                    c.collector_code
                        .as_deref()
                        .map_or(false, |code| codes.contains(&code))
                })
            })
            .cloned()
            .ok_or_else(|| AppError::NotFound("Collector profile not found".to_string()))
    }

    /// Exact match only: profile id, then user id, then customer code.
    pub fn resolve_customer(&self, customers: &[Customer]) -> AppResult<Customer> {
        let profile = self.user.customer_profile.as_ref();
        let profile_id = profile.and_then(|p| p.id.as_deref());
        let code = profile.and_then(|p| p.customer_code.as_deref());

        profile_id
            .and_then(|id| customers.iter().find(|c| c.id == id))
            .or_else(|| customers.iter().find(|c| c.id == self.user.id))
            .or_else(|| {
                code.and_then(|code| customers.iter().find(|c| c.code.as_deref() == Some(code)))
            })
            .cloned()
            .ok_or_else(|| AppError::NotFound("Customer record not found".to_string()))
    }
}

/// Makes the state reachable from the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(state);
    next.run(request).await
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let app_state = parts
            .extensions
            .get::<AppState>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Application state missing".to_string()))?;

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let claims = AuthService::new(app_state.config.clone())
            .verify_token(token)
            .map_err(|_| AppError::Unauthorized)?;
        if claims.token_type != "access" {
            return Err(AppError::Unauthorized);
        }

        // Logged-out or password-changed sessions no longer authenticate.
        let session = app_state
            .sessions
            .get(&claims.sid)
            .await
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            session_id: session.id,
            user: session.user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountStatus, CollectorProfile, CustomerProfile};
    use crate::services::MemoryStore;

    fn auth_user(role: UserRole, id: &str) -> AuthUser {
        AuthUser {
            user_id: id.to_string(),
            role,
            session_id: "s1".to_string(),
            user: User {
                id: id.to_string(),
                username: None,
                email: None,
                phone: None,
                role,
                name: "Test".to_string(),
                status: None,
                collector_profile: None,
                customer_profile: None,
                created_at: None,
                updated_at: None,
            },
        }
    }

    fn collector(id: &str, code: Option<&str>) -> Collector {
        Collector {
            id: id.to_string(),
            collector_code: code.map(str::to_string),
            name: format!("Collector {}", id),
            phone: String::new(),
            email: String::new(),
            area: String::new(),
            status: AccountStatus::Enable,
            nrc: String::new(),
            address: String::new(),
        }
    }

    #[test]
    fn test_require_role() {
        let admin = auth_user(UserRole::Admin, "u1");
        assert!(admin.require(ADMIN_ROLES).is_ok());
        assert!(matches!(
            admin.require(&[UserRole::Collector]),
            Err(AppError::Forbidden)
        ));
        assert!(auth_user(UserRole::SuperAdmin, "root")
            .require(ADMIN_ROLES)
            .is_ok());
    }

    #[test]
    fn test_collector_resolution_order() {
        let collectors = vec![collector("7", Some("COL-7")), collector("u9", None)];

        let mut user = auth_user(UserRole::Collector, "u9");
        user.user.collector_profile = Some(CollectorProfile {
            id: Some("7".to_string()),
            ..Default::default()
        });
        assert_eq!(user.resolve_collector(&collectors).unwrap().id, "7");

        user.user.collector_profile = None;
        assert_eq!(user.resolve_collector(&collectors).unwrap().id, "u9");

        let mut by_code = auth_user(UserRole::Collector, "other");
        by_code.user.username = Some("COL-7".to_string());
        assert_eq!(by_code.resolve_collector(&collectors).unwrap().id, "7");

        let stranger = auth_user(UserRole::Collector, "nobody");
        assert!(matches!(
            stranger.resolve_collector(&collectors),
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_customer_resolution_has_no_fallback() {
        let customers = MemoryStore::seeded().list_customers().await.unwrap();

        let mut user = auth_user(UserRole::Customer, "u-x");
        user.user.customer_profile = Some(CustomerProfile {
            id: Some("3".to_string()),
            ..Default::default()
        });
        assert_eq!(user.resolve_customer(&customers).unwrap().name, "Michael Brown");

        let unknown = auth_user(UserRole::Customer, "u-unknown");
        assert!(matches!(
            unknown.resolve_customer(&customers),
            Err(AppError::NotFound(_))
        ));
    }
}
