use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    CollectorProfile, CustomerProfile, LoginResponse, UpdateProfileRequest, User, UserRole,
};
use crate::services::auth_service::AuthService;
use crate::services::backend_client::BackendClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Sessions live as long as the access token issued with them.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.created_at + ttl <= now
    }
}

/// Active sessions keyed by session id, optionally mirrored to a JSON file.
/// Expired sessions are dropped on load and on every insert.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
    path: Option<PathBuf>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn in_memory(ttl_secs: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            path: None,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Restores the unexpired sessions from `path` when the file exists.
    pub async fn load(path: Option<PathBuf>, ttl_secs: i64) -> AppResult<Self> {
        let ttl = Duration::seconds(ttl_secs);
        let mut sessions = HashMap::new();
        if let Some(file) = path.as_ref() {
            match tokio::fs::read_to_string(file).await {
                Ok(raw) => {
                    let stored: Vec<Session> = serde_json::from_str(&raw)?;
                    let now = Utc::now();
                    let total = stored.len();
                    for session in stored.into_iter().filter(|s| !s.is_expired(ttl, now)) {
                        sessions.insert(session.id.clone(), session);
                    }
                    tracing::info!(
                        count = sessions.len(),
                        expired = total - sessions.len(),
                        path = %file.display(),
                        "Sessions restored"
                    );
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Self {
            sessions: RwLock::new(sessions),
            path,
            ttl,
        })
    }

    async fn save(&self, sessions: &HashMap<String, Session>) -> AppResult<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let list: Vec<&Session> = sessions.values().collect();
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&list)?).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    pub async fn insert(&self, session: Session) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let ttl = self.ttl;
        sessions.retain(|_, s| !s.is_expired(ttl, now));
        sessions.insert(session.id.clone(), session);
        self.save(&sessions).await
    }

    /// Expired sessions read as absent.
    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions
            .read()
            .await
            .get(id)
            .filter(|s| !s.is_expired(self.ttl, Utc::now()))
            .cloned()
    }

    pub async fn replace_user(&self, id: &str, user: User) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id).ok_or(AppError::Unauthorized)?;
        session.user = user;
        self.save(&sessions).await
    }

    pub async fn remove(&self, id: &str) -> AppResult<bool> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id).is_some();
        if removed {
            self.save(&sessions).await?;
        }
        Ok(removed)
    }
}

pub struct SessionService {
    backend: BackendClient,
    sessions: Arc<SessionRegistry>,
    config: Config,
}

impl SessionService {
    pub fn new(backend: BackendClient, sessions: Arc<SessionRegistry>, config: Config) -> Self {
        Self {
            backend,
            sessions,
            config,
        }
    }

    async fn open_session(&self, user: User) -> AppResult<LoginResponse> {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user: user.clone(),
            created_at: Utc::now(),
        };
        let auth = AuthService::new(self.config.clone());
        let access_token = auth.generate_access_token(&user.id, user.role, &session.id)?;
        self.sessions.insert(session).await?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "Session opened");
        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: auth.expires_in(),
            redirect_to: user.role.dashboard_path().to_string(),
            user,
        })
    }

    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<LoginResponse> {
        let body = self
            .backend
            .send_json(
                Method::POST,
                "/auth/login",
                &json!({ "identifier": identifier, "password": password }),
                "Invalid credentials",
            )
            .await?;

        let user = parse_login_user(&body)?;
        self.open_session(user).await
    }

    pub async fn logout(&self, session_id: &str) -> AppResult<()> {
        if self.sessions.remove(session_id).await? {
            tracing::info!(session_id, "Session closed");
        }
        Ok(())
    }

    pub async fn update_profile(
        &self,
        session_id: &str,
        update: &UpdateProfileRequest,
    ) -> AppResult<User> {
        let session = self
            .sessions
            .get(session_id)
            .await
            .ok_or(AppError::Unauthorized)?;
        let current = session.user;

        let patch = build_profile_patch(&current, update);
        let body = self
            .backend
            .send_json(
                Method::PATCH,
                &format!("/users/{}", current.id),
                &patch,
                "Failed to update profile",
            )
            .await?;

        let response = body.get("user").unwrap_or(&body);
        let merged = merge_profile(&current, update, response);
        self.sessions.replace_user(session_id, merged.clone()).await?;
        Ok(merged)
    }

    /// On success the session is closed and the user must sign in again.
    pub async fn change_password(
        &self,
        session_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let session = self
            .sessions
            .get(session_id)
            .await
            .ok_or(AppError::Unauthorized)?;
        let email = session
            .user
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest("Your profile does not include an email address.".to_string())
            })?;

        self.backend
            .send_json(
                Method::POST,
                "/auth/change-password",
                &json!({
                    "identifier": email,
                    "currentPassword": current_password,
                    "newPassword": new_password,
                }),
                "Failed to change password",
            )
            .await?;

        self.sessions.remove(session_id).await?;
        tracing::info!(user_id = %session.user.id, "Password changed, session closed");
        Ok(())
    }

    pub async fn super_admin_login(
        &self,
        identifier: &str,
        password: &str,
    ) -> AppResult<LoginResponse> {
        let username = self.config.super_admin_username.as_str();
        let secret = self.config.super_admin_password.as_str();
        if username.is_empty() || secret.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let user_ok: bool = ConstantTimeEq::ct_eq(identifier.trim().as_bytes(), username.as_bytes()).into();
        let pass_ok: bool = ConstantTimeEq::ct_eq(password.as_bytes(), secret.as_bytes()).into();
        if !(user_ok & pass_ok) {
            tracing::warn!("Rejected super-admin login");
            return Err(AppError::Unauthorized);
        }

        let user = User {
            id: "super-admin".to_string(),
            username: Some(username.to_string()),
            email: None,
            phone: None,
            role: UserRole::SuperAdmin,
            name: "Super Admin".to_string(),
            status: None,
            collector_profile: None,
            customer_profile: None,
            created_at: None,
            updated_at: None,
        };
        self.open_session(user).await
    }
}

fn parse_login_user(body: &Value) -> AppResult<User> {
    let invalid = || AppError::Upstream {
        status: axum::http::StatusCode::BAD_GATEWAY,
        message: "Invalid response from server".to_string(),
    };
    let raw = body.get("user").ok_or_else(invalid)?;
    let user: User = serde_json::from_value(raw.clone()).map_err(|_| invalid())?;
    if user.role == UserRole::SuperAdmin {
        return Err(invalid());
    }
    Ok(user)
}

/// Body for `PATCH /users/{id}`: only the supplied account fields, plus the
/// sub-profile matching the user's role without server-managed keys.
pub fn build_profile_patch(current: &User, update: &UpdateProfileRequest) -> Value {
    let mut account = Map::new();
    for (key, value) in [
        ("name", &update.name),
        ("email", &update.email),
        ("phone", &update.phone),
        ("username", &update.username),
    ] {
        if let Some(value) = value {
            account.insert(key.to_string(), Value::String(value.clone()));
        }
    }

    let mut patch = Map::new();
    patch.insert("account".to_string(), Value::Object(account));

    match current.role {
        UserRole::Collector => {
            if let Some(profile) = update.collector_profile.as_ref() {
                patch.insert("collectorProfile".to_string(), json!(profile.editable()));
            }
        }
        UserRole::Customer => {
            if let Some(profile) = update.customer_profile.as_ref() {
                patch.insert("customerProfile".to_string(), json!(profile.editable()));
            }
        }
        UserRole::Admin | UserRole::SuperAdmin => {}
    }

    Value::Object(patch)
}

fn text(response: &Value, key: &str) -> Option<String> {
    response.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Reconciles the stored user with the server's answer and the submitted update.
pub fn merge_profile(current: &User, update: &UpdateProfileRequest, response: &Value) -> User {
    let mut merged = current.clone();

    merged.name = text(response, "name")
        .or_else(|| update.name.clone())
        .unwrap_or_else(|| current.name.clone());
    merged.email = text(response, "email")
        .or_else(|| update.email.clone())
        .or_else(|| current.email.clone());
    merged.phone = text(response, "phone")
        .or_else(|| update.phone.clone())
        .or_else(|| current.phone.clone());
    merged.username = text(response, "username")
        .or_else(|| update.username.clone())
        .or_else(|| current.username.clone());
    merged.status = text(response, "status").or_else(|| current.status.clone());

    match current.role {
        UserRole::Collector => {
            let mut profile = current.collector_profile.clone().unwrap_or_default();
            if let Some(from_server) = response
                .get("collectorProfile")
                .and_then(|v| serde_json::from_value::<CollectorProfile>(v.clone()).ok())
            {
                profile.overlay(&from_server);
            }
            if let Some(submitted) = update.collector_profile.as_ref() {
                profile.overlay(submitted);
            }
            merged.collector_profile = Some(profile);
        }
        UserRole::Customer => {
            let mut profile = current.customer_profile.clone().unwrap_or_default();
            if let Some(from_server) = response
                .get("customerProfile")
                .and_then(|v| serde_json::from_value::<CustomerProfile>(v.clone()).ok())
            {
                profile.overlay(&from_server);
            }
            if let Some(submitted) = update.customer_profile.as_ref() {
                profile.overlay(submitted);
            }
            merged.customer_profile = Some(profile);
        }
        UserRole::Admin | UserRole::SuperAdmin => {}
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn collector_user() -> User {
        serde_json::from_value(json!({
            "id": 7,
            "username": "koko",
            "email": "koko@isp.mm",
            "role": "collector",
            "name": "Ko Ko",
            "status": "enable",
            "collectorProfile": {"id": 3, "collectorCode": "COL-3", "township": "Hlaing", "createdAt": "2024-01-01"}
        }))
        .unwrap()
    }

    fn service(server: &MockServer) -> SessionService {
        let config = Config::for_tests(&server.uri());
        SessionService::new(
            BackendClient::new(&config).unwrap(),
            Arc::new(SessionRegistry::in_memory(config.jwt_access_expiry)),
            config,
        )
    }

    #[test]
    fn test_patch_contains_only_supplied_fields() {
        let update = UpdateProfileRequest {
            phone: Some("0999".to_string()),
            collector_profile: Some(CollectorProfile {
                id: Some("3".to_string()),
                route: Some("North".to_string()),
                created_at: Some("2024-01-01".to_string()),
                ..Default::default()
            }),
            customer_profile: Some(CustomerProfile::default()),
            ..Default::default()
        };
        let patch = build_profile_patch(&collector_user(), &update);
        assert_eq!(patch["account"], json!({"phone": "0999"}));
        assert_eq!(patch["collectorProfile"], json!({"route": "North"}));
        assert!(patch.get("customerProfile").is_none());
    }

    #[test]
    fn test_merge_prefers_response_then_update() {
        let current = collector_user();
        let update = UpdateProfileRequest {
            name: Some("Ko Ko Aung".to_string()),
            phone: Some("0999".to_string()),
            collector_profile: Some(CollectorProfile {
                notes: Some("night shift".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let response = json!({
            "name": "Ko Ko (server)",
            "status": "disable",
            "collectorProfile": {"region": "Yangon"}
        });

        let merged = merge_profile(&current, &update, &response);
        assert_eq!(merged.name, "Ko Ko (server)");
        assert_eq!(merged.phone.as_deref(), Some("0999"));
        assert_eq!(merged.email.as_deref(), Some("koko@isp.mm"));
        assert_eq!(merged.status.as_deref(), Some("disable"));
        let profile = merged.collector_profile.unwrap();
        assert_eq!(profile.township.as_deref(), Some("Hlaing"));
        assert_eq!(profile.region.as_deref(), Some("Yangon"));
        assert_eq!(profile.notes.as_deref(), Some("night shift"));
        assert_eq!(profile.id.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_login_opens_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"id": 1, "role": "admin", "name": "Admin", "email": "admin@isp.mm"}
            })))
            .mount(&server)
            .await;

        let service = service(&server);
        let response = service.login("admin", "secret").await.unwrap();
        assert_eq!(response.redirect_to, "/admin");
        assert_eq!(response.user.id, "1");

        let claims = AuthService::new(Config::for_tests(&server.uri()))
            .verify_token(&response.access_token)
            .unwrap();
        assert!(service.sessions.get(&claims.sid).await.is_some());
    }

    #[tokio::test]
    async fn test_login_without_role_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {"id": 1}})))
            .mount(&server)
            .await;

        let err = service(&server).login("admin", "secret").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid response from server");
    }

    #[tokio::test]
    async fn test_change_password_forces_logout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/change-password"))
            .and(body_json(json!({
                "identifier": "koko@isp.mm",
                "currentPassword": "old",
                "newPassword": "new"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let service = service(&server);
        let session = Session {
            id: "sid-1".to_string(),
            user: collector_user(),
            created_at: Utc::now(),
        };
        service.sessions.insert(session).await.unwrap();

        assert_ok!(service.change_password("sid-1", "old", "new").await);
        assert!(service.sessions.get("sid-1").await.is_none());
    }

    #[tokio::test]
    async fn test_change_password_requires_email() {
        let server = MockServer::start().await;
        let service = service(&server);
        let mut user = collector_user();
        user.email = None;
        service
            .sessions
            .insert(Session {
                id: "sid-2".to_string(),
                user,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let result = service.change_password("sid-2", "old", "new").await;
        assert_err!(&result);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Bad request: Your profile does not include an email address."
        );
    }

    #[tokio::test]
    async fn test_super_admin_login() {
        let server = MockServer::start().await;
        let service = service(&server);
        assert_ok!(service.super_admin_login(" root ", "root-pass").await);
        assert!(matches!(
            service.super_admin_login("root", "wrong").await,
            Err(AppError::Unauthorized)
        ));
    }

    fn session(id: &str, age_secs: i64) -> Session {
        Session {
            id: id.to_string(),
            user: collector_user(),
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn test_registry_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sessions.json");

        let registry = SessionRegistry::load(Some(file.clone()), 3600).await.unwrap();
        registry.insert(session("sid-3", 0)).await.unwrap();

        let restored = SessionRegistry::load(Some(file), 3600).await.unwrap();
        assert_eq!(restored.get("sid-3").await.unwrap().user.name, "Ko Ko");

        assert!(restored.remove("sid-3").await.unwrap());
        assert!(restored.get("sid-3").await.is_none());
        assert!(!restored.remove("sid-3").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_session_reads_as_absent() {
        let registry = SessionRegistry::in_memory(60);
        registry.insert(session("old", 120)).await.unwrap();
        registry.insert(session("fresh", 10)).await.unwrap();
        assert!(registry.get("old").await.is_none());
        assert!(registry.get("fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_expired_sessions_pruned_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sessions.json");
        let stale = vec![session("stale", 7200), session("live", 60)];
        tokio::fs::write(&file, serde_json::to_vec(&stale).unwrap())
            .await
            .unwrap();

        let registry = SessionRegistry::load(Some(file.clone()), 3600).await.unwrap();
        assert!(registry.get("stale").await.is_none());
        assert!(registry.get("live").await.is_some());

        registry.insert(session("new", 0)).await.unwrap();
        let stored: Vec<Session> =
            serde_json::from_str(&tokio::fs::read_to_string(&file).await.unwrap()).unwrap();
        let mut ids: Vec<String> = stored.into_iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["live", "new"]);
    }
}
