use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Remote,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_base_url: String,
    pub app_base_url: String,
    pub store_backend: StoreBackend,
    pub seed_demo_data: bool,
    pub jwt_secret: String,
    pub jwt_access_expiry: i64,
    pub session_store_path: Option<PathBuf>,
    pub reference_data_dir: PathBuf,
    pub super_admin_username: String,
    pub super_admin_password: String,
    pub resend_api_key: String,
    pub resend_from_email: String,
    pub resend_api_url: String,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000".to_string()),
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            store_backend: match env::var("STORE_BACKEND").as_deref() {
                Ok("memory") => StoreBackend::Memory,
                _ => StoreBackend::Remote,
            },
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_access_expiry: env::var("JWT_ACCESS_EXPIRY")
                .unwrap_or_else(|_| "43200".to_string())
                .parse()
                .unwrap_or(43200),
            session_store_path: env::var("SESSION_STORE_PATH").ok().map(PathBuf::from),
            reference_data_dir: env::var("REFERENCE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            super_admin_username: env::var("SUPER_ADMIN_USERNAME").unwrap_or_default(),
            super_admin_password: env::var("SUPER_ADMIN_PASSWORD").unwrap_or_default(),
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            resend_from_email: env::var("RESEND_FROM_EMAIL").unwrap_or_default(),
            resend_api_url: env::var("RESEND_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15),
        })
    }

    /// Configuration for tests and local tooling: in-memory store, no outbound mail.
    pub fn for_tests(api_base_url: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            api_base_url: api_base_url.to_string(),
            app_base_url: "http://localhost:3000".to_string(),
            store_backend: StoreBackend::Memory,
            seed_demo_data: true,
            jwt_secret: "test-secret".to_string(),
            jwt_access_expiry: 3600,
            session_store_path: None,
            reference_data_dir: PathBuf::from("./data"),
            super_admin_username: "root".to_string(),
            super_admin_password: "root-pass".to_string(),
            resend_api_key: String::new(),
            resend_from_email: "noreply@billflow.test".to_string(),
            resend_api_url: "https://api.resend.com".to_string(),
            request_timeout_secs: 5,
        }
    }
}
