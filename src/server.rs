use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::config::{Config, StoreBackend};
use crate::error::AppResult;
use crate::middleware::{auth_middleware, AppState};
use crate::services::{
    BackendClient, MailService, MemoryStore, RecordStore, ReferenceService, RemoteStore,
    SessionRegistry,
};
use crate::ApiDoc;

const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Wires the record store, session registry, reference data and mail client.
pub async fn build_state(config: Config) -> AppResult<AppState> {
    let backend = BackendClient::new(&config)?;

    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::Memory if config.seed_demo_data => {
            tracing::info!("Using in-memory store with demo data");
            Arc::new(MemoryStore::seeded())
        }
        StoreBackend::Memory => {
            tracing::info!("Using empty in-memory store");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Remote => {
            tracing::info!(api = %config.api_base_url, "Using remote record store");
            Arc::new(RemoteStore::new(backend.clone()))
        }
    };

    let sessions = Arc::new(
        SessionRegistry::load(config.session_store_path.clone(), config.jwt_access_expiry).await?,
    );
    let reference = Arc::new(ReferenceService::new(config.reference_data_dir.clone()));
    let mail = Arc::new(MailService::new(config.clone())?);

    Ok(AppState {
        config,
        backend,
        store,
        sessions,
        reference,
        mail,
    })
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api::routes())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": "BillFlow API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Billing and subscription management for internet service providers"
    }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
