use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    MessageResponse, RawDocument, ReferenceDocument, SelectOption, UserRole, WriteDocumentRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/nrc", get(read_nrc).put(write_nrc))
        .route("/township", get(read_township).put(write_township))
        .route("/regions", get(regions))
        .route("/regions/:region/districts", get(districts))
        .route(
            "/regions/:region/districts/:district/townships",
            get(townships),
        )
        .route("/nrc/states", get(nrc_states))
        .route("/nrc/states/:state/townships", get(nrc_townships))
        .route("/nrc/types", get(nrc_types))
}

async fn write_document(
    state: &AppState,
    auth_user: &AuthUser,
    doc: ReferenceDocument,
    payload: &WriteDocumentRequest,
) -> AppResult<Json<MessageResponse>> {
    auth_user.require(&[UserRole::SuperAdmin])?;
    state
        .reference
        .write_raw(doc, payload.content.as_ref())
        .await?;
    Ok(Json(MessageResponse::new(doc.saved_message())))
}

/// Raw NRC document
#[utoipa::path(
    get,
    path = "/api/reference-data/nrc",
    tag = "reference-data",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Document text", body = RawDocument),
        (status = 500, description = "Failed to read NRC data.")
    )
)]
pub async fn read_nrc(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<RawDocument>> {
    Ok(Json(state.reference.read_raw(ReferenceDocument::Nrc).await?))
}

/// Replace the NRC document
#[utoipa::path(
    put,
    path = "/api/reference-data/nrc",
    tag = "reference-data",
    security(("bearer_auth" = [])),
    request_body = WriteDocumentRequest,
    responses(
        (status = 200, description = "Saved", body = MessageResponse),
        (status = 400, description = "Content missing or not valid JSON"),
        (status = 403, description = "Super-admin only")
    )
)]
pub async fn write_nrc(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<WriteDocumentRequest>,
) -> AppResult<Json<MessageResponse>> {
    write_document(&state, &auth_user, ReferenceDocument::Nrc, &payload).await
}

/// Raw township document
#[utoipa::path(
    get,
    path = "/api/reference-data/township",
    tag = "reference-data",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Document text", body = RawDocument),
        (status = 500, description = "Failed to read township data.")
    )
)]
pub async fn read_township(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<RawDocument>> {
    Ok(Json(
        state.reference.read_raw(ReferenceDocument::Township).await?,
    ))
}

/// Replace the township document
#[utoipa::path(
    put,
    path = "/api/reference-data/township",
    tag = "reference-data",
    security(("bearer_auth" = [])),
    request_body = WriteDocumentRequest,
    responses(
        (status = 200, description = "Saved", body = MessageResponse),
        (status = 400, description = "Content missing or not valid JSON"),
        (status = 403, description = "Super-admin only")
    )
)]
pub async fn write_township(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<WriteDocumentRequest>,
) -> AppResult<Json<MessageResponse>> {
    write_document(&state, &auth_user, ReferenceDocument::Township, &payload).await
}

#[utoipa::path(
    get,
    path = "/api/reference-data/regions",
    tag = "reference-data",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Regions, sorted", body = Vec<String>))
)]
pub async fn regions(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.reference.snapshot().await?.regions()))
}

#[utoipa::path(
    get,
    path = "/api/reference-data/regions/{region}/districts",
    tag = "reference-data",
    security(("bearer_auth" = [])),
    params(("region" = String, Path, description = "Region name")),
    responses((status = 200, description = "Districts, sorted; empty for an unknown region", body = Vec<String>))
)]
pub async fn districts(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(region): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.reference.snapshot().await?.districts(&region)))
}

#[utoipa::path(
    get,
    path = "/api/reference-data/regions/{region}/districts/{district}/townships",
    tag = "reference-data",
    security(("bearer_auth" = [])),
    params(
        ("region" = String, Path, description = "Region name"),
        ("district" = String, Path, description = "District name")
    ),
    responses((status = 200, description = "Townships, sorted", body = Vec<String>))
)]
pub async fn townships(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path((region, district)): Path<(String, String)>,
) -> AppResult<Json<Vec<String>>> {
    Ok(Json(
        state
            .reference
            .snapshot()
            .await?
            .township_names(&region, &district),
    ))
}

#[utoipa::path(
    get,
    path = "/api/reference-data/nrc/states",
    tag = "reference-data",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "NRC state options", body = Vec<SelectOption>))
)]
pub async fn nrc_states(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<Vec<SelectOption>>> {
    Ok(Json(state.reference.snapshot().await?.nrc_states()))
}

#[utoipa::path(
    get,
    path = "/api/reference-data/nrc/states/{state}/townships",
    tag = "reference-data",
    security(("bearer_auth" = [])),
    params(("state" = String, Path, description = "NRC state number")),
    responses((status = 200, description = "NRC township options of the state", body = Vec<SelectOption>))
)]
pub async fn nrc_townships(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(nrc_state): Path<String>,
) -> AppResult<Json<Vec<SelectOption>>> {
    Ok(Json(
        state.reference.snapshot().await?.nrc_townships(&nrc_state),
    ))
}

#[utoipa::path(
    get,
    path = "/api/reference-data/nrc/types",
    tag = "reference-data",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "NRC type options", body = Vec<SelectOption>))
)]
pub async fn nrc_types(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<Vec<SelectOption>>> {
    Ok(Json(state.reference.snapshot().await?.nrc_types()))
}
