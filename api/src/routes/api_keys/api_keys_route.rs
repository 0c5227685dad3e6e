use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use graph_store::model::ApiKeyRecord;

use crate::core::app_state::AppState;
use crate::error_handler::{AppError, AppResult};
use crate::routes::api_keys::api_keys_request::CreateApiKeyRequest;
use crate::routes::api_keys::api_keys_response::{ApiKeyCreatedResponse, ApiKeyRotatedResponse};

/// POST /v2/api-keys: the raw key appears only in this response.
pub async fn post_api_key(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateApiKeyRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload?;
    request.validate().map_err(AppError::Unprocessable)?;
    let (id, api_key) = state
        .store
        .api_keys
        .create(&request.name, &request.email, request.application_id.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiKeyCreatedResponse { id, api_key })).into_response())
}

/// GET /v2/api-keys: metadata only, never hashes or raw keys.
pub async fn list_api_keys(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<ApiKeyRecord>>> {
    Ok(Json(state.store.api_keys.list().await?))
}

/// POST /v2/api-keys/{id}/revoke
pub async fn revoke_api_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if state.store.api_keys.revoke(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("api key '{id}' not found")))
    }
}

/// POST /v2/api-keys/{id}/rotate: replaces the hash, returns the new raw
/// key once.
pub async fn rotate_api_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiKeyRotatedResponse>> {
    match state.store.api_keys.rotate(&id).await? {
        Some(api_key) => Ok(Json(ApiKeyRotatedResponse { id, api_key })),
        None => Err(AppError::NotFound(format!("api key '{id}' not found"))),
    }
}
