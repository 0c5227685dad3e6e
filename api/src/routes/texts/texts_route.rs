use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use graph_store::model::{
    ExpressionInput, ExpressionRecord, LocalizedString, ManifestationRecord, ManifestationType,
};
use graph_store::repo::expression::ExpressionFilters;
use tracing::info;

use crate::core::app_state::AppState;
use crate::error_handler::{AppError, AppResult};
use crate::routes::instances::instances_request::CreateInstanceRequest;
use crate::routes::paging;
use crate::routes::texts::texts_request::{
    ListInstancesParams, ListTextsParams, validate_expression,
};
use crate::routes::texts::texts_response::{
    InstanceCreatedResponse, TextCreatedResponse, TitleUpdatedResponse,
};

/// GET /v2/texts
pub async fn list_texts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTextsParams>,
) -> AppResult<Json<Vec<ExpressionRecord>>> {
    let (limit, offset) = paging(params.limit, params.offset)?;
    let filters = ExpressionFilters {
        kind: params.kind,
        language: params.language,
        title: params.title,
    };
    let texts = state.store.expressions.get_all(offset, limit, &filters).await?;
    Ok(Json(texts))
}

/// GET /v2/texts/{id}: by opaque id, falling back to the external
/// registry id.
pub async fn get_text(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ExpressionRecord>> {
    match state.store.expressions.get(&id).await {
        Ok(expression) => Ok(Json(expression)),
        Err(graph_store::GraphError::NotFound(_)) => {
            match state.store.expressions.get_by_bdrc(&id).await? {
                Some(expression) => Ok(Json(expression)),
                None => Err(AppError::NotFound(format!(
                    "text with id or registry id '{id}' not found"
                ))),
            }
        }
        Err(err) => Err(err.into()),
    }
}

/// POST /v2/texts: 201 on creation, 200 with the existing id when the
/// external registry id is already mapped.
pub async fn post_text(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExpressionInput>, JsonRejection>,
) -> AppResult<Response> {
    let Json(input) = payload?;
    validate_expression(&input).map_err(AppError::Unprocessable)?;

    if let Some(bdrc) = &input.bdrc
        && let Some(existing) = state.store.expressions.get_by_bdrc(bdrc).await?
    {
        info!(bdrc, id = %existing.id, "expression already registered");
        let body = TextCreatedResponse {
            message: "Expression with this registry id already exists".into(),
            id: existing.id,
        };
        return Ok((StatusCode::OK, Json(body)).into_response());
    }

    let id = state.store.expressions.create(&input).await?;
    let body = TextCreatedResponse { message: "Text created successfully".into(), id };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// PUT /v2/texts/{id}/title: merge semantics.
pub async fn put_title(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<LocalizedString>, JsonRejection>,
) -> AppResult<Json<TitleUpdatedResponse>> {
    let Json(entries) = payload?;
    if entries.is_empty() {
        return Err(AppError::BadRequest("title entries are required".into()));
    }
    state.store.expressions.merge_title(&id, &entries).await?;
    Ok(Json(TitleUpdatedResponse { message: "Title updated successfully".into(), id }))
}

/// GET /v2/texts/{id}/instances
pub async fn list_instances(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ListInstancesParams>,
) -> AppResult<Json<Vec<ManifestationRecord>>> {
    let kind = match params.kind.as_deref() {
        None | Some("all") => None,
        Some("diplomatic") => Some(ManifestationType::Diplomatic),
        Some("critical") => Some(ManifestationType::Critical),
        Some("collated") => Some(ManifestationType::Collated),
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "type must be one of diplomatic, critical, collated, all (got '{other}')"
            )));
        }
    };
    // Listing instances of a missing text is a 404, not an empty list.
    state.store.expressions.get(&id).await?;
    let instances = state.store.manifestations.get_by_expression(&id, kind).await?;
    Ok(Json(instances))
}

/// POST /v2/texts/{id}/instances: create an edition together with its
/// base text and initial annotation layers.
pub async fn post_instance(
    State(state): State<Arc<AppState>>,
    Path(expression_id): Path<String>,
    payload: Result<Json<CreateInstanceRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload?;
    request.validate().map_err(AppError::Unprocessable)?;

    let manifestation_id = state.store.mint_id();
    state
        .texts
        .store(&expression_id, &manifestation_id, &request.content)
        .await?;

    let created = state
        .store
        .create_edition(&expression_id, &manifestation_id, &request.metadata, &request.layers())
        .await;
    if let Err(err) = created {
        state.texts.rollback(&expression_id, &manifestation_id).await.ok();
        return Err(err.into());
    }

    if let Some(indexer) = &state.indexer {
        indexer.notify_manifestation_changed(&manifestation_id);
    }

    let body = InstanceCreatedResponse {
        message: "Instance created successfully".into(),
        id: manifestation_id,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}
