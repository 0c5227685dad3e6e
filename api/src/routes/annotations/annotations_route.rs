use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use graph_store::model::{AlignmentInput, AnnotationKind};

use crate::core::app_state::AppState;
use crate::error_handler::{AppError, AppResult};
use crate::routes::annotations::annotations_request::{
    AddAnnotationRequest, UpdateAnnotationRequest, parse_kind,
};
use crate::routes::annotations::annotations_response::AnnotationCreatedResponse;

/// POST /v2/annotations/{kind}
pub async fn post_annotation(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    payload: Result<Json<AddAnnotationRequest>, JsonRejection>,
) -> AppResult<Response> {
    let kind = require_kind(&kind)?;
    let Json(request) = payload?;
    request.validate_for(kind).map_err(AppError::Unprocessable)?;

    let manifestation_id = request.manifestation_id.clone();
    let body = match kind {
        AnnotationKind::Segmentation => {
            let segments = request.segments.unwrap_or_default();
            let id = state.store.segmentations.add(&manifestation_id, &segments).await?;
            AnnotationCreatedResponse::single("Annotation added successfully", id)
        }
        AnnotationKind::SearchSegmentation => {
            let segments = request.segments.unwrap_or_default();
            let id = state
                .store
                .segmentations
                .add_with_kind(&manifestation_id, &segments, AnnotationKind::SearchSegmentation)
                .await?;
            AnnotationCreatedResponse::single("Annotation added successfully", id)
        }
        AnnotationKind::Pagination => {
            let pages = request.pages.unwrap_or_default();
            let id = state.store.paginations.add(&manifestation_id, &pages).await?;
            AnnotationCreatedResponse::single("Annotation added successfully", id)
        }
        AnnotationKind::Alignment => {
            let input = AlignmentInput {
                target_id: request.target_manifestation_id.clone().unwrap_or_default(),
                target_segments: request.target_segments.unwrap_or_default(),
                aligned_segments: request.aligned_segments.unwrap_or_default(),
            };
            let id = state.store.alignments.add(&manifestation_id, &input).await?;
            AnnotationCreatedResponse::single("Alignment annotation added successfully", id)
        }
        AnnotationKind::Durchen => {
            let notes = request.notes.unwrap_or_default();
            let ids = state.store.notes.add_durchen(&manifestation_id, &notes).await?;
            AnnotationCreatedResponse::many("Notes added successfully", ids)
        }
        AnnotationKind::Bibliography => {
            let entries = request.entries.unwrap_or_default();
            let ids = state.store.bibliography.add(&manifestation_id, &entries).await?;
            AnnotationCreatedResponse::many("Bibliographic metadata added successfully", ids)
        }
        AnnotationKind::TableOfContents => {
            return Err(AppError::BadRequest("unsupported annotation kind".into()));
        }
    };

    if let Some(indexer) = &state.indexer {
        indexer.notify_manifestation_changed(&manifestation_id);
    }
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// GET /v2/annotations/{kind}/{id}
pub async fn get_annotation(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<Response> {
    let kind = require_kind(&kind)?;
    let missing = || {
        AppError::NotFound(format!(
            "annotation of type '{}' with id '{id}' not found",
            kind.as_str()
        ))
    };
    let response = match kind {
        AnnotationKind::Segmentation
        | AnnotationKind::Pagination
        | AnnotationKind::SearchSegmentation => {
            let record = state.store.segmentations.get(&id).await?;
            if record.kind != kind {
                return Err(missing());
            }
            Json(record).into_response()
        }
        AnnotationKind::Alignment => Json(state.store.alignments.get(&id).await?).into_response(),
        AnnotationKind::Durchen => Json(state.store.notes.get(&id).await?).into_response(),
        AnnotationKind::Bibliography => {
            Json(state.store.bibliography.get(&id).await?).into_response()
        }
        AnnotationKind::TableOfContents => return Err(missing()),
    };
    Ok(response)
}

/// PUT /v2/annotations/{kind}/{id}: delete-and-recreate with a fresh id.
pub async fn put_annotation(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
    payload: Result<Json<UpdateAnnotationRequest>, JsonRejection>,
) -> AppResult<Response> {
    let kind = require_kind(&kind)?;
    let Json(request) = payload?;

    let body = match kind {
        AnnotationKind::Segmentation | AnnotationKind::SearchSegmentation => {
            let segments = request.segments.ok_or_else(|| {
                AppError::Unprocessable("'segments' is required for segmentation updates".into())
            })?;
            let new_id = state.store.segmentations.update(&id, &segments).await?;
            AnnotationCreatedResponse::single("Annotation updated successfully", new_id)
        }
        AnnotationKind::Pagination => {
            let pages = request.pages.ok_or_else(|| {
                AppError::Unprocessable("'pages' is required for pagination updates".into())
            })?;
            let new_id = state.store.paginations.update(&id, &pages).await?;
            AnnotationCreatedResponse::single("Annotation updated successfully", new_id)
        }
        AnnotationKind::Alignment => {
            let (Some(target_segments), Some(aligned_segments)) =
                (request.target_segments, request.aligned_segments)
            else {
                return Err(AppError::Unprocessable(
                    "'target_segments' and 'aligned_segments' are required for alignment updates"
                        .into(),
                ));
            };
            // The pairing stays with the same peer edition.
            let existing = state.store.alignments.get(&id).await?;
            let input = AlignmentInput {
                target_id: existing.target_id,
                target_segments,
                aligned_segments,
            };
            let new_id = state.store.alignments.update(&id, &input).await?;
            AnnotationCreatedResponse::single("Alignment annotation updated successfully", new_id)
        }
        AnnotationKind::Durchen | AnnotationKind::Bibliography | AnnotationKind::TableOfContents => {
            return Err(AppError::BadRequest(format!(
                "annotations of type '{}' cannot be updated in place",
                kind.as_str()
            )));
        }
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// DELETE /v2/annotations/{kind}/{id}: idempotent 204 for every kind
/// except alignment, whose peer must exist (404 otherwise).
pub async fn delete_annotation(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let kind = require_kind(&kind)?;
    match kind {
        AnnotationKind::Segmentation
        | AnnotationKind::Pagination
        | AnnotationKind::SearchSegmentation => state.store.segmentations.delete(&id).await?,
        AnnotationKind::Alignment => state.store.alignments.delete(&id).await?,
        AnnotationKind::Durchen => state.store.notes.delete(&id).await?,
        AnnotationKind::Bibliography => state.store.bibliography.delete(&id).await?,
        AnnotationKind::TableOfContents => {
            return Err(AppError::NotFound(format!(
                "annotation of type 'table_of_contents' with id '{id}' not found"
            )));
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

fn require_kind(kind: &str) -> AppResult<AnnotationKind> {
    parse_kind(kind).ok_or_else(|| {
        AppError::BadRequest(format!(
            "unknown annotation kind '{kind}'; expected one of segmentation, \
             pagination, alignment, durchen, bibliographic"
        ))
    })
}
