use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use graph_store::model::{PersonInput, PersonRecord};

use crate::core::app_state::AppState;
use crate::error_handler::{AppError, AppResult};
use crate::routes::paging;
use crate::routes::persons::persons_request::ListPersonsParams;
use crate::routes::persons::persons_response::PersonCreatedResponse;

/// GET /v2/persons
pub async fn list_persons(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListPersonsParams>,
) -> AppResult<Json<Vec<PersonRecord>>> {
    let (limit, offset) = paging(params.limit, params.offset)?;
    Ok(Json(state.store.persons.get_all(offset, limit).await?))
}

/// GET /v2/persons/{id}
pub async fn get_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<PersonRecord>> {
    Ok(Json(state.store.persons.get(&id).await?))
}

/// POST /v2/persons
pub async fn post_person(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PersonInput>, JsonRejection>,
) -> AppResult<Response> {
    let Json(input) = payload?;
    if input.name.is_empty() {
        return Err(AppError::Unprocessable("name must contain at least one entry".into()));
    }
    let id = state.store.persons.create(&input).await?;
    let body = PersonCreatedResponse { message: "Person created successfully".into(), id };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// DELETE /v2/persons/{id}: refused while contributions still reference
/// the person.
pub async fn delete_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.store.persons.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
