//! List handlers.
//!
//! Every handler runs behind `require_auth` and scopes its repository call
//! by the caller's `Identity`.

use super::{parse_body, parse_patch_body, path_params};
use crate::auth::Identity;
use crate::errors::ApiError;
use crate::models::{List, ListPatchRequest, ListPath, ListRequest};
use crate::repositories::ListsRepository;
use crate::routes::AppState;
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// `GET /list`
#[instrument(skip_all, name = "todo.lists.list")]
pub async fn list_lists(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<List>>, ApiError> {
    let lists = ListsRepository::find_all(&state.pool, identity.as_str()).await?;
    Ok(Json(lists))
}

/// `GET /list/:list_id`
#[instrument(skip_all, name = "todo.lists.get")]
pub async fn get_list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    path: Result<Path<ListPath>, PathRejection>,
) -> Result<Json<List>, ApiError> {
    let ListPath { list_id } = path_params(path)?;

    let list = ListsRepository::find(&state.pool, identity.as_str(), list_id).await?;
    Ok(Json(list))
}

/// `POST /list`
#[instrument(skip_all, name = "todo.lists.create")]
pub async fn create_list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    body: Bytes,
) -> Result<(StatusCode, Json<List>), ApiError> {
    let request: ListRequest = parse_body(&body)?;

    let list = ListsRepository::create(
        &state.pool,
        identity.as_str(),
        &request.title,
        &request.description,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(list)))
}

/// `PUT /list/:list_id`
#[instrument(skip_all, name = "todo.lists.replace")]
pub async fn replace_list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    path: Result<Path<ListPath>, PathRejection>,
    body: Bytes,
) -> Result<Json<List>, ApiError> {
    let ListPath { list_id } = path_params(path)?;
    let request: ListRequest = parse_body(&body)?;

    let list = ListsRepository::replace(
        &state.pool,
        identity.as_str(),
        list_id,
        &request.title,
        &request.description,
    )
    .await?;

    Ok(Json(list))
}

/// `PATCH /list/:list_id`
#[instrument(skip_all, name = "todo.lists.update")]
pub async fn update_list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    path: Result<Path<ListPath>, PathRejection>,
    body: Bytes,
) -> Result<Json<List>, ApiError> {
    let ListPath { list_id } = path_params(path)?;
    let patch: ListPatchRequest = parse_patch_body(&body)?;

    let list =
        ListsRepository::update_partial(&state.pool, identity.as_str(), list_id, patch).await?;

    Ok(Json(list))
}

/// `DELETE /list/:list_id`
///
/// Removes the list and, through the foreign key cascade, all of its items.
#[instrument(skip_all, name = "todo.lists.delete")]
pub async fn delete_list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    path: Result<Path<ListPath>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let ListPath { list_id } = path_params(path)?;

    ListsRepository::delete(&state.pool, identity.as_str(), list_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
