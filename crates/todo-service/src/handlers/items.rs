//! Item handlers.
//!
//! Items are only reachable through a list the caller owns.

use super::{parse_body, parse_patch_body, path_params};
use crate::auth::Identity;
use crate::errors::ApiError;
use crate::models::{Item, ItemPatchRequest, ItemPath, ItemRequest, ListPath};
use crate::repositories::ItemsRepository;
use crate::routes::AppState;
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// `GET /list/:list_id/item`
#[instrument(skip_all, name = "todo.items.list")]
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    path: Result<Path<ListPath>, PathRejection>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let ListPath { list_id } = path_params(path)?;

    let items = ItemsRepository::find_all(&state.pool, identity.as_str(), list_id).await?;
    Ok(Json(items))
}

/// `GET /list/:list_id/item/:item_id`
#[instrument(skip_all, name = "todo.items.get")]
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    path: Result<Path<ItemPath>, PathRejection>,
) -> Result<Json<Item>, ApiError> {
    let ItemPath { list_id, item_id } = path_params(path)?;

    let item = ItemsRepository::find(&state.pool, identity.as_str(), list_id, item_id).await?;
    Ok(Json(item))
}

/// `POST /list/:list_id/item`
#[instrument(skip_all, name = "todo.items.create")]
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    path: Result<Path<ListPath>, PathRejection>,
    body: Bytes,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let ListPath { list_id } = path_params(path)?;
    let request: ItemRequest = parse_body(&body)?;

    let item = ItemsRepository::create(
        &state.pool,
        identity.as_str(),
        list_id,
        &request.content,
        request.is_complete,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// `PUT /list/:list_id/item/:item_id`
#[instrument(skip_all, name = "todo.items.replace")]
pub async fn replace_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    path: Result<Path<ItemPath>, PathRejection>,
    body: Bytes,
) -> Result<Json<Item>, ApiError> {
    let ItemPath { list_id, item_id } = path_params(path)?;
    let request: ItemRequest = parse_body(&body)?;

    let item = ItemsRepository::replace(
        &state.pool,
        identity.as_str(),
        list_id,
        item_id,
        &request.content,
        request.is_complete,
    )
    .await?;

    Ok(Json(item))
}

/// `PATCH /list/:list_id/item/:item_id`
#[instrument(skip_all, name = "todo.items.update")]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    path: Result<Path<ItemPath>, PathRejection>,
    body: Bytes,
) -> Result<Json<Item>, ApiError> {
    let ItemPath { list_id, item_id } = path_params(path)?;
    let patch: ItemPatchRequest = parse_patch_body(&body)?;

    let item =
        ItemsRepository::update_partial(&state.pool, identity.as_str(), list_id, item_id, patch)
            .await?;

    Ok(Json(item))
}

/// `DELETE /list/:list_id/item/:item_id`
#[instrument(skip_all, name = "todo.items.delete")]
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    path: Result<Path<ItemPath>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let ItemPath { list_id, item_id } = path_params(path)?;

    ItemsRepository::delete(&state.pool, identity.as_str(), list_id, item_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
