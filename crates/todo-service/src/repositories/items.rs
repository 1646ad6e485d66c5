//! Items repository.
//!
//! Items have no owner column; ownership is the parent list's `user_id`.
//! Every mutation evaluates that ownership predicate inside the mutating
//! statement itself (`INSERT ... SELECT`, `UPDATE ... FROM`, `DELETE ...
//! USING`), so there is no window between the check and the write.

use super::lists::ListsRepository;
use super::observe;
use super::partial_update::PartialUpdate;
use crate::errors::ApiError;
use crate::models::{Item, ItemPatchRequest};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;
use tracing::instrument;

/// Items repository for database operations.
pub struct ItemsRepository;

impl ItemsRepository {
    /// All items of an owned list, ordered by id.
    ///
    /// Probes the list first so that a missing or foreign list is a 404
    /// rather than an empty array.
    #[instrument(skip_all, name = "todo.repo.item_find_all", fields(list_id = list_id))]
    pub async fn find_all(pool: &PgPool, owner: &str, list_id: i64) -> Result<Vec<Item>, ApiError> {
        if !ListsRepository::exists_for_owner(pool, owner, list_id).await? {
            return Err(ApiError::NotFound);
        }

        let start = Instant::now();

        let result = sqlx::query_as::<_, Item>(
            r#"
            SELECT item_id, content, is_complete
            FROM items
            WHERE list_id = $1
            ORDER BY item_id
            "#,
        )
        .bind(list_id)
        .fetch_all(pool)
        .await;

        observe("item_find_all", start, result)
    }

    #[instrument(
        skip_all,
        name = "todo.repo.item_find",
        fields(list_id = list_id, item_id = item_id)
    )]
    pub async fn find(
        pool: &PgPool,
        owner: &str,
        list_id: i64,
        item_id: i64,
    ) -> Result<Item, ApiError> {
        let start = Instant::now();

        let result = sqlx::query_as::<_, Item>(
            r#"
            SELECT i.item_id, i.content, i.is_complete
            FROM items i
            JOIN lists l ON l.list_id = i.list_id
            WHERE i.item_id = $1 AND i.list_id = $2 AND l.user_id = $3
            "#,
        )
        .bind(item_id)
        .bind(list_id)
        .bind(owner)
        .fetch_optional(pool)
        .await;

        observe("item_find", start, result)?.ok_or(ApiError::NotFound)
    }

    /// Insert an item under an owned list.
    ///
    /// The insert selects from `lists` with the ownership predicate, so a
    /// missing or foreign list inserts nothing and yields `NotFound`.
    #[instrument(skip_all, name = "todo.repo.item_create", fields(list_id = list_id))]
    pub async fn create(
        pool: &PgPool,
        owner: &str,
        list_id: i64,
        content: &str,
        is_complete: bool,
    ) -> Result<Item, ApiError> {
        let start = Instant::now();

        let result = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (content, is_complete, list_id)
            SELECT $1, $2, l.list_id
            FROM lists l
            WHERE l.list_id = $3 AND l.user_id = $4
            RETURNING item_id, content, is_complete
            "#,
        )
        .bind(content)
        .bind(is_complete)
        .bind(list_id)
        .bind(owner)
        .fetch_optional(pool)
        .await;

        let item = observe("item_create", start, result)?.ok_or(ApiError::NotFound)?;
        tracing::info!(
            target: "todo.repo.items",
            list_id,
            item_id = item.item_id,
            "Item created"
        );
        Ok(item)
    }

    /// Overwrite both mutable fields.
    #[instrument(
        skip_all,
        name = "todo.repo.item_replace",
        fields(list_id = list_id, item_id = item_id)
    )]
    pub async fn replace(
        pool: &PgPool,
        owner: &str,
        list_id: i64,
        item_id: i64,
        content: &str,
        is_complete: bool,
    ) -> Result<Item, ApiError> {
        let start = Instant::now();

        let result = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET content = $1, is_complete = $2
            FROM lists
            WHERE items.list_id = lists.list_id
              AND items.item_id = $3
              AND items.list_id = $4
              AND lists.user_id = $5
            RETURNING items.item_id, items.content, items.is_complete
            "#,
        )
        .bind(content)
        .bind(is_complete)
        .bind(item_id)
        .bind(list_id)
        .bind(owner)
        .fetch_optional(pool)
        .await;

        observe("item_replace", start, result)?.ok_or(ApiError::NotFound)
    }

    /// Apply only the supplied fields of `patch`.
    #[instrument(
        skip_all,
        name = "todo.repo.item_update_partial",
        fields(list_id = list_id, item_id = item_id)
    )]
    pub async fn update_partial(
        pool: &PgPool,
        owner: &str,
        list_id: i64,
        item_id: i64,
        patch: ItemPatchRequest,
    ) -> Result<Item, ApiError> {
        let start = Instant::now();

        let mut builder = build_patch(owner, list_id, item_id, patch);
        let result = builder
            .build_query_as::<Item>()
            .fetch_optional(pool)
            .await;

        observe("item_update_partial", start, result)?.ok_or(ApiError::NotFound)
    }

    #[instrument(
        skip_all,
        name = "todo.repo.item_delete",
        fields(list_id = list_id, item_id = item_id)
    )]
    pub async fn delete(
        pool: &PgPool,
        owner: &str,
        list_id: i64,
        item_id: i64,
    ) -> Result<(), ApiError> {
        let start = Instant::now();

        let result = sqlx::query(
            r#"
            DELETE FROM items
            USING lists
            WHERE items.list_id = lists.list_id
              AND items.item_id = $1
              AND items.list_id = $2
              AND lists.user_id = $3
            "#,
        )
        .bind(item_id)
        .bind(list_id)
        .bind(owner)
        .execute(pool)
        .await;

        let done = observe("item_delete", start, result)?;
        if done.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }

        tracing::info!(target: "todo.repo.items", list_id, item_id, "Item deleted");
        Ok(())
    }
}

fn build_patch<'a>(
    owner: &'a str,
    list_id: i64,
    item_id: i64,
    patch: ItemPatchRequest,
) -> QueryBuilder<'a, Postgres> {
    let mut builder = PartialUpdate::new("items", "item_id", item_id)
        .set("content", patch.content)
        .set("is_complete", patch.is_complete)
        .into_builder();

    builder.push(" FROM lists WHERE items.list_id = lists.list_id");
    builder.push(" AND items.item_id = ").push_bind(item_id);
    builder.push(" AND items.list_id = ").push_bind(list_id);
    builder.push(" AND lists.user_id = ").push_bind(owner);
    builder.push(" RETURNING items.item_id, items.content, items.is_complete");
    builder
}
