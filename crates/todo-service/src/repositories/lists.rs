//! Lists repository.
//!
//! Every statement carries `user_id = $owner`; a list owned by another
//! identity behaves exactly like a missing one.

use super::observe;
use super::partial_update::PartialUpdate;
use crate::errors::ApiError;
use crate::models::{List, ListPatchRequest};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;
use tracing::instrument;

/// Lists repository for database operations.
pub struct ListsRepository;

impl ListsRepository {
    /// All lists owned by `owner`, ordered by id.
    #[instrument(skip_all, name = "todo.repo.list_find_all")]
    pub async fn find_all(pool: &PgPool, owner: &str) -> Result<Vec<List>, ApiError> {
        let start = Instant::now();

        let result = sqlx::query_as::<_, List>(
            r#"
            SELECT list_id, title, description
            FROM lists
            WHERE user_id = $1
            ORDER BY list_id
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await;

        observe("list_find_all", start, result)
    }

    #[instrument(skip_all, name = "todo.repo.list_find", fields(list_id = list_id))]
    pub async fn find(pool: &PgPool, owner: &str, list_id: i64) -> Result<List, ApiError> {
        let start = Instant::now();

        let result = sqlx::query_as::<_, List>(
            r#"
            SELECT list_id, title, description
            FROM lists
            WHERE list_id = $1 AND user_id = $2
            "#,
        )
        .bind(list_id)
        .bind(owner)
        .fetch_optional(pool)
        .await;

        observe("list_find", start, result)?.ok_or(ApiError::NotFound)
    }

    /// Insert a list owned by `owner`; the id is assigned by the database.
    #[instrument(skip_all, name = "todo.repo.list_create")]
    pub async fn create(
        pool: &PgPool,
        owner: &str,
        title: &str,
        description: &str,
    ) -> Result<List, ApiError> {
        let start = Instant::now();

        let result = sqlx::query_as::<_, List>(
            r#"
            INSERT INTO lists (title, description, user_id)
            VALUES ($1, $2, $3)
            RETURNING list_id, title, description
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(owner)
        .fetch_one(pool)
        .await;

        let list = observe("list_create", start, result)?;
        tracing::info!(target: "todo.repo.lists", list_id = list.list_id, "List created");
        Ok(list)
    }

    /// Overwrite both mutable fields.
    #[instrument(skip_all, name = "todo.repo.list_replace", fields(list_id = list_id))]
    pub async fn replace(
        pool: &PgPool,
        owner: &str,
        list_id: i64,
        title: &str,
        description: &str,
    ) -> Result<List, ApiError> {
        let start = Instant::now();

        let result = sqlx::query_as::<_, List>(
            r#"
            UPDATE lists
            SET title = $1, description = $2
            WHERE list_id = $3 AND user_id = $4
            RETURNING list_id, title, description
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(list_id)
        .bind(owner)
        .fetch_optional(pool)
        .await;

        observe("list_replace", start, result)?.ok_or(ApiError::NotFound)
    }

    /// Apply only the supplied fields of `patch`.
    #[instrument(skip_all, name = "todo.repo.list_update_partial", fields(list_id = list_id))]
    pub async fn update_partial(
        pool: &PgPool,
        owner: &str,
        list_id: i64,
        patch: ListPatchRequest,
    ) -> Result<List, ApiError> {
        let start = Instant::now();

        let mut builder = build_patch(owner, list_id, patch);
        let result = builder
            .build_query_as::<List>()
            .fetch_optional(pool)
            .await;

        observe("list_update_partial", start, result)?.ok_or(ApiError::NotFound)
    }

    /// Delete a list; its items go with it (`ON DELETE CASCADE`).
    #[instrument(skip_all, name = "todo.repo.list_delete", fields(list_id = list_id))]
    pub async fn delete(pool: &PgPool, owner: &str, list_id: i64) -> Result<(), ApiError> {
        let start = Instant::now();

        let result = sqlx::query("DELETE FROM lists WHERE list_id = $1 AND user_id = $2")
            .bind(list_id)
            .bind(owner)
            .execute(pool)
            .await;

        let done = observe("list_delete", start, result)?;
        if done.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }

        tracing::info!(target: "todo.repo.lists", list_id, "List deleted");
        Ok(())
    }

    /// Whether `list_id` exists and belongs to `owner`.
    #[instrument(skip_all, name = "todo.repo.list_exists", fields(list_id = list_id))]
    pub async fn exists_for_owner(
        pool: &PgPool,
        owner: &str,
        list_id: i64,
    ) -> Result<bool, ApiError> {
        let start = Instant::now();

        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM lists WHERE list_id = $1 AND user_id = $2)",
        )
        .bind(list_id)
        .bind(owner)
        .fetch_one(pool)
        .await;

        observe("list_exists", start, result)
    }
}

fn build_patch<'a>(
    owner: &'a str,
    list_id: i64,
    patch: ListPatchRequest,
) -> QueryBuilder<'a, Postgres> {
    let mut builder = PartialUpdate::new("lists", "list_id", list_id)
        .set("title", patch.title)
        .set("description", patch.description)
        .into_builder();

    builder.push(" WHERE list_id = ").push_bind(list_id);
    builder.push(" AND user_id = ").push_bind(owner);
    builder.push(" RETURNING list_id, title, description");
    builder
}
