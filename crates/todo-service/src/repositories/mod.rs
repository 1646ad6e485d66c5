//! Repository layer for the Todo service.
//!
//! Every query is scoped by the caller's identity: directly through
//! `lists.user_id`, and transitively through the parent list for items. A row
//! that does not exist and a row owned by someone else are indistinguishable
//! to callers; both come back as `ApiError::NotFound`.

pub mod items;
pub mod lists;
pub mod partial_update;

pub use items::ItemsRepository;
pub use lists::ListsRepository;

use crate::errors::ApiError;
use crate::observability::metrics;
use std::time::Instant;

/// Record the query outcome and map the sqlx error through `From`.
fn observe<T>(
    operation: &'static str,
    start: Instant,
    result: Result<T, sqlx::Error>,
) -> Result<T, ApiError> {
    let duration = start.elapsed();
    match result {
        Ok(value) => {
            metrics::record_db_query(operation, "success", duration);
            Ok(value)
        }
        Err(e) => {
            metrics::record_db_query(operation, "error", duration);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_passes_value_through() {
        let result = observe("list_find", Instant::now(), Ok::<_, sqlx::Error>(7));
        assert!(matches!(result, Ok(7)));
    }

    #[test]
    fn test_observe_maps_row_not_found_to_not_found() {
        let result = observe::<()>("list_find", Instant::now(), Err(sqlx::Error::RowNotFound));
        assert!(matches!(result, Err(ApiError::NotFound)));
    }

    #[test]
    fn test_observe_maps_pool_errors_to_database() {
        let result = observe::<()>("list_find", Instant::now(), Err(sqlx::Error::PoolTimedOut));
        assert!(matches!(result, Err(ApiError::Database(_))));
    }
}
