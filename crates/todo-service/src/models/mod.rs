//! Todo service models.
//!
//! Request bodies, response records and path parameters. The owner identity
//! is never part of a response type.

use serde::{Deserialize, Serialize};

// ============================================================================
// Lists
// ============================================================================

/// A list as stored and returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct List {
    pub list_id: i64,
    pub title: String,
    pub description: String,
}

/// Body of `POST /list` and `PUT /list/:list_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListRequest {
    pub title: String,

    #[serde(default)]
    pub description: String,
}

/// Body of `PATCH /list/:list_id`.
///
/// An absent or `null` field is left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPatchRequest {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Path parameters for `/list/:list_id` and `/list/:list_id/item`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListPath {
    pub list_id: i64,
}

// ============================================================================
// Items
// ============================================================================

/// An item as stored and returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub item_id: i64,
    pub content: String,
    pub is_complete: bool,
}

/// Body of `POST /list/:list_id/item` and `PUT /list/:list_id/item/:item_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRequest {
    pub content: String,

    #[serde(default)]
    pub is_complete: bool,
}

/// Body of `PATCH /list/:list_id/item/:item_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatchRequest {
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub is_complete: Option<bool>,
}

/// Path parameters for `/list/:list_id/item/:item_id`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ItemPath {
    pub list_id: i64,
    pub item_id: i64,
}

// ============================================================================
// Operational
// ============================================================================

/// Readiness check response, returned by `/ready`.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: &'static str,

    /// Database connectivity status.
    pub database: &'static str,

    /// Generic error message, no infrastructure details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_serialization_has_no_owner() {
        let list = List {
            list_id: 3,
            title: "Groceries".to_string(),
            description: "Weekly shop".to_string(),
        };

        let json = serde_json::to_value(&list).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"list_id": 3, "title": "Groceries", "description": "Weekly shop"})
        );
    }

    #[test]
    fn test_list_request_requires_title() {
        let result: Result<ListRequest, _> =
            serde_json::from_str(r#"{"description": "no title"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_request_description_defaults_to_empty() {
        let request: ListRequest = serde_json::from_str(r#"{"title": "Chores"}"#).unwrap();
        assert_eq!(request.description, "");
    }

    #[test]
    fn test_list_patch_absent_and_null_are_unset() {
        let patch: ListPatchRequest = serde_json::from_str(r#"{"title": null}"#).unwrap();
        assert!(patch.title.is_none());
        assert!(patch.description.is_none());
    }

    #[test]
    fn test_list_patch_empty_string_is_supplied() {
        let patch: ListPatchRequest = serde_json::from_str(r#"{"description": ""}"#).unwrap();
        assert_eq!(patch.description.as_deref(), Some(""));
    }

    #[test]
    fn test_item_patch_false_is_supplied() {
        let patch: ItemPatchRequest = serde_json::from_str(r#"{"is_complete": false}"#).unwrap();
        assert_eq!(patch.is_complete, Some(false));
        assert!(patch.content.is_none());
    }

    #[test]
    fn test_item_request_rejects_wrong_type() {
        let result: Result<ItemRequest, _> =
            serde_json::from_str(r#"{"content": "milk", "is_complete": "yes"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_item_serialization() {
        let item = Item {
            item_id: 9,
            content: "Milk".to_string(),
            is_complete: true,
        };

        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"item_id": 9, "content": "Milk", "is_complete": true})
        );
    }
}
