/// List endpoints
///
/// # Endpoints
///
/// - `POST /v1/lists` - Create a list owned by the caller
/// - `GET /v1/lists/:id` - Fetch a list with its entries (public)
/// - `GET /v1/lists/:id/owner` - Fetch only the owner ID (public)
/// - `PUT /v1/lists/:id` - Update a list (owner only)
/// - `DELETE /v1/lists/:id` - Delete a list (owner only)
///
/// Mutations check ownership before touching the list, so a non-owner gets
/// `403` and the list is left as it was.

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult},
};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    Json,
};
use listkeeper_shared::{
    auth::{authorization::require_ownership, middleware::CurrentUser},
    models::list::{CreateList, List, NewListEntry, UpdateList},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// An entry as sent by clients
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ListEntryRequest {
    /// Entry text
    #[validate(length(min = 1, max = 255, message = "Entry title must be between 1 and 255 characters"))]
    pub title: String,

    /// Display position; defaults to the entry's position in the array
    pub order_index: Option<i32>,
}

/// Create list request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateListRequest {
    /// Title
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,

    /// Description
    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,

    /// Initial entries
    #[serde(default)]
    pub entries: Vec<ListEntryRequest>,
}

/// Update list request
///
/// Absent (or `null`) fields are left unchanged. A present `entries` array
/// replaces the stored entries entirely; `[]` removes them all.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateListRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,

    /// New description
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    /// Replacement entries
    pub entries: Option<Vec<ListEntryRequest>>,

    /// Version the client last read; a mismatch fails with 409
    pub version: Option<i32>,
}

/// Owner lookup response
#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerResponse {
    /// Owning user ID
    pub user_id: i64,
}

/// List ID path parameter
///
/// Anything that isn't a positive integer is reported as a missing list.
#[derive(Debug, Clone, Copy)]
pub struct ListId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for ListId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) if id > 0 => Ok(ListId(id)),
            _ => Err(list_not_found()),
        }
    }
}

/// Create a list
///
/// # Endpoint
///
/// ```text
/// POST /v1/lists
/// Authorization: Bearer <token>
///
/// {
///   "title": "Groceries",
///   "description": "Saturday market",
///   "entries": [
///     { "title": "Milk", "order_index": 0 },
///     { "title": "Eggs", "order_index": 1 }
///   ]
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: No valid token
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreateListRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<List>)> {
    let Json(req) = payload?;
    validate_with_entries(&req, Some(req.entries.as_slice()))?;

    let list = List::create(
        &state.db,
        user.id,
        CreateList {
            title: req.title,
            description: req.description,
            entries: into_new_entries(req.entries),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(list)))
}

/// Fetch a list with its entries
pub async fn get_list(State(state): State<AppState>, ListId(id): ListId) -> ApiResult<Json<List>> {
    List::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(list_not_found)
}

/// Fetch the owner of a list
pub async fn get_list_owner(
    State(state): State<AppState>,
    ListId(id): ListId,
) -> ApiResult<Json<OwnerResponse>> {
    List::get_owner(&state.db, id)
        .await?
        .map(|user_id| Json(OwnerResponse { user_id }))
        .ok_or_else(list_not_found)
}

/// Update a list
///
/// # Errors
///
/// - `401 Unauthorized`: No valid token
/// - `403 Forbidden`: Caller doesn't own the list
/// - `404 Not Found`: No such list
/// - `409 Conflict`: `version` is stale
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ListId(id): ListId,
    payload: Result<Json<UpdateListRequest>, JsonRejection>,
) -> ApiResult<Json<List>> {
    let Json(req) = payload?;
    validate_with_entries(&req, req.entries.as_deref())?;

    require_ownership::<List>(&state.db, &user, id).await?;

    let list = List::update(
        &state.db,
        id,
        user.id,
        UpdateList {
            title: req.title,
            description: req.description,
            entries: req.entries.map(into_new_entries),
            expected_version: req.version,
        },
    )
    .await?;

    Ok(Json(list))
}

/// Delete a list
///
/// # Errors
///
/// - `401 Unauthorized`: No valid token
/// - `403 Forbidden`: Caller doesn't own the list
/// - `404 Not Found`: No such list
pub async fn delete_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ListId(id): ListId,
) -> ApiResult<StatusCode> {
    require_ownership::<List>(&state.db, &user, id).await?;
    List::delete(&state.db, id, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn list_not_found() -> ApiError {
    ApiError::NotFound("List not found".to_string())
}

/// Validates a request and each of its entries, collecting every failure
fn validate_with_entries<T: Validate>(
    req: &T,
    entries: Option<&[ListEntryRequest]>,
) -> ApiResult<()> {
    let mut details = match req.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => validation_details("", &errors),
    };

    for (position, entry) in entries.unwrap_or_default().iter().enumerate() {
        if let Err(errors) = entry.validate() {
            details.extend(validation_details(&format!("entries[{}].", position), &errors));
        }
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(details))
    }
}

fn into_new_entries(entries: Vec<ListEntryRequest>) -> Vec<NewListEntry> {
    entries
        .into_iter()
        .zip(0..)
        .map(|(entry, position)| NewListEntry {
            title: entry.title,
            order_index: entry.order_index.unwrap_or(position),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, order_index: Option<i32>) -> ListEntryRequest {
        ListEntryRequest {
            title: title.to_string(),
            order_index,
        }
    }

    #[test]
    fn test_into_new_entries_defaults_order_to_position() {
        let entries = into_new_entries(vec![entry("a", None), entry("b", Some(10)), entry("c", None)]);

        let orders: Vec<i32> = entries.iter().map(|e| e.order_index).collect();
        assert_eq!(orders, vec![0, 10, 2]);
    }

    #[test]
    fn test_validate_reports_entry_positions() {
        let req = CreateListRequest {
            title: String::new(),
            description: String::new(),
            entries: vec![entry("fine", None), entry("", None)],
        };

        match validate_with_entries(&req, Some(req.entries.as_slice())) {
            Err(ApiError::ValidationError(details)) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "entries[1].title"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_update_request_tri_state_entries() {
        let absent: UpdateListRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert!(absent.entries.is_none());

        let null: UpdateListRequest = serde_json::from_str(r#"{"entries":null}"#).unwrap();
        assert!(null.entries.is_none());

        let empty: UpdateListRequest = serde_json::from_str(r#"{"entries":[]}"#).unwrap();
        assert_eq!(empty.entries.map(|e| e.len()), Some(0));
    }

    #[test]
    fn test_description_length_limit() {
        let req = UpdateListRequest {
            description: Some("x".repeat(2001)),
            ..Default::default()
        };
        assert!(validate_with_entries(&req, None).is_err());
    }
}
