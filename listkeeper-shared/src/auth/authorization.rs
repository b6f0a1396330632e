/// Resource ownership checks
///
/// The identity middleware establishes *who* is asking. This module answers
/// *may they* for a single resource: a resource type implements
/// [`OwnedResource`] to expose its owner lookup, and [`require_ownership`]
/// compares that owner with the requester.
///
/// # Example
///
/// ```no_run
/// use listkeeper_shared::auth::authorization::require_ownership;
/// use listkeeper_shared::models::list::List;
/// use listkeeper_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, requester: User, list_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// require_ownership::<List>(&pool, &requester, list_id).await?;
/// // requester owns list_id; safe to mutate
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::user::User;

/// Error type for ownership checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The resource doesn't exist
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// The resource exists but belongs to someone else
    #[error("Not authorized to modify this {kind}")]
    Forbidden { kind: &'static str },

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// A resource with a single owning user
#[async_trait]
pub trait OwnedResource {
    /// Human-readable resource name used in errors (e.g. "list")
    const KIND: &'static str;

    /// Looks up the owner of resource `id`, None if it doesn't exist
    async fn owner_id(pool: &PgPool, id: i64) -> Result<Option<i64>, sqlx::Error>;
}

/// Compares a looked-up owner with the requester
///
/// # Errors
///
/// - `AuthzError::NotFound` if `owner` is None
/// - `AuthzError::Forbidden` if the owner differs from `requester_id`
pub fn check_owner(
    kind: &'static str,
    id: i64,
    owner: Option<i64>,
    requester_id: i64,
) -> Result<(), AuthzError> {
    match owner {
        None => Err(AuthzError::NotFound { kind, id }),
        Some(owner_id) if owner_id != requester_id => {
            tracing::warn!(resource = kind, id, owner_id, requester_id, "Ownership check failed");
            Err(AuthzError::Forbidden { kind })
        }
        Some(_) => Ok(()),
    }
}

/// Checks that `requester` owns resource `id` of type `R`
///
/// # Errors
///
/// See [`check_owner`]; database failures surface as `AuthzError::DatabaseError`
pub async fn require_ownership<R: OwnedResource>(
    pool: &PgPool,
    requester: &User,
    id: i64,
) -> Result<(), AuthzError> {
    let owner = R::owner_id(pool, id).await?;
    check_owner(R::KIND, id, owner, requester.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_owner_same_user() {
        assert!(check_owner("list", 1, Some(10), 10).is_ok());
    }

    #[test]
    fn test_check_owner_different_user() {
        let result = check_owner("list", 1, Some(10), 11);
        assert!(matches!(result, Err(AuthzError::Forbidden { kind: "list" })));
    }

    #[test]
    fn test_check_owner_missing_resource() {
        let result = check_owner("list", 99, None, 10);
        assert!(matches!(result, Err(AuthzError::NotFound { kind: "list", id: 99 })));
    }

    #[test]
    fn test_authz_error_display() {
        let err = AuthzError::NotFound { kind: "list", id: 4 };
        assert_eq!(err.to_string(), "list 4 not found");

        let err = AuthzError::Forbidden { kind: "list" };
        assert!(err.to_string().contains("Not authorized"));
    }
}
