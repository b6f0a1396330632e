/// Bearer token model and database operations
///
/// A token row records who a secret belongs to, what it may be used for and
/// until when. The secret itself is never stored, only its SHA-256 hash, so a
/// database dump yields no usable credentials.
///
/// # Security
///
/// - The plaintext is returned once, from [`Token::create`], and never again
/// - Lookups are by hash equality only
/// - Expiry is set and checked with the database clock (`NOW()`)
/// - Several tokens may coexist per (user, scope); revocation drops them all
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tokens (
///     hash CHAR(64) PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     expiry TIMESTAMPTZ NOT NULL,
///     scope TEXT NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use listkeeper_shared::auth::token::SCOPE_AUTHENTICATION;
/// use listkeeper_shared::models::token::Token;
/// use sqlx::{PgConnection, PgPool};
///
/// # async fn example(pool: PgPool, user_id: i64) -> Result<(), sqlx::Error> {
/// let token = Token::create(&pool, user_id, Duration::from_secs(24 * 3600), SCOPE_AUTHENTICATION).await?;
///
/// // Hand token.plaintext to the client now; it cannot be recovered later.
/// let user = Token::resolve_user(&pool, SCOPE_AUTHENTICATION, &token.plaintext).await?;
/// assert!(user.is_some());
///
/// Token::revoke_all(&pool, user_id, SCOPE_AUTHENTICATION).await?;
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::auth::token::{generate_secret, hash_secret};
use crate::models::user::User;

/// An issued bearer token
///
/// Only ever constructed by [`Token::create`]; serializes as
/// `{ "token": "...", "expiry": "..." }` for the login response.
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    /// Plaintext secret, present only on the value returned at creation
    #[serde(rename = "token")]
    pub plaintext: String,

    /// SHA-256 hex hash of the secret (the persisted key)
    #[serde(skip_serializing)]
    pub hash: String,

    /// Owning user
    #[serde(skip_serializing)]
    pub user_id: i64,

    /// Expiry as computed by the database
    pub expiry: DateTime<Utc>,

    /// Purpose label (e.g. "authentication")
    #[serde(skip_serializing)]
    pub scope: String,
}

impl Token {
    /// Issues a new token for `user_id`
    ///
    /// Generates a secret, stores `(hash, user_id, NOW() + ttl, scope)` and
    /// returns the token carrying the plaintext.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails. The secret is discarded and the
    /// insert is not retried.
    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        ttl: Duration,
        scope: &str,
    ) -> Result<Self, sqlx::Error> {
        let (plaintext, hash) = generate_secret();

        let expiry: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, NOW() + ($3::FLOAT8 * INTERVAL '1 second'), $4)
            RETURNING expiry
            "#,
        )
        .bind(&hash)
        .bind(user_id)
        .bind(ttl.as_secs_f64())
        .bind(scope)
        .fetch_one(pool)
        .await?;

        tracing::info!(user_id, scope, %expiry, "Token issued");

        Ok(Self {
            plaintext,
            hash,
            user_id,
            expiry,
            scope: scope.to_string(),
        })
    }

    /// Resolves a presented secret to its owning user
    ///
    /// Hashes `plaintext` and joins the matching, unexpired token of `scope`
    /// to its user. Expired, revoked, unknown and wrong-scope tokens all
    /// resolve to `None`; that is the normal unauthenticated path.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database query fails
    pub async fn resolve_user(
        pool: &PgPool,
        scope: &str,
        plaintext: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let hash = hash_secret(plaintext);

        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.created_at, u.updated_at
            FROM users u
            INNER JOIN tokens t ON t.user_id = u.id
            WHERE t.hash = $1
              AND t.scope = $2
              AND t.expiry > NOW()
            "#,
        )
        .bind(hash)
        .bind(scope)
        .fetch_optional(pool)
        .await
    }

    /// Deletes every token of `scope` held by `user_id`
    ///
    /// Idempotent: succeeds when nothing matched.
    ///
    /// # Returns
    ///
    /// Number of tokens removed
    pub async fn revoke_all(pool: &PgPool, user_id: i64, scope: &str) -> Result<u64, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::revoke_all_in(&mut *conn, user_id, scope).await
    }

    /// Same as [`Token::revoke_all`], on a caller-held connection
    pub async fn revoke_all_in(
        conn: &mut PgConnection,
        user_id: i64,
        scope: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND scope = $2")
            .bind(user_id)
            .bind(scope)
            .execute(&mut *conn)
            .await?;

        tracing::info!(user_id, scope, revoked = result.rows_affected(), "Tokens revoked");
        Ok(result.rows_affected())
    }

    /// Removes tokens whose expiry has passed
    ///
    /// # Returns
    ///
    /// Number of tokens removed
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tokens WHERE expiry <= NOW()")
            .execute(pool)
            .await?;

        tracing::debug!(removed = result.rows_affected(), "Expired tokens removed");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_exposes_only_plaintext_and_expiry() {
        let token = Token {
            plaintext: "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdef".to_string(),
            hash: hash_secret("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdef"),
            user_id: 42,
            expiry: Utc::now(),
            scope: "authentication".to_string(),
        };

        let json = serde_json::to_value(&token).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 2);
        assert_eq!(json["token"], "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdef");
        assert!(json["expiry"].is_string());
    }
}
