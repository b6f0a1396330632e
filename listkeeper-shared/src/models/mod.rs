/// Database models for Listkeeper
///
/// This module contains all database models and their operations.
///
/// # Models
///
/// - `user`: User accounts and credentials
/// - `token`: Hashed bearer tokens (issue, resolve, revoke)
/// - `list`: Lists and their ordered entries, written transactionally
///
/// # Example
///
/// ```no_run
/// use listkeeper_shared::auth::password::CredentialHash;
/// use listkeeper_shared::db::pool::{create_pool, DatabaseConfig};
/// use listkeeper_shared::models::user::{CreateUser, User};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     username: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: CredentialHash::set("correct horse battery")?,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod list;
pub mod token;
pub mod user;
