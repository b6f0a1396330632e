/// Authentication and authorization utilities
///
/// This module provides the trust primitives for Listkeeper:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: Opaque bearer-token secret generation and SHA-256 hashing
/// - [`middleware`]: Identity resolution for inbound requests (who is asking)
/// - [`authorization`]: Ownership predicates for resources (may they act)
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Bearer Tokens**: 32-char base62 secrets, only the SHA-256 hash is stored
/// - **Expiry**: Checked against the database clock, never the process clock
///
/// # Example
///
/// ```
/// use listkeeper_shared::auth::password::{hash_password, verify_password};
/// use listkeeper_shared::auth::token::{generate_secret, hash_secret};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery staple")?;
/// assert!(verify_password("correct horse battery staple", &hash)?);
///
/// let (plaintext, token_hash) = generate_secret();
/// assert_eq!(hash_secret(&plaintext), token_hash);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod token;
