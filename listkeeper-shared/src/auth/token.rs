/// Bearer-token secret utilities
///
/// Generates opaque token secrets and derives the hash that is persisted in
/// place of the secret. Database operations live in `models::token`.
///
/// # Format
///
/// - **Secret**: 32 base62 characters ([A-Za-z0-9]) from a CSPRNG, ≈190 bits
/// - **Hash**: lowercase hex SHA-256 of the secret (64 characters)
///
/// Secrets are already high-entropy, so a fast hash is enough and keeps
/// per-request validation cheap.
///
/// # Example
///
/// ```
/// use listkeeper_shared::auth::token::{generate_secret, hash_secret, validate_secret_format};
///
/// let (secret, hash) = generate_secret();
/// assert_eq!(secret.len(), 32);
/// assert!(validate_secret_format(&secret));
/// assert_eq!(hash_secret(&secret), hash);
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a token secret (characters)
pub const SECRET_LENGTH: usize = 32;

/// Scope of tokens issued at login and accepted by the identity middleware
pub const SCOPE_AUTHENTICATION: &str = "authentication";

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a new token secret
///
/// # Returns
///
/// Tuple of (plaintext_secret, sha256_hex_hash). The plaintext is meant to be
/// handed to the client once and then dropped.
pub fn generate_secret() -> (String, String) {
    let mut rng = rand::thread_rng();

    let secret: String = (0..SECRET_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    let hash = hash_secret(&secret);

    (secret, hash)
}

/// Hashes a token secret using SHA-256
///
/// Deterministic, so a presented secret can be looked up by equality.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Checks that a presented secret could have been issued by [`generate_secret`]
///
/// Lets the identity middleware skip the database for obviously bogus input.
pub fn validate_secret_format(secret: &str) -> bool {
    secret.len() == SECRET_LENGTH && secret.bytes().all(|b| b.is_ascii_alphanumeric())
}
