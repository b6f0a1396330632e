/// Password hashing module using Argon2id
///
/// Plaintext passwords are turned into salted, memory-hard PHC strings and
/// never stored. Verification goes through Argon2's own constant-time check.
///
/// # Parameters
///
/// - **Algorithm**: Argon2id, version 0x13
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash, 16-byte random salt
///
/// # Example
///
/// ```
/// use listkeeper_shared::auth::password::CredentialHash;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = CredentialHash::set("super_secret_password_123")?;
///
/// assert!(hash.matches("super_secret_password_123")?);
/// assert!(!hash.matches("wrong_password")?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use std::{fmt, sync::OnceLock};

/// Minimum accepted password length (characters)
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length (characters)
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Hash generation failed (parameter or resource failure)
    #[error("Failed to hash password: {0}")]
    HashingFailure(String),

    /// The stored hash is malformed or could not be checked
    #[error("Failed to verify password: {0}")]
    VerificationFailure(String),
}

/// Opaque Argon2id password hash (PHC string)
///
/// Stored in `users.password_hash`. It deliberately implements neither
/// `Serialize` nor a revealing `Debug`, so it cannot leak into responses or logs.
#[derive(Clone, PartialEq, Eq, sqlx::Type)]
#[sqlx(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Hashes `plaintext` with a fresh random salt
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashingFailure` if Argon2 fails
    pub fn set(plaintext: &str) -> Result<Self, PasswordError> {
        hash_password(plaintext).map(Self)
    }

    /// Checks `plaintext` against this hash
    ///
    /// Returns `Ok(false)` for a wrong password. Only a corrupt hash is an error.
    pub fn matches(&self, plaintext: &str) -> Result<bool, PasswordError> {
        verify_password(plaintext, &self.0)
    }

    /// Wraps a PHC string loaded from storage
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// Returns the PHC string for persistence
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(<redacted>)")
    }
}

/// Hashes a password using Argon2id with the module parameters
///
/// # Returns
///
/// PHC string format hash (includes algorithm, parameters, salt, and hash)
///
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashingFailure` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashingFailure(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailure(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a PHC hash
///
/// # Returns
///
/// `Ok(true)` if password matches, `Ok(false)` if it doesn't match
///
/// # Errors
///
/// Returns `PasswordError::VerificationFailure` when the hash cannot be parsed
/// or the primitive itself fails.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::VerificationFailure(format!("Failed to parse hash: {}", e)))?;

    if parsed_hash.algorithm.as_str() != "argon2id" {
        return Err(PasswordError::VerificationFailure(format!(
            "Unsupported algorithm: {}",
            parsed_hash.algorithm
        )));
    }

    // A header without salt or output parses but can never verify
    if parsed_hash.salt.is_none() || parsed_hash.hash.is_none() {
        return Err(PasswordError::VerificationFailure(
            "Hash is missing salt or output".to_string(),
        ));
    }

    // Parameters are embedded in the hash
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailure(format!(
            "Verification failed: {}",
            e
        ))),
    }
}

/// Runs a full Argon2 verification against a throwaway hash
///
/// Called when a login names an unknown user so the response takes as long
/// as a wrong password would. The reference hash is built once per process
/// with the same parameters as stored hashes.
pub fn verify_dummy(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let dummy = DUMMY_HASH.get_or_init(|| hash_password("listkeeper-dummy-password").ok());

    match dummy {
        Some(hash) => {
            let _ = verify_password(password, hash);
        }
        None => {
            let _ = hash_password(password);
        }
    }
}

/// Validates password length before hashing
///
/// # Example
///
/// ```
/// use listkeeper_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("long enough").is_ok());
/// assert!(validate_password_strength("short").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        ));
    }

    if password.trim().is_empty() {
        return Err("Password must not be blank".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_same_plaintext_yields_different_hashes() {
        let first = CredentialHash::set("same_password").expect("Hash 1 should succeed");
        let second = CredentialHash::set("same_password").expect("Hash 2 should succeed");

        // Salted: different bytes, both verify
        assert_ne!(first, second);
        assert!(first.matches("same_password").unwrap());
        assert!(second.matches("same_password").unwrap());
    }

    #[test]
    fn test_matches_correct_and_wrong() {
        let hash = CredentialHash::set("correct_password").expect("Hash should succeed");

        assert!(hash.matches("correct_password").expect("Verify should succeed"));
        assert!(!hash.matches("wrong_password").expect("Wrong password is not an error"));
        assert!(!hash.matches("").expect("Empty password is not an error"));
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("password", "invalid_hash");
        assert!(matches!(result, Err(PasswordError::VerificationFailure(_))));
    }

    #[test]
    fn test_matches_malformed_hash() {
        let hash = CredentialHash::from_phc("$argon2id$invalid");
        assert!(matches!(
            hash.matches("password"),
            Err(PasswordError::VerificationFailure(_))
        ));
    }

    #[test]
    fn test_matches_hash_without_salt_or_output() {
        for phc in [
            "$argon2id$stub",
            "$argon2id$v=19$m=65536,t=3,p=4",
            "$argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0",
        ] {
            let hash = CredentialHash::from_phc(phc);
            assert!(
                matches!(hash.matches("password"), Err(PasswordError::VerificationFailure(_))),
                "{} should fail verification",
                phc
            );
        }
    }

    #[test]
    fn test_matches_rejects_other_algorithms() {
        let hash = CredentialHash::from_phc("$argon2i$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$aGFzaGhhc2hoYXNoaGFzaA");
        assert!(matches!(
            hash.matches("password"),
            Err(PasswordError::VerificationFailure(_))
        ));
    }

    #[test]
    fn test_verify_dummy_completes() {
        verify_dummy("anything");
        verify_dummy("");
    }

    #[test]
    fn test_unicode_roundtrip() {
        let password = "unicode-密码-パスワード";
        let hash = hash_password(password).expect("Hash should succeed");
        assert!(verify_password(password, &hash).expect("Verify should succeed"));
    }

    #[test]
    fn test_debug_is_redacted() {
        let hash = CredentialHash::set("hidden_password").unwrap();
        let rendered = format!("{:?}", hash);

        assert_eq!(rendered, "CredentialHash(<redacted>)");
        assert!(!rendered.contains("argon2"));
    }

    #[test]
    fn test_validate_password_strength() {
        assert!(validate_password_strength("eight ch").is_ok());
        assert!(validate_password_strength("S3cur3$Password").is_ok());

        let err = validate_password_strength("short").unwrap_err();
        assert!(err.contains("at least 8 characters"));

        let err = validate_password_strength(&"x".repeat(129)).unwrap_err();
        assert!(err.contains("at most 128 characters"));

        let err = validate_password_strength("         ").unwrap_err();
        assert!(err.contains("blank"));
    }
}
