use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use std::sync::LazyLock;

use crate::error::{AppError, Result};

// Verified against when a login names an unknown email.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("dms-dummy-password-never-assigned").ok());

/// Hashes a password with Argon2id into a PHC string (salt included).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

/// Checks `password` against a stored PHC hash. A hash that doesn't parse never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Runs one full verification against a fixed hash and always returns `false`.
///
/// Login calls this for unknown emails, so that path costs the same Argon2 work as a
/// wrong password for a known one.
pub fn verify_unknown_user(password: &str) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    false
}
