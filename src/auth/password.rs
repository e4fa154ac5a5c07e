use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::FormFlowError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn hash_password(password: &str) -> Result<String, FormFlowError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| FormFlowError::PasswordError(e.to_string()))
}

/// `Ok(false)` for a wrong password; `Err` only when the stored hash is
/// unreadable.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, FormFlowError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| FormFlowError::PasswordError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn check_password_strength(password: &str) -> Result<(), FormFlowError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(FormFlowError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
