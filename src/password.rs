//! Password utilities

use argon2::Argon2;
use argon2::password_hash;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;

/// Shortest accepted password
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Generate a random secret
pub fn generate() -> String {
    SaltString::generate(&mut OsRng).to_string()
}

/// Hash a given password with a fresh salt
pub fn hash(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hashed_password| hashed_password.to_string())
}

/// Verify a given password against a given hash
///
/// A hash that can not be parsed never verifies
pub fn verify(hashed_password: &str, password: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hashed_password) else {
        tracing::warn!("Stored password hash could not be parsed");

        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
