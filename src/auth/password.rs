//! Password hashing with argon2 and a random per-password salt

use rand::RngCore;

use super::{AuthError, AuthResult};

const SALT_LEN: usize = 16;

/// Hash a password into an encoded argon2 string
pub fn hash_password(password: &str) -> AuthResult<String> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Check a password against an encoded hash; malformed hashes never match
pub fn verify_password(hash: &str, password: &str) -> bool {
    argon2::verify_encoded(hash, password.as_bytes()).unwrap_or(false)
}
