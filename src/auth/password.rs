//! Password hashing: Argon2id, constant-time verification,
//! dummy-hash-on-unknown-user so login latency and error shape don't
//! leak whether a username exists.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;

/// A valid hash of a fixed dummy password, computed once at startup, so
/// the unknown-user login path still does an Argon2 verification of
/// comparable cost to a real one.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| hash_password("idleduelist-dummy-password").expect("dummy hash computes"));

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// Always performs a real Argon2 verification, even when `stored_hash`
/// is `None`, so the unknown-user branch costs the same as a wrong
/// password.
pub fn verify_or_dummy(password: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(hash) => verify_password(password, hash),
        None => {
            verify_password(password, &DUMMY_HASH);
            false
        }
    }
}
