//! Password hashing and credential checks.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use crate::identity::{Principal, Role};
use crate::storage::SharedStore;

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

/// Check a password against a stored value. Values that are not PHC strings
/// (rows edited by hand) are compared as plaintext.
pub fn verify_password(stored: &str, password: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => !stored.is_empty() && stored == password,
    }
}

/// Argon2 on the blocking pool so request threads stay free.
pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// Look up `email` in the role's table and return the principal for the
/// first row whose password verifies. The store lock covers only the read.
pub async fn authenticate(store: &SharedStore, role: Role, email: &str, password: &str) -> Result<Option<Principal>> {
    let rows = store.0.lock().credentials_for(role, email)?;
    if rows.is_empty() {
        return Ok(None);
    }
    let password = password.to_string();
    let verified = tokio::task::spawn_blocking(move || rows.iter().any(|(_id, stored)| verify_password(stored, &password))).await?;
    Ok(verified.then(|| Principal::new(role, email)))
}
