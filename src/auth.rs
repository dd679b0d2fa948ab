//! Password hashing and verification (Argon2id, PHC strings).

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};

use crate::error::ApiError;

pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

/// A stored hash that does not parse counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
  match PasswordHash::new(hash) {
    Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
    Err(e) => {
      tracing::warn!(target: "algebra_tutor", error = %e, "Stored password hash is not a PHC string");
      false
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_and_verify() {
    let hash = hash_password("x^2 - 1").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("x^2 - 1", &hash));
    assert!(!verify_password("x^2 + 1", &hash));
  }

  #[test]
  fn salts_differ() {
    assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
  }

  #[test]
  fn garbage_hash_never_verifies() {
    assert!(!verify_password("anything", "not-a-phc-string"));
  }
}
