//! services/api/src/adapters/password.rs
//!
//! Argon2id implementation of the `PasswordService` port.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lucid_lists_core::ports::{PasswordService, PortError, PortResult};
use tracing::error;

/// Hashes with a fresh random salt per password; hashes are stored in PHC string form.
#[derive(Default, Clone)]
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash_password(&self, password: &str) -> PortResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                PortError::Unexpected("failed to hash password".to_string())
            })
    }

    fn verify_password(&self, password: &str, password_hash: &str) -> PortResult<bool> {
        let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            PortError::Unexpected("stored password hash is unreadable".to_string())
        })?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let service = Argon2PasswordService::new();
        let hash = service.hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(service.verify_password("correct horse", &hash).unwrap());
        assert!(!service.verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let service = Argon2PasswordService::new();
        let a = service.hash_password("secret-pass").unwrap();
        let b = service.hash_password("secret-pass").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_is_an_error_not_a_mismatch() {
        let service = Argon2PasswordService::new();
        assert!(matches!(
            service.verify_password("x", "not-a-phc-string"),
            Err(PortError::Unexpected(_))
        ));
    }
}
