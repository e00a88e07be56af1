//! Argon2id password hashes stored as PHC strings.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use quill_core::ports::{AuthError, PasswordService};

#[derive(Default)]
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// `Ok(false)` on a wrong password. A stored value that is not a PHC
    /// string is an error, not a mismatch.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let stored = PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashingError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted_phc() {
        let passwords = Argon2PasswordService::new();

        let first = passwords.hash("correct horse battery").unwrap();
        let second = passwords.hash("correct horse battery").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify() {
        let passwords = Argon2PasswordService::new();
        let hash = passwords.hash("correct horse battery").unwrap();

        assert!(passwords.verify("correct horse battery", &hash).unwrap());
        assert!(!passwords.verify("wrong horse battery", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_unparseable_hash() {
        assert!(matches!(
            Argon2PasswordService::new().verify("password", "not-a-phc-string"),
            Err(AuthError::HashingError(_))
        ));
    }
}
