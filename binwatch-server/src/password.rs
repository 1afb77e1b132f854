//! Argon2id password hashes stored as PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`).

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use binwatch_core::{CredentialHasher, PortError};
use rand::rngs::OsRng;
use tracing::warn;

/// [`CredentialHasher`] backed by Argon2id with a random salt per password.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, PortError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(PortError::backend)?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Unreadable password hash: {err}");
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_and_differ_per_call() {
        let hasher = Argon2Hasher::default();
        let first = hasher.hash("hunter2").expect("hashes");
        let second = hasher.hash("hunter2").expect("hashes");
        assert_ne!(first, second, "salts must differ");
        assert!(first.starts_with("$argon2id$"));
        assert!(hasher.verify("hunter2", &first));
        assert!(hasher.verify("hunter2", &second));
    }

    #[test]
    fn wrong_password_or_digest_fails() {
        let hasher = Argon2Hasher::default();
        let stored = hasher.hash("hunter2").expect("hashes");
        assert!(!hasher.verify("hunter3", &stored));
        assert!(!hasher.verify("hunter2", "no-separator"));
        assert!(!hasher.verify("hunter2", "!!$!!"));
    }
}
