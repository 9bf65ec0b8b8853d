use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::domain::ports::PasswordHasher;

const SALT_BYTES: usize = 16;

/// Argon2id with the crate defaults, PHC string output.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Argon2id with explicit cost parameters.
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> anyhow::Result<String> {
        let mut salt = [0u8; SALT_BYTES];
        rand::rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt).map_err(|e| anyhow::anyhow!("salt: {e}"))?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("argon2: {e}"))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
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
    fn hash_then_verify() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("s3cret!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("s3cret!", &hash));
        assert!(!hasher.verify("s3cret?", &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = Argon2Hasher::new();
        assert_ne!(hasher.hash("abcdef").unwrap(), hasher.hash("abcdef").unwrap());
    }

    #[test]
    fn hashes_from_other_params_still_verify() {
        let cheap = Argon2Hasher::with_params(Params::new(1024, 1, 1, None).unwrap());
        let hash = cheap.hash("abcdef").unwrap();
        // Parameters travel inside the PHC string
        assert!(Argon2Hasher::new().verify("abcdef", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let hasher = Argon2Hasher::new();
        assert!(!hasher.verify("abcdef", "not-a-phc-string"));
        assert!(!hasher.verify("abcdef", ""));
    }
}
