use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::{auth::errors::AuthError, config::HashConfig};

/// Salted argon2id hashing. Salt and cost parameters travel inside the
/// PHC string, so verification needs nothing but the digest.
#[derive(Clone)]
pub struct PasswordCodec {
    argon2: Argon2<'static>,
}

impl PasswordCodec {
    pub fn new(cfg: HashConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                AuthError::internal(e)
            })?
            .to_string();
        Ok(hash)
    }

    /// Malformed digests count as a mismatch.
    pub fn verify(&self, hash: &str, plain: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "argon2 parse hash error");
                return false;
            }
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
pub(crate) fn cheap_codec() -> PasswordCodec {
    PasswordCodec::new(HashConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .expect("cheap params are valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let codec = cheap_codec();
        let password = "Secur3P@ssw0rd!";
        let hash = codec.hash(password).expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(codec.verify(&hash, password));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let codec = cheap_codec();
        let hash = codec
            .hash("correct-horse-battery-staple")
            .expect("hashing should succeed");
        assert!(!codec.verify(&hash, "wrong-password"));
    }

    #[test]
    fn verify_is_false_on_malformed_hash() {
        let codec = cheap_codec();
        assert!(!codec.verify("not-a-valid-hash", "anything"));
        assert!(!codec.verify("", "anything"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let codec = cheap_codec();
        let a = codec.hash("pw").unwrap();
        let b = codec.hash("pw").unwrap();
        assert_ne!(a, b);
        assert!(codec.verify(&a, "pw") && codec.verify(&b, "pw"));
    }

    #[test]
    fn digest_from_other_cost_still_verifies() {
        let strong = PasswordCodec::new(HashConfig {
            memory_kib: 128,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let hash = strong.hash("pw").unwrap();
        assert!(cheap_codec().verify(&hash, "pw"));
    }

    #[test]
    fn rejects_invalid_params() {
        let err = PasswordCodec::new(HashConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(err.is_err());
    }
}
