use std::sync::OnceLock;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use super::AuthError;
use crate::config::SecurityConfig;

/// Argon2id hashing with a fresh salt per call.
///
/// The PHC string produced by [`PasswordHasher::hash`] embeds the salt and the
/// cost parameters, so verification keeps working after the configured costs
/// change.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash verified on logins for unknown accounts, built on first use.
    decoy: OnceLock<Option<String>>,
}

impl PasswordHasher {
    pub fn new(config: &SecurityConfig) -> anyhow::Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(Self::with_params(params))
    }

    const fn with_params(params: Params) -> Self {
        Self {
            params,
            decoy: OnceLock::new(),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {e}")))?;

        Ok(hash.to_string())
    }

    /// Returns `false` for a wrong password and for a stored hash that cannot
    /// be parsed.
    #[must_use]
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::warn!("Stored password hash is malformed");
            return false;
        };

        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Pays the same Argon2 cost as [`PasswordHasher::verify`] against a hash
    /// nobody owns. Always `false`.
    pub fn verify_decoy(&self, plaintext: &str) -> bool {
        let decoy = self
            .decoy
            .get_or_init(|| self.hash("quill-decoy-password").ok());

        if let Some(hash) = decoy {
            let _ = self.verify(plaintext, hash);
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn decoy_ready(&self) -> bool {
        matches!(self.decoy.get(), Some(Some(_)))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}
