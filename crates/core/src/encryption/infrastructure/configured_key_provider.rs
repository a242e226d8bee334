use std::env;
use std::sync::OnceLock;

use crate::encryption::domain::encryption_key::{EncryptionKey, KeyError};
use crate::encryption::domain::key_provider::{KeyOrigin, KeyProvider, ProvidedKey};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingKeyPolicy {
    /// Generate one key for the whole process and warn that its blobs will
    /// not survive a restart.
    #[default]
    Ephemeral,
    /// Refuse to start without a configured key.
    FailFast,
}

/// Key from configuration, falling back to an environment variable, then
/// to `policy` when neither is set.
pub struct ConfiguredKeyProvider {
    encoded: Option<String>,
    source: String,
    policy: MissingKeyPolicy,
}

impl ConfiguredKeyProvider {
    /// `source` names where the key was expected and only appears in messages.
    pub fn new(encoded: Option<String>, source: &str, policy: MissingKeyPolicy) -> Self {
        Self {
            encoded: encoded.filter(|s| !s.trim().is_empty()),
            source: source.to_string(),
            policy,
        }
    }

    /// Uses `configured` when present, otherwise the value of `env_var`.
    pub fn from_env(configured: Option<String>, env_var: &str, policy: MissingKeyPolicy) -> Self {
        let encoded = prefer_configured(configured, || env::var(env_var).ok());
        Self::new(encoded, env_var, policy)
    }
}

fn prefer_configured(
    configured: Option<String>,
    fallback: impl FnOnce() -> Option<String>,
) -> Option<String> {
    configured.filter(|s| !s.trim().is_empty()).or_else(fallback)
}

/// The ephemeral key, generated on first use and shared by every provider
/// in the process.
fn ephemeral_key(source: &str) -> EncryptionKey {
    static EPHEMERAL: OnceLock<EncryptionKey> = OnceLock::new();
    EPHEMERAL
        .get_or_init(|| {
            log::warn!(
                "No encryption key configured ({source}); using an ephemeral key. \
                 Face data encrypted in this process cannot be decrypted after it exits."
            );
            EncryptionKey::generate()
        })
        .clone()
}

impl KeyProvider for ConfiguredKeyProvider {
    fn provide(&self) -> Result<ProvidedKey, KeyError> {
        if let Some(encoded) = &self.encoded {
            let key = EncryptionKey::from_encoded(encoded)?;
            return Ok(ProvidedKey {
                key,
                origin: KeyOrigin::Configured,
            });
        }

        match self.policy {
            MissingKeyPolicy::FailFast => Err(KeyError::Missing {
                env: self.source.clone(),
            }),
            MissingKeyPolicy::Ephemeral => Ok(ProvidedKey {
                key: ephemeral_key(&self.source),
                origin: KeyOrigin::Ephemeral,
            }),
        }
    }
}
