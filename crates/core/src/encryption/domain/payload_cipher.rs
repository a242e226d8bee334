use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::feature_vector::FeaturePayload;

/// Opaque, text-safe ciphertext of a [`FeaturePayload`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedBlob(String);

impl EncryptedBlob {
    pub fn new(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for EncryptedBlob {
    fn from(encoded: String) -> Self {
        Self(encoded)
    }
}

impl fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("failed to serialize feature payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to seal feature payload")]
    Seal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("blob is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("blob is truncated ({len} bytes)")]
    Truncated { len: usize },
    #[error("unsupported blob version {0}")]
    UnsupportedVersion(u8),
    #[error("blob failed authentication (tampered or encrypted under another key)")]
    Authentication,
    #[error("decrypted payload is not a feature payload: {0}")]
    Payload(String),
}

/// Domain interface for sealing feature payloads at rest.
pub trait PayloadCipher: Send + Sync {
    fn encrypt(&self, payload: &FeaturePayload) -> Result<EncryptedBlob, EncryptionError>;

    fn decrypt(&self, blob: &str) -> Result<FeaturePayload, DecryptionError>;
}
