use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use zeroize::Zeroizing;

pub const KEY_BYTES: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("no encryption key configured (set {env} or `encryption_key` in the config file)")]
    Missing { env: String },
    #[error("malformed encryption key: {0}")]
    Malformed(String),
}

/// 256-bit symmetric key. The bytes are wiped on drop and never printed.
#[derive(Clone)]
pub struct EncryptionKey {
    bytes: Zeroizing<[u8; KEY_BYTES]>,
}

impl EncryptionKey {
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_BYTES]);
        OsRng.fill_bytes(&mut *bytes);
        Self { bytes }
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self, KeyError> {
        if raw.len() != KEY_BYTES {
            return Err(KeyError::Malformed(format!(
                "expected {KEY_BYTES} bytes but found {}",
                raw.len()
            )));
        }
        let mut bytes = Zeroizing::new([0u8; KEY_BYTES]);
        bytes.copy_from_slice(raw);
        Ok(Self { bytes })
    }

    /// Accepts standard or URL-safe base64, with or without padding.
    /// A Fernet key string decodes to exactly 32 bytes and is accepted.
    pub fn from_encoded(encoded: &str) -> Result<Self, KeyError> {
        let trimmed = encoded.trim();
        if trimmed.is_empty() {
            return Err(KeyError::Malformed("key string is empty".into()));
        }
        let decoded = general_purpose::STANDARD
            .decode(trimmed)
            .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(trimmed))
            .or_else(|_| general_purpose::URL_SAFE.decode(trimmed))
            .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(trimmed))
            .map_err(|err| KeyError::Malformed(format!("base64 decode failed: {err}")))?;
        let decoded = Zeroizing::new(decoded);
        Self::from_bytes(&decoded)
    }

    pub fn to_encoded(&self) -> String {
        general_purpose::URL_SAFE.encode(&*self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.bytes
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}
