use crate::encryption::domain::encryption_key::{EncryptionKey, KeyError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Supplied by configuration; blobs stay readable across restarts.
    Configured,
    /// Generated for this process only; blobs die with it.
    Ephemeral,
}

#[derive(Clone, Debug)]
pub struct ProvidedKey {
    pub key: EncryptionKey,
    pub origin: KeyOrigin,
}

/// Domain interface for obtaining the process-wide encryption key.
///
/// Called once when the pipeline is built; the cipher holds the key after that.
pub trait KeyProvider {
    fn provide(&self) -> Result<ProvidedKey, KeyError>;
}

/// Hands out a key fixed at construction.
pub struct StaticKeyProvider {
    key: EncryptionKey,
}

impl StaticKeyProvider {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }
}

impl KeyProvider for StaticKeyProvider {
    fn provide(&self) -> Result<ProvidedKey, KeyError> {
        Ok(ProvidedKey {
            key: self.key.clone(),
            origin: KeyOrigin::Configured,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::domain::encryption_key::KEY_BYTES;

    #[test]
    fn test_static_provider_returns_injected_key() {
        let key = EncryptionKey::from_bytes(&[7u8; KEY_BYTES]).unwrap();
        let provided = StaticKeyProvider::new(key).provide().unwrap();
        assert_eq!(provided.key.as_bytes(), &[7u8; KEY_BYTES]);
        assert_eq!(provided.origin, KeyOrigin::Configured);
    }
}
