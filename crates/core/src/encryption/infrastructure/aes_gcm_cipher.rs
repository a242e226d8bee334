use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};

use crate::encryption::domain::encryption_key::EncryptionKey;
use crate::encryption::domain::payload_cipher::{
    DecryptionError, EncryptedBlob, EncryptionError, PayloadCipher,
};
use crate::shared::feature_vector::FeaturePayload;

const BLOB_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_BLOB_LEN: usize = 1 + NONCE_LEN + TAG_LEN;

/// AES-256-GCM over the JSON payload.
///
/// Blob layout before base64: `version || nonce(12) || ciphertext || tag(16)`.
/// Every blob gets a fresh random nonce, so encrypting the same payload twice
/// yields different blobs.
#[derive(Clone)]
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    pub fn new(key: &EncryptionKey) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        Self { cipher }
    }
}

impl PayloadCipher for AesGcmCipher {
    fn encrypt(&self, payload: &FeaturePayload) -> Result<EncryptedBlob, EncryptionError> {
        let plaintext = serde_json::to_vec(payload)?;
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_ref())
            .map_err(|_| EncryptionError::Seal)?;

        let mut raw = Vec::with_capacity(1 + NONCE_LEN + sealed.len());
        raw.push(BLOB_VERSION);
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&sealed);
        Ok(EncryptedBlob::new(general_purpose::STANDARD.encode(raw)))
    }

    fn decrypt(&self, blob: &str) -> Result<FeaturePayload, DecryptionError> {
        let raw = general_purpose::STANDARD.decode(blob.trim())?;
        if raw.len() < MIN_BLOB_LEN {
            return Err(DecryptionError::Truncated { len: raw.len() });
        }
        if raw[0] != BLOB_VERSION {
            return Err(DecryptionError::UnsupportedVersion(raw[0]));
        }
        let (nonce, sealed) = raw[1..].split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| DecryptionError::Authentication)?;
        serde_json::from_slice(&plaintext).map_err(|err| DecryptionError::Payload(err.to_string()))
    }
}
