use crate::encryption::domain::payload_cipher::PayloadCipher;
use crate::matching::domain::cosine_matcher::CosineMatcher;
use crate::matching::domain::match_outcome::{BlobSide, IndeterminateReason, MatchOutcome};

/// Opens both blobs with `cipher` and compares the features inside.
///
/// A blob that fails to open makes the outcome indeterminate; it is never
/// an error.
pub fn evaluate_sealed(
    cipher: &dyn PayloadCipher,
    blob_a: &str,
    blob_b: &str,
    threshold: f64,
) -> MatchOutcome {
    let open = |side: BlobSide, blob: &str| {
        cipher
            .decrypt(blob)
            .map(|payload| payload.features)
            .map_err(|error| MatchOutcome::Indeterminate {
                reason: IndeterminateReason::Decryption { side, error },
            })
    };
    let a = match open(BlobSide::A, blob_a) {
        Ok(features) => features,
        Err(outcome) => return outcome,
    };
    let b = match open(BlobSide::B, blob_b) {
        Ok(features) => features,
        Err(outcome) => return outcome,
    };
    CosineMatcher.evaluate(&a, &b, threshold)
}

/// `true` only for a definite match; an indeterminate comparison is
/// logged and reported as `false`.
pub fn compare_sealed(cipher: &dyn PayloadCipher, blob_a: &str, blob_b: &str, threshold: f64) -> bool {
    let outcome = evaluate_sealed(cipher, blob_a, blob_b, threshold);
    if let MatchOutcome::Indeterminate { reason } = &outcome {
        log::warn!("Face comparison indeterminate: {reason}");
    }
    outcome.is_match()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::domain::encryption_key::{EncryptionKey, KEY_BYTES};
    use crate::encryption::domain::payload_cipher::DecryptionError;
    use crate::encryption::infrastructure::aes_gcm_cipher::AesGcmCipher;
    use crate::shared::feature_vector::{FeaturePayload, FeatureVector};

    fn cipher() -> AesGcmCipher {
        AesGcmCipher::new(&EncryptionKey::from_bytes(&[3u8; KEY_BYTES]).unwrap())
    }

    fn seal(cipher: &AesGcmCipher, samples: &[u8]) -> String {
        cipher
            .encrypt(&FeaturePayload::new(FeatureVector::new(samples.to_vec())))
            .unwrap()
            .into_string()
    }

    #[test]
    fn test_matching_blobs() {
        let c = cipher();
        let a = seal(&c, &[1, 2, 3, 4]);
        let b = seal(&c, &[2, 4, 6, 8]);
        assert!(evaluate_sealed(&c, &a, &b, 0.6).is_match());
    }

    #[test]
    fn test_first_failing_side_is_reported() {
        let c = cipher();
        assert_eq!(
            evaluate_sealed(&c, "", "", 0.6),
            MatchOutcome::Indeterminate {
                reason: IndeterminateReason::Decryption {
                    side: BlobSide::A,
                    error: DecryptionError::Truncated { len: 0 },
                }
            }
        );
    }

    #[test]
    fn test_length_mismatch_passes_through() {
        let c = cipher();
        let a = seal(&c, &[1, 2, 3]);
        let b = seal(&c, &[1, 2]);
        assert_eq!(
            evaluate_sealed(&c, &a, &b, 0.6),
            MatchOutcome::Indeterminate {
                reason: IndeterminateReason::LengthMismatch { left: 3, right: 2 }
            }
        );
    }

    #[test]
    fn test_compare_sealed_reduces_to_bool() {
        let c = cipher();
        let a = seal(&c, &[1, 2, 3, 4]);
        let b = seal(&c, &[4, 0, 0, 1]);
        assert!(compare_sealed(&c, &a, &a, 0.6));
        assert!(!compare_sealed(&c, &a, &b, 0.9));
        assert!(!compare_sealed(&c, &a, "not a blob", 0.0));
        assert!(!compare_sealed(&c, &seal(&c, &[0, 0, 0, 0]), &a, -1.0));
    }
}
