use crate::matching::domain::match_outcome::{BlobSide, IndeterminateReason, MatchOutcome};
use crate::shared::feature_vector::FeatureVector;

/// Cosine similarity against a strict `>` threshold.
#[derive(Clone, Copy, Debug, Default)]
pub struct CosineMatcher;

impl CosineMatcher {
    pub fn evaluate(&self, a: &FeatureVector, b: &FeatureVector, threshold: f64) -> MatchOutcome {
        match cosine_similarity(a.as_slice(), b.as_slice()) {
            Ok(similarity) if similarity > threshold => MatchOutcome::Match { similarity },
            Ok(similarity) => MatchOutcome::NoMatch { similarity },
            Err(reason) => MatchOutcome::Indeterminate { reason },
        }
    }
}

/// `dot(a, b) / sqrt(|a|² · |b|²)`, clamped to `[-1, 1]`.
///
/// Taking one square root of the product keeps `a == b` at exactly `1.0`.
pub fn cosine_similarity(a: &[u8], b: &[u8]) -> Result<f64, IndeterminateReason> {
    if a.len() != b.len() {
        return Err(IndeterminateReason::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 {
        return Err(IndeterminateReason::ZeroMagnitude { side: BlobSide::A });
    }
    if norm_b == 0.0 {
        return Err(IndeterminateReason::ZeroMagnitude { side: BlobSide::B });
    }

    Ok((dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0))
}
