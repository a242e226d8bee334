use std::fmt;

use serde::Serialize;

use crate::encryption::domain::payload_cipher::DecryptionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobSide {
    A,
    B,
}

impl fmt::Display for BlobSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobSide::A => f.write_str("A"),
            BlobSide::B => f.write_str("B"),
        }
    }
}

/// Why a comparison could not produce a similarity.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndeterminateReason {
    Decryption {
        side: BlobSide,
        #[serde(serialize_with = "display")]
        error: DecryptionError,
    },
    ZeroMagnitude { side: BlobSide },
    LengthMismatch { left: usize, right: usize },
}

fn display<S: serde::Serializer>(error: &DecryptionError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

impl fmt::Display for IndeterminateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decryption { side, error } => write!(f, "blob {side} could not be decrypted: {error}"),
            Self::ZeroMagnitude { side } => write!(f, "features of blob {side} have zero magnitude"),
            Self::LengthMismatch { left, right } => {
                write!(f, "feature lengths differ ({left} vs {right})")
            }
        }
    }
}

/// Result of comparing two faces.
///
/// `NoMatch` means the similarity was computed and fell at or below the
/// threshold; `Indeterminate` means it could not be computed at all.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    Match { similarity: f64 },
    NoMatch { similarity: f64 },
    Indeterminate { reason: IndeterminateReason },
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Match { .. })
    }

    pub fn similarity(&self) -> Option<f64> {
        match self {
            MatchOutcome::Match { similarity } | MatchOutcome::NoMatch { similarity } => {
                Some(*similarity)
            }
            MatchOutcome::Indeterminate { .. } => None,
        }
    }
}
