use serde::{Deserialize, Serialize};

/// Raw-intensity face descriptor: the grayscale samples of a face crop
/// resampled to a fixed square, flattened row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<u8>);

impl FeatureVector {
    pub fn new(samples: Vec<u8>) -> Self {
        Self(samples)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

/// Plaintext sealed inside every encrypted blob: `{"features": [...]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePayload {
    pub features: FeatureVector,
}

impl FeaturePayload {
    pub fn new(features: FeatureVector) -> Self {
        Self { features }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_json_shape() {
        let payload = FeaturePayload::new(FeatureVector::new(vec![0, 17, 255]));
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"features":[0,17,255]}"#);
    }

    #[test]
    fn test_payload_rejects_out_of_range_samples() {
        assert!(serde_json::from_str::<FeaturePayload>(r#"{"features":[1,256]}"#).is_err());
        assert!(serde_json::from_str::<FeaturePayload>(r#"{"features":[1.5]}"#).is_err());
    }

    #[test]
    fn test_accessors() {
        let v = FeatureVector::new(vec![3, 4]);
        assert_eq!(v.len(), 2);
        assert!(!v.is_empty());
        assert_eq!(v.as_slice(), &[3, 4]);
        assert_eq!(v.into_inner(), vec![3, 4]);
    }
}
