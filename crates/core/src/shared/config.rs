use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::detection_params::DetectionParams;
use crate::encryption::infrastructure::configured_key_provider::MissingKeyPolicy;
use crate::shared::constants::{CONFIG_PATH_ENV, DEFAULT_KEY_ENV, DEFAULT_MATCH_THRESHOLD};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// On-disk configuration. Every field is optional; unset fields take the
/// built-in defaults when resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub scale_factor: Option<f64>,
    pub min_neighbors: Option<usize>,
    pub min_size: Option<[u32; 2]>,
    pub match_threshold: Option<f64>,
    pub cascade_path: Option<PathBuf>,
    pub encryption_key: Option<String>,
    pub key_env: Option<String>,
    pub require_key: Option<bool>,
}

impl ConfigFile {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let defaults = DetectionParams::default();
        let detection = DetectionParams {
            scale_factor: self.scale_factor.unwrap_or(defaults.scale_factor),
            min_neighbors: self.min_neighbors.unwrap_or(defaults.min_neighbors),
            min_size: self
                .min_size
                .map(|[w, h]| (w, h))
                .unwrap_or(defaults.min_size),
        };
        let config = ResolvedConfig {
            detection,
            match_threshold: self.match_threshold.unwrap_or(DEFAULT_MATCH_THRESHOLD),
            cascade_path: self.cascade_path,
            encryption_key: self.encryption_key,
            key_env: self.key_env.unwrap_or_else(|| DEFAULT_KEY_ENV.to_string()),
            require_key: self.require_key.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, PartialEq)]
pub struct ResolvedConfig {
    pub detection: DetectionParams,
    pub match_threshold: f64,
    pub cascade_path: Option<PathBuf>,
    pub encryption_key: Option<String>,
    pub key_env: String,
    pub require_key: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            detection: DetectionParams::default(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            cascade_path: None,
            encryption_key: None,
            key_env: DEFAULT_KEY_ENV.to_string(),
            require_key: false,
        }
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("detection", &self.detection)
            .field("match_threshold", &self.match_threshold)
            .field("cascade_path", &self.cascade_path)
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "<redacted>"),
            )
            .field("key_env", &self.key_env)
            .field("require_key", &self.require_key)
            .finish()
    }
}

impl ResolvedConfig {
    /// Reads `explicit`, else the file named by `FACEVAULT_CONFIG`, else
    /// `<config dir>/FaceVault/config.json` if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_with(explicit, from_env, default_config_path())
    }

    fn load_with(
        explicit: Option<&Path>,
        from_env: Option<PathBuf>,
        fallback: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let path = match (explicit, from_env) {
            (Some(path), _) => Some(path.to_path_buf()),
            (None, Some(path)) => Some(path),
            (None, None) => fallback.filter(|p| p.is_file()),
        };
        match path {
            Some(path) => {
                log::debug!("Loading configuration from {}", path.display());
                ConfigFile::from_path(&path)?.resolve()
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detection
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !self.match_threshold.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "match threshold must be finite, got {}",
                self.match_threshold
            )));
        }
        if self.key_env.trim().is_empty() {
            return Err(ConfigError::Invalid("key_env must not be empty".into()));
        }
        Ok(())
    }

    pub fn missing_key_policy(&self) -> MissingKeyPolicy {
        if self.require_key {
            MissingKeyPolicy::FailFast
        } else {
            MissingKeyPolicy::Ephemeral
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("FaceVault").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn write_config(dir: &tempfile::TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_empty_file_resolves_to_defaults() {
        let resolved = ConfigFile::default().resolve().unwrap();
        assert_eq!(resolved, ResolvedConfig::default());
        assert_relative_eq!(resolved.detection.scale_factor, 1.1);
        assert_eq!(resolved.detection.min_neighbors, 5);
        assert_eq!(resolved.detection.min_size, (30, 30));
        assert_relative_eq!(resolved.match_threshold, 0.6);
        assert_eq!(resolved.key_env, "ENCRYPTION_KEY");
        assert_eq!(resolved.missing_key_policy(), MissingKeyPolicy::Ephemeral);
    }

    #[test]
    fn test_overrides_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{
                "scale_factor": 1.2,
                "min_neighbors": 3,
                "min_size": [40, 50],
                "match_threshold": 0.8,
                "cascade_path": "/models/cascade.xml",
                "key_env": "MY_KEY",
                "require_key": true
            }"#,
        );
        let resolved = ResolvedConfig::load_with(Some(&path), None, None).unwrap();
        assert_relative_eq!(resolved.detection.scale_factor, 1.2);
        assert_eq!(resolved.detection.min_neighbors, 3);
        assert_eq!(resolved.detection.min_size, (40, 50));
        assert_relative_eq!(resolved.match_threshold, 0.8);
        assert_eq!(resolved.cascade_path, Some(PathBuf::from("/models/cascade.xml")));
        assert_eq!(resolved.key_env, "MY_KEY");
        assert_eq!(resolved.missing_key_policy(), MissingKeyPolicy::FailFast);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"scale_factr": 1.2}"#);
        assert!(matches!(
            ResolvedConfig::load_with(Some(&path), None, None),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[rstest]
    #[case::scale_factor(r#"{"scale_factor": 1.0}"#)]
    #[case::min_size(r#"{"min_size": [0, 30]}"#)]
    #[case::key_env(r#"{"key_env": " "}"#)]
    fn test_invalid_values_are_rejected(#[case] json: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, json);
        assert!(matches!(
            ResolvedConfig::load_with(Some(&path), None, None),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            ResolvedConfig::load_with(Some(&missing), None, None),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_explicit_wins_over_env() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write_config(&dir, r#"{"min_neighbors": 1}"#);
        let other = dir.path().join("env.json");
        fs::write(&other, r#"{"min_neighbors": 9}"#).unwrap();
        let resolved = ResolvedConfig::load_with(Some(&explicit), Some(other), None).unwrap();
        assert_eq!(resolved.detection.min_neighbors, 1);
    }

    #[test]
    fn test_env_path_used_when_no_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"min_neighbors": 2}"#);
        let resolved = ResolvedConfig::load_with(None, Some(path), None).unwrap();
        assert_eq!(resolved.detection.min_neighbors, 2);
    }

    #[test]
    fn test_absent_fallback_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved =
            ResolvedConfig::load_with(None, None, Some(dir.path().join("config.json"))).unwrap();
        assert_eq!(resolved, ResolvedConfig::default());
    }

    #[test]
    fn test_present_fallback_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"match_threshold": 0.7}"#);
        let resolved = ResolvedConfig::load_with(None, None, Some(path)).unwrap();
        assert_relative_eq!(resolved.match_threshold, 0.7);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ResolvedConfig {
            encryption_key: Some("super-secret-value".into()),
            ..ResolvedConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret-value"));
        assert!(printed.contains("<redacted>"));
    }
}
