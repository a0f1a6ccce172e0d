//! YAML configuration for docsearch.
//!
//! One file configures the embedding client, the vector store and how the two
//! fit together. Environment variables override the file, so secrets never need
//! to be written to disk.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//!
//! embedding:
//!   mode: "api"
//!   model: "intfloat/multilingual-e5-large"
//!   expected_dimension: 1024
//!   normalize: true
//!   timeout_secs: 30
//!   batch_concurrency: 4
//!
//! store: "pinecone"
//!
//! pinecone:
//!   index_name: "docs"
//!   api_version: "2024-07"
//!   dimension: 1024
//! ```
//!
//! ## Environment overrides
//!
//! | Variable | Field |
//! |---|---|
//! | `HF_API_TOKEN`, `HUGGINGFACE_API_KEY` | `embedding.api_token` |
//! | `EMBEDDING_MODEL` | `embedding.model` |
//! | `EMBEDDING_DIMENSION` | `embedding.expected_dimension` |
//! | `EMBEDDING_NORMALIZE` | `embedding.normalize` |
//! | `PINECONE_API_KEY` | `pinecone.api_key` |
//! | `PINECONE_INDEX_NAME` | `pinecone.index_name` |
//! | `PINECONE_HOST` | `pinecone.host` |

use std::fs;
use std::path::Path;

use index::PineconeConfig;
use semantic::{EmbeddingConfig, MAX_PASSAGE_BATCH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Which vector store backs the index.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Managed Pinecone index over REST.
    #[default]
    Pinecone,
    /// Process-local store. Data is lost on restart.
    Memory,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocsearchConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub store: StoreBackend,

    #[serde(default)]
    pub pinecone: PineconeConfig,
}

impl Default for DocsearchConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            embedding: EmbeddingConfig::default(),
            store: StoreBackend::default(),
            pinecone: PineconeConfig::default(),
        }
    }
}

impl DocsearchConfig {
    /// Load a YAML configuration file, then apply process environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration, then apply process environment overrides.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let mut config: DocsearchConfig = serde_yaml::from_str(yaml)?;
        config.apply_env_overrides_from(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus process environment overrides.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let mut config = Self::default();
        config.apply_env_overrides_from(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides using `lookup` as the environment. Unset or blank variables are ignored.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(token) = get("HF_API_TOKEN").or_else(|| get("HUGGINGFACE_API_KEY")) {
            self.embedding.api_token = Some(token);
        }
        if let Some(model) = get("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(raw) = get("EMBEDDING_DIMENSION") {
            let dimension = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or(ConfigLoadError::InvalidEnv {
                    name: "EMBEDDING_DIMENSION",
                    value: raw.clone(),
                })?;
            self.embedding.expected_dimension = Some(dimension);
        }
        if let Some(raw) = get("EMBEDDING_NORMALIZE") {
            self.embedding.normalize = parse_bool(&raw).ok_or(ConfigLoadError::InvalidEnv {
                name: "EMBEDDING_NORMALIZE",
                value: raw.clone(),
            })?;
        }
        if let Some(key) = get("PINECONE_API_KEY") {
            self.pinecone.api_key = Some(key);
        }
        if let Some(name) = get("PINECONE_INDEX_NAME") {
            self.pinecone.index_name = Some(name);
        }
        if let Some(host) = get("PINECONE_HOST") {
            self.pinecone.host = Some(host);
        }
        Ok(())
    }

    /// Dimension enforced on upsert: the index's own setting, else the embedding dimension.
    pub fn index_dimension(&self) -> Option<usize> {
        self.pinecone.dimension.or(self.embedding.expected_dimension)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        let embedding = &self.embedding;
        if embedding.model.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "embedding.model must not be empty".to_string(),
            ));
        }
        if embedding.expected_dimension == Some(0) {
            return Err(ConfigLoadError::Validation(
                "embedding.expected_dimension must be >= 1".to_string(),
            ));
        }
        if embedding.timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "embedding.timeout_secs must be >= 1".to_string(),
            ));
        }
        if !(1..=MAX_PASSAGE_BATCH).contains(&embedding.batch_concurrency) {
            return Err(ConfigLoadError::Validation(format!(
                "embedding.batch_concurrency must be between 1 and {MAX_PASSAGE_BATCH}"
            )));
        }
        if embedding.stub_dimension == 0 {
            return Err(ConfigLoadError::Validation(
                "embedding.stub_dimension must be >= 1".to_string(),
            ));
        }

        if self.pinecone.timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "pinecone.timeout_secs must be >= 1".to_string(),
            ));
        }
        if let (Some(index_dim), Some(embedding_dim)) =
            (self.pinecone.dimension, embedding.expected_dimension)
        {
            if index_dim != embedding_dim {
                return Err(ConfigLoadError::Validation(format!(
                    "pinecone.dimension ({index_dim}) differs from embedding.expected_dimension ({embedding_dim})"
                )));
            }
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semantic::ExtractorMode;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
embedding:
  mode: "stub"
  expected_dimension: 384
  batch_concurrency: 4
store: "memory"
pinecone:
  index_name: "docs"
"#;

        let config: DocsearchConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.embedding.mode, ExtractorMode::Stub);
        assert_eq!(config.embedding.expected_dimension, Some(384));
        assert_eq!(config.embedding.batch_concurrency, 4);
        assert!(config.embedding.normalize);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.pinecone.index_name.as_deref(), Some("docs"));
        assert_eq!(config.pinecone.api_version, "2024-07");
        assert_eq!(config.index_dimension(), Some(384));
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1.0"
store: "memory"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = DocsearchConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.store, StoreBackend::Memory);
    }

    #[test]
    fn test_default_config() {
        let config = DocsearchConfig::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.store, StoreBackend::Pinecone);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unsupported_version() {
        let config: DocsearchConfig = serde_yaml::from_str("version: \"2.0\"").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"
        ));
    }

    #[test]
    fn test_dimension_disagreement_is_rejected() {
        let yaml = r#"
version: "1"
embedding:
  expected_dimension: 768
pinecone:
  dimension: 1024
"#;
        let config: DocsearchConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("768"));
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn test_batch_concurrency_bounds() {
        let mut config = DocsearchConfig::default();
        config.embedding.batch_concurrency = 0;
        assert!(config.validate().is_err());
        config.embedding.batch_concurrency = MAX_PASSAGE_BATCH + 1;
        assert!(config.validate().is_err());
        config.embedding.batch_concurrency = MAX_PASSAGE_BATCH;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DocsearchConfig::default();
        config
            .apply_env_overrides_from(env(&[
                ("HUGGINGFACE_API_KEY", "hf_fallback"),
                ("EMBEDDING_MODEL", "intfloat/e5-base-v2"),
                ("EMBEDDING_DIMENSION", "768"),
                ("EMBEDDING_NORMALIZE", "false"),
                ("PINECONE_API_KEY", "pc-key"),
                ("PINECONE_INDEX_NAME", "docs"),
                ("PINECONE_HOST", "docs-abc.svc.pinecone.io"),
            ]))
            .unwrap();

        assert_eq!(config.embedding.api_token.as_deref(), Some("hf_fallback"));
        assert_eq!(config.embedding.model, "intfloat/e5-base-v2");
        assert_eq!(config.embedding.expected_dimension, Some(768));
        assert!(!config.embedding.normalize);
        assert!(config.pinecone.is_configured());
        assert_eq!(
            config.pinecone.host.as_deref(),
            Some("docs-abc.svc.pinecone.io")
        );
    }

    #[test]
    fn test_primary_token_wins_and_blanks_are_ignored() {
        let mut config = DocsearchConfig::default();
        config
            .apply_env_overrides_from(env(&[
                ("HF_API_TOKEN", "hf_primary"),
                ("HUGGINGFACE_API_KEY", "hf_fallback"),
                ("PINECONE_API_KEY", "   "),
            ]))
            .unwrap();
        assert_eq!(config.embedding.api_token.as_deref(), Some("hf_primary"));
        assert!(config.pinecone.api_key.is_none());
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = DocsearchConfig::default();
        let err = config
            .apply_env_overrides_from(env(&[("EMBEDDING_DIMENSION", "wide")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::InvalidEnv { name: "EMBEDDING_DIMENSION", .. }
        ));

        let err = config
            .apply_env_overrides_from(env(&[("EMBEDDING_NORMALIZE", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("EMBEDDING_NORMALIZE"));
    }
}
