//! Server configuration

use anyhow::Result;
use serde::Deserialize;
use solubility_lib::predictor::{
    AssemblerConfig, LoadOptions, ModelSource, DEFAULT_MAX_MODEL_BYTES,
    DEFAULT_PARALLEL_THRESHOLD,
};
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Instance name attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Port for the prediction API, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Model artifact path; the bundled model is used when unset
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Largest accepted batch of SMILES per request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Batches at least this long are assembled in parallel
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    #[serde(default = "default_max_model_bytes")]
    pub max_model_bytes: usize,

    /// Refuse artifacts that carry no checksum
    #[serde(default)]
    pub require_checksum: bool,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "solubility-server".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_max_batch_size() -> usize {
    10_000
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

fn default_max_model_bytes() -> usize {
    DEFAULT_MAX_MODEL_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            model_path: None,
            max_batch_size: default_max_batch_size(),
            parallel_threshold: default_parallel_threshold(),
            max_model_bytes: default_max_model_bytes(),
            require_checksum: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `solubility` file and
    /// `SOLUBILITY_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("solubility").required(false))
            .add_source(config::Environment::with_prefix("SOLUBILITY").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn assembler_config(&self) -> AssemblerConfig {
        AssemblerConfig {
            parallel_threshold: self.parallel_threshold,
            max_batch_size: Some(self.max_batch_size),
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            max_model_bytes: self.max_model_bytes,
            require_checksum: self.require_checksum,
        }
    }

    pub fn model_source(&self) -> ModelSource {
        match &self.model_path {
            Some(path) => ModelSource::Path(path.clone()),
            None => ModelSource::bundled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.max_batch_size, 10_000);
        assert!(config.model_path.is_none());
        assert!(matches!(config.model_source(), ModelSource::Bytes(_)));
    }

    #[test]
    fn test_empty_source_uses_serde_defaults() {
        let config: ServerConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
        assert_eq!(config.assembler_config().max_batch_size, Some(10_000));
    }

    #[test]
    fn test_model_path_selects_file_source() {
        let config = ServerConfig {
            model_path: Some(PathBuf::from("/models/esol.json")),
            ..ServerConfig::default()
        };
        assert!(matches!(config.model_source(), ModelSource::Path(_)));
    }
}
