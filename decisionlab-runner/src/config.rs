//! Service configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Values are checked once after parsing.

use std::path::{Path, PathBuf};

use decisionlab_core::features::FeatureWindows;
use decisionlab_core::schema::DEFAULT_MODEL_VERSION;
use decisionlab_core::{ConfidenceSizer, OrchestratorConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub model: ModelSection,
    pub decision: DecisionSection,
    pub cache: CacheSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Classifier artifact. Absent means rule-based predictions.
    pub path: Option<PathBuf>,
    pub version: String,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            path: None,
            version: DEFAULT_MODEL_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionSection {
    pub symbols: Vec<String>,
    pub min_observations: usize,
    pub base_fraction: Decimal,
    pub confidence_cap: f64,
    pub min_lot: Decimal,
    pub quantity_scale: u32,
    pub windows: FeatureWindows,
}

impl Default for DecisionSection {
    fn default() -> Self {
        let orchestrator = OrchestratorConfig::default();
        Self {
            symbols: orchestrator.symbols,
            min_observations: orchestrator.min_observations,
            base_fraction: orchestrator.sizer.base_fraction,
            confidence_cap: orchestrator.sizer.confidence_cap,
            min_lot: orchestrator.sizer.min_lot,
            quantity_scale: orchestrator.sizer.quantity_scale,
            windows: orchestrator.windows,
        }
    }
}

/// Where idempotency records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    Memory,
    File,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub backend: CacheBackendKind,
    /// Record directory for the `file` backend.
    pub dir: PathBuf,
    pub ttl_secs: u64,
    pub key_prefix: String,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            dir: PathBuf::from(".decisionlab-cache"),
            ttl_secs: 3600,
            key_prefix: "idempotency".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl ServiceConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load from `path` when given, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.decision;
        if d.symbols.is_empty() {
            return invalid("decision.symbols must not be empty");
        }
        if d.symbols.iter().any(|s| s.trim().is_empty()) {
            return invalid("decision.symbols contains an empty symbol");
        }
        if d.min_observations == 0 {
            return invalid("decision.min_observations must be at least 1");
        }
        if d.base_fraction <= Decimal::ZERO || d.base_fraction > Decimal::ONE {
            return invalid("decision.base_fraction must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&d.confidence_cap) {
            return invalid("decision.confidence_cap must be in [0, 1]");
        }
        if d.min_lot <= Decimal::ZERO {
            return invalid("decision.min_lot must be positive");
        }
        if d.quantity_scale > 28 {
            return invalid("decision.quantity_scale must be at most 28");
        }
        if self.model.version.trim().is_empty() {
            return invalid("model.version must not be empty");
        }
        if self.cache.ttl_secs == 0 {
            return invalid("cache.ttl_secs must be positive");
        }
        if self.cache.key_prefix.is_empty() {
            return invalid("cache.key_prefix must not be empty");
        }
        Ok(())
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let d = &self.decision;
        OrchestratorConfig {
            symbols: d.symbols.clone(),
            min_observations: d.min_observations,
            model_version: self.model.version.clone(),
            sizer: ConfidenceSizer {
                base_fraction: d.base_fraction,
                confidence_cap: d.confidence_cap,
                min_lot: d.min_lot,
                quantity_scale: d.quantity_scale,
            },
            windows: d.windows.clone(),
        }
    }
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message.to_string()))
}
