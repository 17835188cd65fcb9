//! TOML configuration for the resolver, with defaults for every field.
//!
//! ```toml
//! [pipeline]
//! budget_ms = 10000
//! layers = ["exact", "fuzzy", "region", "geocode", "llm"]
//!
//! [cache]
//! backend = "file"
//!
//! [llm]
//! enabled = true
//! model = "gpt-4o-mini"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::destination::providers::DEFAULT_NOMINATIM_URL;
use crate::destination::types::{LayerKind, ResolveError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub gazetteer: GazetteerConfig,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
    pub fuzzy: FuzzyConfig,
    pub geocoding: GeocodingConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteerConfig {
    /// JSON gazetteer file; the built-in dataset is used when absent.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// File backend location; defaults to ~/.waypoint/cache.json.
    pub path: Option<PathBuf>,
    pub positive_ttl_secs: u64,
    pub negative_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            path: None,
            positive_ttl_secs: 12 * 3600,
            negative_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub budget_ms: u64,
    pub max_alternatives: usize,
    pub layers: Vec<String>,
    /// Layer 5 only runs when no candidate reached this confidence.
    pub min_usable_confidence: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            budget_ms: 10_000,
            max_alternatives: 5,
            layers: ["exact", "fuzzy", "region", "geocode", "llm"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_usable_confidence: 0.70,
        }
    }
}

impl PipelineConfig {
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    pub fn layer_kinds(&self) -> Result<Vec<LayerKind>> {
        self.layers
            .iter()
            .map(|name| {
                LayerKind::from_config_name(name)
                    .ok_or_else(|| ResolveError::Config(format!("unknown layer '{}'", name)))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Minimum similarity for a name to count as a match.
    pub floor: f64,
    pub top_n: usize,
    /// Layer 2 stops the pipeline only at or above this confidence.
    pub accept_threshold: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            floor: 0.80,
            top_n: 5,
            accept_threshold: 0.90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub radius_km: f64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: format!("WaypointResolver/{} (destination-resolver)", env!("CARGO_PKG_VERSION")),
            timeout_secs: 5,
            radius_km: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            timeout_secs: 8,
        }
    }
}

impl ResolverConfig {
    /// Load from a TOML file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_toml_str(&fs::read_to_string(p)?)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| {
            if v > 0.0 && v < 1.0 {
                Ok(())
            } else {
                Err(ResolveError::Config(format!("{} must be in (0, 1), got {}", name, v)))
            }
        };
        unit("fuzzy.floor", self.fuzzy.floor)?;
        unit("fuzzy.accept_threshold", self.fuzzy.accept_threshold)?;
        unit("pipeline.min_usable_confidence", self.pipeline.min_usable_confidence)?;

        if self.pipeline.budget_ms == 0 {
            return Err(ResolveError::Config("pipeline.budget_ms must be > 0".into()));
        }
        if self.pipeline.max_alternatives == 0 {
            return Err(ResolveError::Config("pipeline.max_alternatives must be > 0".into()));
        }
        if self.fuzzy.top_n == 0 {
            return Err(ResolveError::Config("fuzzy.top_n must be > 0".into()));
        }
        if self.geocoding.radius_km <= 0.0 {
            return Err(ResolveError::Config("geocoding.radius_km must be > 0".into()));
        }
        let kinds = self.pipeline.layer_kinds()?;
        if kinds.is_empty() {
            return Err(ResolveError::Config("pipeline.layers must not be empty".into()));
        }
        let mut unique = kinds.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != kinds.len() {
            return Err(ResolveError::Config("pipeline.layers lists a layer twice".into()));
        }
        Ok(())
    }

    /// Disable both network layers (CLI `--offline`).
    pub fn offline(mut self) -> Self {
        self.geocoding.enabled = false;
        self.llm.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = ResolverConfig::default();
        config.validate().unwrap();
        assert_eq!(config.pipeline.budget(), Duration::from_secs(10));
        assert_eq!(config.cache.positive_ttl_secs, 43_200);
        assert_eq!(config.cache.negative_ttl_secs, 3_600);
        assert_eq!(config.pipeline.layer_kinds().unwrap().len(), 5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ResolverConfig::from_toml_str(
            r#"
            [pipeline]
            budget_ms = 2500
            layers = ["exact", "fuzzy", "region"]

            [cache]
            backend = "file"
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.pipeline.budget_ms, 2500);
        assert_eq!(config.pipeline.max_alternatives, 5);
        assert_eq!(config.cache.backend, CacheBackend::File);
        assert!((config.fuzzy.floor - 0.80).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_layer_rejected() {
        let config = ResolverConfig::from_toml_str("[pipeline]\nlayers = [\"exact\", \"psychic\"]").unwrap();
        assert!(matches!(config.validate(), Err(ResolveError::Config(_))));
    }

    #[test]
    fn test_duplicate_layer_rejected() {
        let config = ResolverConfig::from_toml_str("[pipeline]\nlayers = [\"exact\", \"fuzzy\", \"exact\"]").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_floor_rejected() {
        let config = ResolverConfig::from_toml_str("[fuzzy]\nfloor = 1.0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            ResolverConfig::from_toml_str("[pipeline\nbudget_ms = "),
            Err(ResolveError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "[llm]\nenabled = true\nmodel = \"local-model\"\n").unwrap();
        let config = ResolverConfig::load(Some(file.path())).unwrap();
        assert!(config.llm.enabled);
        assert_eq!(config.llm.model, "local-model");
        assert!(config.geocoding.enabled);
    }

    #[test]
    fn test_offline_disables_network_layers() {
        let config = ResolverConfig::default().offline();
        assert!(!config.geocoding.enabled);
        assert!(!config.llm.enabled);
    }
}
