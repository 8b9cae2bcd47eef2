//! Configuration for the tile engine
//!
//! Presets resolve into a flat `EngineConfig`; custom configurations can be
//! deserialized from JSON and are clamped into a usable range by `validate`.

use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineProfile {
    Balanced,
    LowMemory,
    Throughput,
    Custom(EngineConfig),
}

impl EngineProfile {
    pub fn resolve(&self) -> EngineConfig {
        match self {
            Self::Balanced => EngineConfig {
                worker_threads: 2,
                cache_size: 64,
                max_proxy_depth: 2,
                extrusion_enabled: true,
            },
            Self::LowMemory => EngineConfig {
                worker_threads: 1,
                cache_size: 16,
                max_proxy_depth: 1,
                extrusion_enabled: false,
            },
            Self::Throughput => EngineConfig {
                worker_threads: 4,
                cache_size: 256,
                max_proxy_depth: 2,
                extrusion_enabled: true,
            },
            Self::Custom(config) => config.clone().validate(),
        }
    }
}

impl Default for EngineProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of threads loading and building tiles
    pub worker_threads: usize,
    /// Tiles kept alive after leaving the view, before being dropped
    pub cache_size: usize,
    /// How many ancestor levels may stand in for a tile that is not ready (1 = parent, 2 = grandparent)
    pub max_proxy_depth: u8,
    /// Whether styles that support it should emit extruded walls
    pub extrusion_enabled: bool,
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their `Balanced` values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        Ok(config.validate())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp values into the range the engine can run with.
    pub fn validate(mut self) -> Self {
        self.worker_threads = self.worker_threads.max(1);
        self.cache_size = self.cache_size.max(1);
        self.max_proxy_depth = self.max_proxy_depth.min(2);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineProfile::default().resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_resolve() {
        assert_eq!(EngineConfig::default(), EngineProfile::Balanced.resolve());
        assert_eq!(EngineProfile::LowMemory.resolve().worker_threads, 1);
        assert!(!EngineProfile::LowMemory.resolve().extrusion_enabled);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "worker_threads": 0, "cache_size": 8 }"#).unwrap();
        assert_eq!(config.worker_threads, 1);
        assert_eq!(config.cache_size, 8);
        assert_eq!(config.max_proxy_depth, 2);
    }

    #[test]
    fn test_json_roundtrip_and_errors() {
        let config = EngineProfile::Throughput.resolve();
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
        assert!(EngineConfig::from_json("{ not json").is_err());
    }
}
