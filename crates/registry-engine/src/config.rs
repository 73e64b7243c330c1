//! Engine configuration, loadable from TOML.

use std::path::Path;
use std::time::Duration;

use registry_layout::LayoutOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Fill-grey band treated as watermark ink, exclusive bounds.
    pub watermark_grey_min: f32,
    pub watermark_grey_max: f32,
    /// A stroke is a strike-through when red exceeds this
    pub strike_red_min: f32,
    /// and green/blue stay below this.
    pub strike_other_max: f32,
    /// Below this many extracted chars the document is treated as scanned.
    pub min_text_chars: usize,
    /// Per-document parse budget in seconds.
    pub timeout_secs: u64,
    /// Parser version used when the caller does not pin one.
    pub default_version: String,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            watermark_grey_min: 0.5,
            watermark_grey_max: 1.0,
            strike_red_min: 0.7,
            strike_other_max: 0.3,
            min_text_chars: 200,
            timeout_secs: 30,
            default_version: "1.0.0".to_string(),
        }
    }
}

impl ParseConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(ConfigError::Toml)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            watermark_grey_min: self.watermark_grey_min,
            watermark_grey_max: self.watermark_grey_max,
            strike_red_min: self.strike_red_min,
            strike_other_max: self.strike_other_max,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(String, #[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    Toml(#[source] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let cfg = ParseConfig::default();
        assert_eq!(cfg.min_text_chars, 200);
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.default_version, "1.0.0");
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let cfg = ParseConfig::from_toml_str("timeout_secs = 5\nstrike_red_min = 0.8\n").unwrap();
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.strike_red_min, 0.8);
        assert_eq!(cfg.min_text_chars, 200);
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let cfg = ParseConfig::default();
        let raw = toml::to_string(&cfg).unwrap();
        assert_eq!(ParseConfig::from_toml_str(&raw).unwrap(), cfg);
    }

    #[test]
    fn test_bad_toml_rejected() {
        assert!(ParseConfig::from_toml_str("timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn test_layout_options_mirror_thresholds() {
        let cfg = ParseConfig {
            watermark_grey_min: 0.4,
            ..ParseConfig::default()
        };
        assert_eq!(cfg.layout_options().watermark_grey_min, 0.4);
    }
}
