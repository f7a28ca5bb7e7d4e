//! Session configuration.
//!
//! Every field has a default matching the stock country visualisation, so a
//! config file only needs the keys it changes:
//!
//! ```json
//! { "measures": ["fertility_rate", "population"], "tiling": "slice_dice" }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::measure::{MeasureSet, ValuePolicy};
use crate::treemap::LayoutConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Measures the selector may emit.
    pub measures: MeasureSet,
    /// Measure laid out when a dataset is first loaded.
    pub initial_measure: String,
    pub value_policy: ValuePolicy,
    #[serde(flatten)]
    pub layout: LayoutConfig,
    /// How long a render binding should spend on one transition.
    pub transition_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            measures: MeasureSet::default(),
            initial_measure: "fertility_rate".to_string(),
            value_policy: ValuePolicy::Strict,
            layout: LayoutConfig::default(),
            transition_ms: 1500,
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.measures.is_empty() {
            return Err(ConfigError::Invalid {
                key: "measures",
                reason: "at least one measure is required".into(),
            });
        }
        if !self.measures.contains(&self.initial_measure) {
            return Err(ConfigError::Invalid {
                key: "initial_measure",
                reason: format!("'{}' is not one of the configured measures", self.initial_measure),
            });
        }
        let canvas = self.layout.canvas;
        if !(canvas.width.is_finite() && canvas.height.is_finite()) || canvas.width <= 0.0 || canvas.height <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "canvas",
                reason: format!("{}x{} is not a positive size", canvas.width, canvas.height),
            });
        }
        let m = self.layout.margin;
        if [m.top, m.right, m.bottom, m.left].iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::Invalid {
                key: "margin",
                reason: "margins must be finite and non-negative".into(),
            });
        }
        Ok(())
    }
}
