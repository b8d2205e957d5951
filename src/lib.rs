//
// μDCN Adaptive MTU Engine
//
// This library predicts the MTU for a μDCN transport session from live path
// measurements so the control plane can retune the data plane without
// operator intervention.
//

// Module organization
pub mod error;   // Error types
pub mod metrics; // Prometheus metrics collection
pub mod ml;      // Features, prediction models and the prediction engine
pub mod service; // Periodic prediction loop

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ml::model::{MtuBounds, DEFAULT_MTU, MAX_MTU, MIN_MTU};

// Export core types from modules
pub use crate::error::{Error, Result};
pub use crate::metrics::{EngineMetrics, MetricValue};
pub use crate::ml::{
    Discretization, FeatureVector, ModelKind, MtuPredictionEngine, NetworkType, Prediction,
    PredictionRecord,
};
pub use crate::service::{FeatureSource, MtuPredictionService};

/// Configuration for the MTU prediction engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prediction model to run
    pub model: ModelKind,

    /// Minimum MTU for ML prediction
    pub min_mtu: usize,

    /// Maximum MTU for ML prediction
    pub max_mtu: usize,

    /// MTU served when a model fails and nothing better is known
    pub default_mtu: usize,

    /// Number of prediction records kept
    pub history_capacity: usize,

    /// ML prediction interval in milliseconds
    pub prediction_interval_ms: u64,

    /// How model output is snapped before being returned
    pub discretization: Discretization,

    /// Override to apply at startup
    pub initial_override: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            min_mtu: MIN_MTU, // IPv4 minimum MTU
            max_mtu: MAX_MTU, // Jumbo frame size
            default_mtu: DEFAULT_MTU,
            history_capacity: 1000,
            prediction_interval_ms: 30_000,
            discretization: Discretization::default(),
            initial_override: None,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_mtu < MIN_MTU || self.max_mtu > MAX_MTU {
            return Err(Error::Config(format!(
                "MTU bounds {}-{} must lie within {}-{}",
                self.min_mtu, self.max_mtu, MIN_MTU, MAX_MTU
            )));
        }
        if self.min_mtu > self.max_mtu {
            return Err(Error::Config(format!(
                "min_mtu {} exceeds max_mtu {}",
                self.min_mtu, self.max_mtu
            )));
        }
        if !(self.min_mtu..=self.max_mtu).contains(&self.default_mtu) {
            return Err(Error::Config(format!(
                "default_mtu {} is outside {}-{}",
                self.default_mtu, self.min_mtu, self.max_mtu
            )));
        }
        if self.history_capacity == 0 {
            return Err(Error::Config("history_capacity must be positive".to_string()));
        }
        if self.prediction_interval_ms == 0 {
            return Err(Error::Config("prediction_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn bounds(&self) -> MtuBounds {
        MtuBounds::new(self.min_mtu, self.max_mtu)
    }
}
