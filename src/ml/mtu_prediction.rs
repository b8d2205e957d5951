//
// μDCN MTU Prediction Engine
//
// Composition root for MTU prediction: the operator override gate, the
// configured prediction model and the bounded decision history. Driven by a
// periodic control loop; safe to read from a status surface concurrently.
//

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::metrics::{EngineMetrics, MetricValue};
use crate::ml::features::FeatureVector;
use crate::ml::history::{PredictionHistory, PredictionRecord};
use crate::ml::model::{build_model, MtuBounds, MtuPredictionModel, MAX_MTU, MIN_MTU};
use crate::ml::override_gate::{OverrideGate, OverrideState};
use crate::EngineConfig;

/// Common MTU sizes used by `Discretization::StandardSizes`
pub const STANDARD_MTUS: [usize; 6] = [576, 1280, 1400, 1500, 3000, 9000];

/// How a model's output is snapped before it is returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discretization {
    /// Keep the model's own nearest-100 output
    #[default]
    Nearest100,

    /// Snap the continuous prediction to a common MTU size
    StandardSizes,
}

impl Discretization {
    fn apply(self, mtu: usize, raw: Option<f64>, bounds: MtuBounds) -> usize {
        match self {
            Discretization::Nearest100 => mtu,
            Discretization::StandardSizes => {
                snap_within(snap_to_standard(raw.unwrap_or(mtu as f64)), bounds)
            }
        }
    }
}

/// Move a standard size that falls outside `bounds` to the nearest standard
/// size inside them, or clamp when no standard size fits
fn snap_within(snapped: usize, bounds: MtuBounds) -> usize {
    let mut inside = STANDARD_MTUS.iter().copied().filter(|&s| s >= bounds.min && s <= bounds.max);
    let nearest = if snapped > bounds.max {
        inside.last()
    } else if snapped < bounds.min {
        inside.next()
    } else {
        return snapped;
    };
    nearest.unwrap_or_else(|| bounds.clamp(snapped))
}

/// Snap a continuous MTU to the nearest common size band
pub fn snap_to_standard(raw: f64) -> usize {
    if raw < 800.0 {
        576 // Minimum safe MTU
    } else if raw < 1300.0 {
        1280 // IPv6 minimum
    } else if raw < 1450.0 {
        1400
    } else if raw < 1550.0 {
        1500 // Standard Ethernet
    } else if raw < 4000.0 {
        3000 // Jumbo frames
    } else {
        9000
    }
}

/// Result of a single prediction
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// MTU to apply to the transport session
    pub mtu: usize,

    /// Continuous model output, when the model has one
    pub raw: Option<f64>,

    /// Time spent in the model; zero for overrides
    pub inference_time_ms: f64,

    pub is_override: bool,
}

/// Consistent view of the engine for status reporting
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub override_state: OverrideState,
    pub model_type: &'static str,
    pub degraded: bool,
    pub history_len: usize,
    pub last_record: Option<PredictionRecord>,
}

/// Adaptive MTU prediction engine
pub struct MtuPredictionEngine {
    /// Active prediction model
    model: RwLock<Box<dyn MtuPredictionModel>>,

    /// Operator override, checked before any model runs
    override_gate: OverrideGate,

    /// Decision log
    history: PredictionHistory,

    /// Last MTU a model produced successfully
    last_good: Mutex<Option<usize>>,

    bounds: MtuBounds,
    default_mtu: usize,
    discretization: Discretization,
    metrics: Option<EngineMetrics>,
}

impl MtuPredictionEngine {
    /// Create an engine running the model named in `config`
    pub fn new(config: &EngineConfig) -> Self {
        let model = build_model(&config.model, config.bounds());
        Self::with_model(config, model)
    }

    /// Create an engine around an already-built model
    pub fn with_model(config: &EngineConfig, model: Box<dyn MtuPredictionModel>) -> Self {
        let metrics = match EngineMetrics::new() {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!(error = %e, "MTU engine metrics unavailable");
                None
            }
        };

        let bounds = config.bounds();
        let engine = Self {
            model: RwLock::new(model),
            override_gate: OverrideGate::new(OverrideState::from(config.initial_override)),
            history: PredictionHistory::new(config.history_capacity),
            last_good: Mutex::new(None),
            bounds,
            default_mtu: bounds.clamp(config.default_mtu),
            discretization: config.discretization,
            metrics,
        };

        info!(
            model = engine.model_type(),
            min_mtu = bounds.min,
            max_mtu = bounds.max,
            history_capacity = engine.history.capacity(),
            "MTU prediction engine ready"
        );
        engine
    }

    /// Predict the MTU for the given conditions.
    ///
    /// Never fails: a model error falls back to the last good prediction or
    /// the default MTU. Exactly one history record is appended per call, and
    /// the override cannot change between the decision and its record.
    pub fn predict(&self, features: &FeatureVector) -> Prediction {
        let gate = self.override_gate.read();

        if let OverrideState::Enabled(value) = *gate {
            self.history
                .record(PredictionRecord::new(features.clone(), value as usize, None, None, true));
            if let Some(metrics) = &self.metrics {
                metrics.observe_override(value);
            }
            debug!(mtu = value, "MTU override applied");

            return Prediction {
                mtu: value as usize,
                raw: None,
                inference_time_ms: 0.0,
                is_override: true,
            };
        }

        let start = Instant::now();
        let outcome = {
            let model = self.model.read();
            model
                .predict(features)
                .map(|mtu| (mtu, model.raw_prediction(features)))
        };
        let inference_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        let (mtu, raw) = match outcome {
            Ok((mtu, raw)) => {
                let mtu = self.discretization.apply(mtu, raw, self.bounds);
                let mtu = self.enforce_range(mtu);
                *self.last_good.lock() = Some(mtu);
                (mtu, raw)
            }
            Err(e) => {
                let fallback = self.last_good.lock().unwrap_or(self.default_mtu);
                error!(error = %e, fallback_mtu = fallback, "MTU prediction failed, using fallback");
                if let Some(metrics) = &self.metrics {
                    metrics.observe_fallback();
                }
                (fallback, None)
            }
        };

        self.history.record(PredictionRecord::new(
            features.clone(),
            mtu,
            raw,
            Some(inference_time_ms),
            false,
        ));
        drop(gate);

        if let Some(metrics) = &self.metrics {
            metrics.observe_prediction(mtu, inference_time_ms);
        }
        debug!(mtu, raw = ?raw, inference_time_ms, "MTU predicted");

        Prediction { mtu, raw, inference_time_ms, is_override: false }
    }

    /// Feed an observed optimal MTU back to the model
    pub fn update(&self, features: &FeatureVector, observed_optimal_mtu: usize) -> Result<()> {
        if !(MIN_MTU..=MAX_MTU).contains(&observed_optimal_mtu) {
            warn!(observed_optimal_mtu, "ignoring observed MTU outside valid range");
            return Err(Error::InvalidArgument(format!(
                "observed MTU {} is outside valid range ({}-{})",
                observed_optimal_mtu, MIN_MTU, MAX_MTU
            )));
        }

        let result = self.model.write().update(features, observed_optimal_mtu);
        match &result {
            Ok(()) => {
                if let Some(metrics) = &self.metrics {
                    metrics.observe_update();
                }
                debug!(observed_optimal_mtu, "MTU model updated");
            }
            Err(e) => error!(error = %e, "failed to update MTU model"),
        }
        result
    }

    /// Set an override value for the MTU prediction, or clear it with `None`
    pub fn set_override(&self, mtu_value: Option<u32>) {
        self.override_gate.set(mtu_value);
    }

    /// Get the current override value
    pub fn override_value(&self) -> Option<u32> {
        self.override_gate.state().value()
    }

    /// Most recent `limit` records (all when `None`), oldest first
    pub fn history(&self, limit: Option<usize>) -> Vec<PredictionRecord> {
        self.history.recent(limit)
    }

    /// Write the full history to `path` as a JSON array
    pub fn export_history(&self, path: &Path) -> Result<usize> {
        self.history.export(path)
    }

    pub fn model_type(&self) -> &'static str {
        self.model.read().model_type()
    }

    pub fn is_degraded(&self) -> bool {
        self.model.read().is_degraded()
    }

    pub fn bounds(&self) -> MtuBounds {
        self.bounds
    }

    /// Snapshot taken while predictions are held off, so the override and
    /// the last record always agree
    pub fn status(&self) -> EngineStatus {
        let gate = self.override_gate.read();
        let model = self.model.read();
        EngineStatus {
            override_state: *gate,
            model_type: model.model_type(),
            degraded: model.is_degraded(),
            history_len: self.history.len(),
            last_record: self.history.last(),
        }
    }

    pub fn metrics(&self) -> Option<&EngineMetrics> {
        self.metrics.as_ref()
    }

    /// Flat metrics map for status reporting
    pub fn get_metrics(&self) -> HashMap<String, MetricValue> {
        let mut metrics = self.metrics.as_ref().map(EngineMetrics::snapshot).unwrap_or_default();
        metrics.insert("ml.model_type".to_string(), MetricValue::Text(self.model_type().to_string()));
        metrics.insert(
            "ml.override".to_string(),
            MetricValue::Text(
                self.override_value().map_or_else(|| "disabled".to_string(), |v| v.to_string()),
            ),
        );
        metrics
    }

    fn enforce_range(&self, mtu: usize) -> usize {
        let bounded = self.bounds.clamp(mtu);
        if bounded != mtu {
            warn!(mtu, bounded, "model produced MTU outside valid range");
        }
        bounded
    }
}

impl Default for MtuPredictionEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
