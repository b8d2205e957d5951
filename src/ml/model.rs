//
// μDCN MTU Prediction Model Interface
//
// Common contract for all MTU prediction strategies, the MTU bounds they
// share, and the factory that turns a configured `ModelKind` into a live
// model.
//

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::ml::decision::DecisionHeuristicModel;
use crate::ml::ensemble::EnsembleModel;
use crate::ml::features::FeatureVector;
use crate::ml::linear::LinearRegressionModel;
use crate::ml::rule_based::RuleBasedModel;

/// Smallest MTU ever returned (IPv4 minimum)
pub const MIN_MTU: usize = 576;

/// Largest MTU ever returned (jumbo frames)
pub const MAX_MTU: usize = 9000;

/// MTU served when no model can produce a prediction
pub const DEFAULT_MTU: usize = 1400;

/// Round to the nearest multiple of 100, halves rounding up
pub fn round_to_100(mtu: usize) -> usize {
    ((mtu + 50) / 100) * 100
}

/// Inclusive MTU range a model clamps its output into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MtuBounds {
    pub min: usize,
    pub max: usize,
}

impl MtuBounds {
    /// Create bounds, forced inside [`MIN_MTU`, `MAX_MTU`] with `min <= max`
    pub fn new(min: usize, max: usize) -> Self {
        let min = min.clamp(MIN_MTU, MAX_MTU);
        let max = max.clamp(min, MAX_MTU);
        Self { min, max }
    }

    pub fn clamp(&self, mtu: usize) -> usize {
        mtu.clamp(self.min, self.max)
    }

    /// Clamp, then round to the nearest 100
    pub fn finalize(&self, mtu: usize) -> usize {
        round_to_100(self.clamp(mtu))
    }
}

impl Default for MtuBounds {
    fn default() -> Self {
        Self { min: MIN_MTU, max: MAX_MTU }
    }
}

/// ML-based MTU prediction model interface
pub trait MtuPredictionModel: Send + Sync {
    /// Predict optimal MTU based on network features
    fn predict(&self, features: &FeatureVector) -> Result<usize>;

    /// Continuous prediction before bounding and rounding, for models that have one
    fn raw_prediction(&self, _features: &FeatureVector) -> Option<f64> {
        None
    }

    /// Update the model with an observed optimal MTU
    fn update(&mut self, features: &FeatureVector, observed_optimal_mtu: usize) -> Result<()>;

    /// Get model type name
    fn model_type(&self) -> &'static str;

    /// Whether the model is serving a fixed fallback instead of real predictions
    fn is_degraded(&self) -> bool {
        false
    }
}

fn default_base_mtu() -> usize {
    1500
}

/// Which prediction strategy an engine runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelKind {
    /// Sequential multiplicative rule pipeline
    RuleBased {
        #[serde(default = "default_base_mtu")]
        base_mtu: usize,
    },

    /// Online linear regression, optionally seeded from a weights artifact
    LinearRegression {
        #[serde(default)]
        artifact: Option<PathBuf>,
    },

    /// Threshold heuristic keyed on network type
    DecisionHeuristic,

    /// Mean of several member strategies
    Ensemble {
        #[serde(default = "ModelKind::default_ensemble_members")]
        members: Vec<ModelKind>,
    },
}

impl ModelKind {
    /// Default ensemble membership. RuleBased is intentionally absent; it has
    /// not been signed off as an ensemble member.
    pub fn default_ensemble_members() -> Vec<ModelKind> {
        vec![
            ModelKind::LinearRegression { artifact: None },
            ModelKind::DecisionHeuristic,
        ]
    }
}

impl Default for ModelKind {
    fn default() -> Self {
        ModelKind::Ensemble { members: Self::default_ensemble_members() }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::RuleBased { base_mtu } => write!(f, "rule-based(base={})", base_mtu),
            ModelKind::LinearRegression { artifact: Some(path) } => {
                write!(f, "linear({})", path.display())
            }
            ModelKind::LinearRegression { artifact: None } => f.write_str("linear"),
            ModelKind::DecisionHeuristic => f.write_str("decision"),
            ModelKind::Ensemble { members } => write!(f, "ensemble({} members)", members.len()),
        }
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rule-based" | "rule_based" => Ok(ModelKind::RuleBased { base_mtu: default_base_mtu() }),
            "linear" | "linear-regression" => Ok(ModelKind::LinearRegression { artifact: None }),
            "decision" | "decision-heuristic" | "decision-tree" => Ok(ModelKind::DecisionHeuristic),
            "ensemble" => Ok(ModelKind::default()),
            other => Err(Error::Config(format!("unknown model type '{}'", other))),
        }
    }
}

/// Placeholder model used when the configured model could not be built.
/// Always serves [`DEFAULT_MTU`].
#[derive(Debug, Clone)]
pub struct DegradedModel {
    reason: String,
}

impl DegradedModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    /// Why the real model is unavailable
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl MtuPredictionModel for DegradedModel {
    fn predict(&self, _features: &FeatureVector) -> Result<usize> {
        Ok(DEFAULT_MTU)
    }

    fn update(&mut self, _features: &FeatureVector, _observed_optimal_mtu: usize) -> Result<()> {
        Ok(())
    }

    fn model_type(&self) -> &'static str {
        "Degraded"
    }

    fn is_degraded(&self) -> bool {
        true
    }
}

/// Build a model from its configured kind. Never fails: a model whose
/// artifact cannot be loaded is replaced by a [`DegradedModel`].
pub fn build_model(kind: &ModelKind, bounds: MtuBounds) -> Box<dyn MtuPredictionModel> {
    let model: Box<dyn MtuPredictionModel> = match kind {
        ModelKind::RuleBased { base_mtu } => Box::new(RuleBasedModel::new(*base_mtu, bounds)),
        ModelKind::LinearRegression { artifact: None } => {
            Box::new(LinearRegressionModel::new(bounds))
        }
        ModelKind::LinearRegression { artifact: Some(path) } => {
            match LinearRegressionModel::from_artifact(path, bounds) {
                Ok(model) => Box::new(model),
                Err(e) => {
                    error!(artifact = %path.display(), error = %e, "failed to load linear model");
                    warn!(default_mtu = DEFAULT_MTU, "serving default MTU from degraded model");
                    Box::new(DegradedModel::new(e.to_string()))
                }
            }
        }
        ModelKind::DecisionHeuristic => Box::new(DecisionHeuristicModel::new(bounds)),
        ModelKind::Ensemble { members } => {
            let members = if members.is_empty() {
                warn!("ensemble configured without members, using defaults");
                ModelKind::default_ensemble_members()
            } else {
                members.clone()
            };
            let models = members.iter().map(|member| build_model(member, bounds)).collect();
            Box::new(EnsembleModel::new(models))
        }
    };

    info!(model = model.model_type(), degraded = model.is_degraded(), "built MTU prediction model");
    model
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_100() {
        assert_eq!(round_to_100(1650), 1700);
        assert_eq!(round_to_100(1649), 1600);
        assert_eq!(round_to_100(960), 1000);
        assert_eq!(round_to_100(576), 600);
        assert_eq!(round_to_100(9000), 9000);
    }

    #[test]
    fn test_bounds_are_sanitised() {
        let bounds = MtuBounds::new(100, 20_000);
        assert_eq!(bounds, MtuBounds::default());

        let inverted = MtuBounds::new(2000, 1000);
        assert_eq!(inverted.min, 2000);
        assert_eq!(inverted.max, 2000);
    }

    #[test]
    fn test_model_kind_from_str() {
        assert_eq!(
            "rule-based".parse::<ModelKind>().unwrap(),
            ModelKind::RuleBased { base_mtu: 1500 }
        );
        assert_eq!("decision".parse::<ModelKind>().unwrap(), ModelKind::DecisionHeuristic);
        assert_eq!("ensemble".parse::<ModelKind>().unwrap(), ModelKind::default());
        assert!("tflite".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_model_kind_deserialize() {
        let kind: ModelKind = serde_json::from_str(r#"{"type": "rule_based"}"#).unwrap();
        assert_eq!(kind, ModelKind::RuleBased { base_mtu: 1500 });

        let kind: ModelKind = serde_json::from_str(r#"{"type": "ensemble"}"#).unwrap();
        assert_eq!(kind, ModelKind::default());
    }

    #[test]
    fn test_missing_artifact_degrades() {
        let kind = ModelKind::LinearRegression {
            artifact: Some(PathBuf::from("/nonexistent/udcn/mtu_weights.json")),
        };
        let model = build_model(&kind, MtuBounds::default());

        assert!(model.is_degraded());
        assert_eq!(model.predict(&FeatureVector::new()).unwrap(), DEFAULT_MTU);
    }

    #[test]
    fn test_empty_ensemble_uses_default_members() {
        let model = build_model(&ModelKind::Ensemble { members: vec![] }, MtuBounds::default());
        assert_eq!(model.model_type(), "Ensemble");
        assert!(!model.is_degraded());
    }
}
