//
// μDCN Online Linear Regression MTU Model
//
// Linear model over the normalized feature vector that keeps learning from
// observed optimal MTUs reported by the control plane.
//

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ml::features::{FeatureVector, FEATURE_COUNT};
use crate::ml::model::{round_to_100, MtuBounds, MtuPredictionModel};

/// Bias plus one weight per feature
pub const WEIGHT_COUNT: usize = FEATURE_COUNT + 1;

/// Maximum number of buffered training samples
pub const MAX_TRAINING_SAMPLES: usize = 1000;

/// Number of most recent samples replayed on every update
pub const REPLAY_WINDOW: usize = 50;

/// Default learning rate
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Initial weights: [bias, rtt, throughput, loss, cwnd, avg_size, stddev, net_type, time]
pub const INITIAL_WEIGHTS: [f64; WEIGHT_COUNT] =
    [1200.0, -100.0, 50.0, -200.0, 30.0, 0.8, -20.0, 0.0, 0.0];

/// On-disk weights artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub weights: Vec<f64>,

    #[serde(default)]
    pub learning_rate: Option<f64>,
}

/// Online linear regression MTU model
#[derive(Debug, Clone)]
pub struct LinearRegressionModel {
    weights: [f64; WEIGHT_COUNT],
    learning_rate: f64,
    bounds: MtuBounds,
    training_data: VecDeque<(FeatureVector, usize)>,
}

/// Bias term followed by the normalized features
fn input_vector(features: &FeatureVector) -> [f64; WEIGHT_COUNT] {
    let mut x = [0.0; WEIGHT_COUNT];
    x[0] = 1.0;
    x[1..].copy_from_slice(&features.normalize());
    x
}

fn dot(weights: &[f64; WEIGHT_COUNT], x: &[f64; WEIGHT_COUNT]) -> f64 {
    weights.iter().zip(x.iter()).map(|(w, v)| w * v).sum()
}

impl LinearRegressionModel {
    /// Model with the built-in initial weights
    pub fn new(bounds: MtuBounds) -> Self {
        Self::with_weights(INITIAL_WEIGHTS, DEFAULT_LEARNING_RATE, bounds)
    }

    pub fn with_weights(weights: [f64; WEIGHT_COUNT], learning_rate: f64, bounds: MtuBounds) -> Self {
        Self {
            weights,
            learning_rate,
            bounds,
            training_data: VecDeque::with_capacity(MAX_TRAINING_SAMPLES),
        }
    }

    /// Load weights from a JSON artifact
    pub fn from_artifact(path: &Path, bounds: MtuBounds) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::ModelArtifact(format!("{}: {}", path.display(), e)))?;
        let artifact: LinearArtifact = serde_json::from_str(&contents)
            .map_err(|e| Error::ModelArtifact(format!("{}: {}", path.display(), e)))?;

        let weights: [f64; WEIGHT_COUNT] = artifact.weights.as_slice().try_into().map_err(|_| {
            Error::ModelArtifact(format!(
                "expected {} weights, found {}",
                WEIGHT_COUNT,
                artifact.weights.len()
            ))
        })?;
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::ModelArtifact("non-finite weight in artifact".to_string()));
        }

        let learning_rate = artifact.learning_rate.unwrap_or(DEFAULT_LEARNING_RATE);
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(Error::ModelArtifact(format!("invalid learning rate {}", learning_rate)));
        }

        debug!(artifact = %path.display(), learning_rate, "loaded linear model weights");
        Ok(Self::with_weights(weights, learning_rate, bounds))
    }

    pub fn weights(&self) -> &[f64; WEIGHT_COUNT] {
        &self.weights
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of buffered training samples
    pub fn sample_count(&self) -> usize {
        self.training_data.len()
    }

    fn push_sample(&mut self, features: &FeatureVector, target: usize) {
        if self.training_data.len() >= MAX_TRAINING_SAMPLES {
            self.training_data.pop_front();
        }
        self.training_data.push_back((features.clone(), target));
    }
}

impl MtuPredictionModel for LinearRegressionModel {
    fn predict(&self, features: &FeatureVector) -> Result<usize> {
        let raw = dot(&self.weights, &input_vector(features));
        if !raw.is_finite() {
            return Err(Error::Prediction(format!("linear model produced {}", raw)));
        }

        let bounded = raw.clamp(self.bounds.min as f64, self.bounds.max as f64);
        Ok(round_to_100(bounded as usize))
    }

    fn raw_prediction(&self, features: &FeatureVector) -> Option<f64> {
        let raw = dot(&self.weights, &input_vector(features));
        raw.is_finite().then_some(raw)
    }

    /// Buffer the sample, then take one gradient step for each of the most
    /// recent `REPLAY_WINDOW` buffered samples, oldest first.
    fn update(&mut self, features: &FeatureVector, observed_optimal_mtu: usize) -> Result<()> {
        self.push_sample(features, observed_optimal_mtu);

        let replay = std::cmp::min(REPLAY_WINDOW, self.training_data.len());
        let start = self.training_data.len() - replay;
        let mut weights = self.weights;

        for (sample, target) in self.training_data.range(start..) {
            let x = input_vector(sample);
            let error = *target as f64 - dot(&weights, &x);
            for (w, v) in weights.iter_mut().zip(x.iter()) {
                *w += self.learning_rate * error * v;
            }
        }

        if weights.iter().any(|w| !w.is_finite()) {
            warn!(samples = replay, "linear model diverged, restoring initial weights");
            self.weights = INITIAL_WEIGHTS;
            return Err(Error::Prediction("linear model weights diverged".to_string()));
        }

        self.weights = weights;
        debug!(samples = replay, weights = ?self.weights, "updated linear model weights");
        Ok(())
    }

    fn model_type(&self) -> &'static str {
        "LinearRegression"
    }
}
