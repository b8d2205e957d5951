// ML module for μDCN MTU prediction
//
// This module contains the feature representation, the interchangeable MTU
// prediction models and the engine that ties them to the override gate and
// the decision history.

pub mod decision;
pub mod ensemble;
pub mod features;
pub mod history;
pub mod linear;
pub mod model;
pub mod mtu_prediction;
pub mod override_gate;
pub mod rule_based;

pub use features::{FeatureField, FeatureVector, NetworkType};
pub use history::{PredictionHistory, PredictionRecord};
pub use model::{build_model, ModelKind, MtuBounds, MtuPredictionModel};
pub use mtu_prediction::{Discretization, EngineStatus, MtuPredictionEngine, Prediction};
pub use override_gate::{OverrideGate, OverrideState};
