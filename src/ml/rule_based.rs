//
// μDCN Rule-Based MTU Model
//
// Deterministic multiplicative rule pipeline. Each rule scales the running
// MTU, not the base, so the order of the rules matters.
//

use tracing::trace;

use crate::error::Result;
use crate::ml::features::{FeatureField, FeatureVector, NetworkType};
use crate::ml::model::{MtuBounds, MtuPredictionModel};

/// Scale an MTU by a factor, truncating back to whole bytes
pub(crate) fn scale(mtu: usize, factor: f64) -> usize {
    (mtu as f64 * factor) as usize
}

/// Reconcile the running MTU with the observed average packet size
pub(crate) fn reconcile_packet_size(mtu: usize, avg_packet_size: usize) -> usize {
    if avg_packet_size > mtu {
        // Most packets are larger than the current MTU: grow it
        std::cmp::min(scale(mtu, 1.05), avg_packet_size.saturating_add(100))
    } else if avg_packet_size < mtu / 2 {
        // Most packets are much smaller: shrink it
        scale(mtu, 0.95)
    } else {
        mtu
    }
}

/// Raw link conditions the heuristic models branch on
#[derive(Debug, Clone, Copy)]
pub(crate) struct Conditions {
    pub rtt_ms: f64,
    pub loss_rate: f64,
    pub throughput_bps: f64,
    pub avg_packet_size: usize,
    pub network_type: NetworkType,
}

impl Conditions {
    pub fn from_features(features: &FeatureVector) -> Self {
        Self {
            rtt_ms: features.value_or_neutral(FeatureField::RttMs),
            loss_rate: features.value_or_neutral(FeatureField::LossRate),
            throughput_bps: features.value_or_neutral(FeatureField::ThroughputBps),
            avg_packet_size: features.value_or_neutral(FeatureField::AvgPacketSize) as usize,
            network_type: features.network_type(),
        }
    }
}

/// Simple rule-based MTU prediction model
#[derive(Debug, Clone)]
pub struct RuleBasedModel {
    /// Base MTU
    base_mtu: usize,

    /// Output bounds
    bounds: MtuBounds,
}

impl RuleBasedModel {
    /// Create a new rule-based model
    pub fn new(base_mtu: usize, bounds: MtuBounds) -> Self {
        Self { base_mtu, bounds }
    }

    pub fn base_mtu(&self) -> usize {
        self.base_mtu
    }
}

impl MtuPredictionModel for RuleBasedModel {
    fn predict(&self, features: &FeatureVector) -> Result<usize> {
        let c = Conditions::from_features(features);
        let mut predicted_mtu = self.base_mtu;

        // Decrease MTU when RTT is high or packet loss exists
        if c.rtt_ms > 100.0 || c.loss_rate > 0.01 {
            predicted_mtu = scale(predicted_mtu, 0.9);
        }

        // Decrease further with very high RTT or high packet loss
        if c.rtt_ms > 200.0 || c.loss_rate > 0.05 {
            predicted_mtu = scale(predicted_mtu, 0.9);
        }

        // Increase MTU when throughput is high and packet loss is low
        if c.throughput_bps > 5_000_000.0 && c.loss_rate < 0.005 {
            predicted_mtu = scale(predicted_mtu, 1.1);
        }

        predicted_mtu = reconcile_packet_size(predicted_mtu, c.avg_packet_size);

        predicted_mtu = match c.network_type {
            NetworkType::WiFi => scale(predicted_mtu, 0.95),
            NetworkType::Cellular => scale(predicted_mtu, 0.85),
            NetworkType::Ethernet | NetworkType::Satellite | NetworkType::Unknown => predicted_mtu,
        };

        let predicted_mtu = self.bounds.finalize(predicted_mtu);
        trace!(predicted_mtu, "rule-based prediction");
        Ok(predicted_mtu)
    }

    fn update(&mut self, _features: &FeatureVector, _observed_optimal_mtu: usize) -> Result<()> {
        Ok(())
    }

    fn model_type(&self) -> &'static str {
        "RuleBased"
    }
}
