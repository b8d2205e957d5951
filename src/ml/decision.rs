//
// μDCN Decision Heuristic MTU Model
//
// Threshold heuristic: a per-network-type baseline, one condition branch,
// then the same packet-size reconciliation as the rule-based model.
//

use crate::error::Result;
use crate::ml::features::{FeatureVector, NetworkType};
use crate::ml::model::{MtuBounds, MtuPredictionModel, DEFAULT_MTU};
use crate::ml::rule_based::{reconcile_packet_size, scale, Conditions};

/// Threshold-based MTU heuristic
#[derive(Debug, Clone, Default)]
pub struct DecisionHeuristicModel {
    bounds: MtuBounds,
}

impl DecisionHeuristicModel {
    pub fn new(bounds: MtuBounds) -> Self {
        Self { bounds }
    }

    fn baseline(network_type: NetworkType) -> usize {
        match network_type {
            NetworkType::Ethernet => 1500,
            NetworkType::WiFi => 1400,
            NetworkType::Cellular => 1200,
            NetworkType::Satellite | NetworkType::Unknown => DEFAULT_MTU,
        }
    }
}

impl MtuPredictionModel for DecisionHeuristicModel {
    fn predict(&self, features: &FeatureVector) -> Result<usize> {
        let c = Conditions::from_features(features);
        let mut mtu = Self::baseline(c.network_type);

        if c.rtt_ms > 200.0 || c.loss_rate > 0.05 {
            mtu = scale(mtu, 0.8);
        } else if c.rtt_ms < 20.0 && c.loss_rate < 0.001 && c.throughput_bps > 50_000_000.0 {
            mtu = std::cmp::min(scale(mtu, 1.3), self.bounds.max);
        }

        mtu = reconcile_packet_size(mtu, c.avg_packet_size);

        Ok(self.bounds.finalize(mtu))
    }

    fn update(&mut self, _features: &FeatureVector, _observed_optimal_mtu: usize) -> Result<()> {
        Ok(())
    }

    fn model_type(&self) -> &'static str {
        "DecisionHeuristic"
    }
}
