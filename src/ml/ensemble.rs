//
// μDCN Ensemble MTU Model
//

use crate::error::{Error, Result};
use crate::ml::features::FeatureVector;
use crate::ml::model::{round_to_100, MtuBounds, MtuPredictionModel};

/// Averages the predictions of an ordered list of member models
pub struct EnsembleModel {
    models: Vec<Box<dyn MtuPredictionModel>>,
}

impl EnsembleModel {
    pub fn new(models: Vec<Box<dyn MtuPredictionModel>>) -> Self {
        Self { models }
    }

    /// Member model types, in order
    pub fn members(&self) -> Vec<&'static str> {
        self.models.iter().map(|m| m.model_type()).collect()
    }

    fn mean_prediction(&self, features: &FeatureVector) -> Result<f64> {
        if self.models.is_empty() {
            return Err(Error::Prediction("ensemble has no members".to_string()));
        }

        let mut total = 0usize;
        for model in &self.models {
            total += model.predict(features)?;
        }
        Ok(total as f64 / self.models.len() as f64)
    }
}

impl MtuPredictionModel for EnsembleModel {
    fn predict(&self, features: &FeatureVector) -> Result<usize> {
        let mean = self.mean_prediction(features)?;
        Ok(MtuBounds::default().clamp(round_to_100(mean as usize)))
    }

    fn raw_prediction(&self, features: &FeatureVector) -> Option<f64> {
        self.mean_prediction(features).ok()
    }

    fn update(&mut self, features: &FeatureVector, observed_optimal_mtu: usize) -> Result<()> {
        // Every member sees the sample even if an earlier one fails
        let mut first_error = None;
        for model in self.models.iter_mut() {
            if let Err(e) = model.update(features, observed_optimal_mtu) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn model_type(&self) -> &'static str {
        "Ensemble"
    }

    fn is_degraded(&self) -> bool {
        self.models.iter().any(|m| m.is_degraded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::decision::DecisionHeuristicModel;
    use crate::ml::features::NetworkType;
    use crate::ml::linear::LinearRegressionModel;
    use crate::ml::model::DegradedModel;

    struct Fixed(usize);

    impl MtuPredictionModel for Fixed {
        fn predict(&self, _features: &FeatureVector) -> Result<usize> {
            Ok(self.0)
        }

        fn update(&mut self, _features: &FeatureVector, observed: usize) -> Result<()> {
            self.0 = observed;
            Ok(())
        }

        fn model_type(&self) -> &'static str {
            "Fixed"
        }
    }

    #[test]
    fn test_mean_of_members() {
        let ensemble = EnsembleModel::new(vec![Box::new(Fixed(1500)), Box::new(Fixed(1200))]);
        // mean 1350 rounds up to 1400
        assert_eq!(ensemble.predict(&FeatureVector::new()).unwrap(), 1400);
        assert_eq!(ensemble.raw_prediction(&FeatureVector::new()), Some(1350.0));
    }

    #[test]
    fn test_matches_member_predictions() {
        let features = FeatureVector::new()
            .with_rtt_ms(35.0)
            .with_throughput_bps(10_000_000.0)
            .with_loss_rate(0.001)
            .with_avg_packet_size(1300)
            .with_network_type(NetworkType::Ethernet);

        let linear = LinearRegressionModel::new(MtuBounds::default());
        let decision = DecisionHeuristicModel::default();
        let expected_mean =
            (linear.predict(&features).unwrap() + decision.predict(&features).unwrap()) as f64 / 2.0;
        let expected = round_to_100(expected_mean as usize).clamp(576, 9000);

        let ensemble = EnsembleModel::new(vec![Box::new(linear), Box::new(decision)]);
        assert_eq!(ensemble.predict(&features).unwrap(), expected);
        assert_eq!(ensemble.members(), vec!["LinearRegression", "DecisionHeuristic"]);
    }

    #[test]
    fn test_update_fans_out() {
        let mut ensemble = EnsembleModel::new(vec![Box::new(Fixed(1500)), Box::new(Fixed(1200))]);
        ensemble.update(&FeatureVector::new(), 3000).unwrap();
        assert_eq!(ensemble.predict(&FeatureVector::new()).unwrap(), 3000);
    }

    #[test]
    fn test_degraded_member_marks_ensemble() {
        let ensemble = EnsembleModel::new(vec![
            Box::new(DegradedModel::new("missing artifact")),
            Box::new(Fixed(1600)),
        ]);
        assert!(ensemble.is_degraded());
        assert_eq!(ensemble.predict(&FeatureVector::new()).unwrap(), 1500);
    }

    #[test]
    fn test_empty_ensemble_errors() {
        let ensemble = EnsembleModel::new(Vec::new());
        assert!(ensemble.predict(&FeatureVector::new()).is_err());
    }
}
