//
// μDCN MTU Engine Metrics
//
// Prometheus instruments for the prediction engine. Each engine owns its own
// registry; serving it over HTTP is left to the embedding process.
//

use std::collections::HashMap;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};

use crate::error::Result;

/// Metric value type
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Counter metric
    Counter(u64),

    /// Gauge metric
    Gauge(f64),

    /// Text metric
    Text(String),
}

/// Prediction engine metrics
#[derive(Clone)]
pub struct EngineMetrics {
    registry: Registry,
    predictions: IntCounter,
    overrides: IntCounter,
    fallbacks: IntCounter,
    updates: IntCounter,
    predicted_mtu: IntGauge,
    inference_seconds: Histogram,
}

impl EngineMetrics {
    /// Create and register all instruments in a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let predictions = IntCounter::with_opts(Opts::new(
            "udcn_mtu_predictions_total",
            "MTU predictions served, including overrides",
        ))?;
        let overrides = IntCounter::with_opts(Opts::new(
            "udcn_mtu_override_predictions_total",
            "MTU predictions answered by the operator override",
        ))?;
        let fallbacks = IntCounter::with_opts(Opts::new(
            "udcn_mtu_fallback_predictions_total",
            "MTU predictions that fell back after a model failure",
        ))?;
        let updates = IntCounter::with_opts(Opts::new(
            "udcn_mtu_model_updates_total",
            "Observed optimal MTUs fed back to the model",
        ))?;
        let predicted_mtu = IntGauge::with_opts(Opts::new(
            "udcn_mtu_prediction",
            "Most recently predicted MTU",
        ))?;
        let inference_seconds = Histogram::with_opts(
            HistogramOpts::new("udcn_ml_prediction_seconds", "Time spent making MTU predictions")
                .buckets(vec![1e-6, 5e-6, 1e-5, 5e-5, 1e-4, 5e-4, 1e-3, 5e-3]),
        )?;

        registry.register(Box::new(predictions.clone()))?;
        registry.register(Box::new(overrides.clone()))?;
        registry.register(Box::new(fallbacks.clone()))?;
        registry.register(Box::new(updates.clone()))?;
        registry.register(Box::new(predicted_mtu.clone()))?;
        registry.register(Box::new(inference_seconds.clone()))?;

        Ok(Self {
            registry,
            predictions,
            overrides,
            fallbacks,
            updates,
            predicted_mtu,
            inference_seconds,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn observe_prediction(&self, mtu: usize, inference_ms: f64) {
        self.predictions.inc();
        self.predicted_mtu.set(mtu as i64);
        self.inference_seconds.observe(inference_ms / 1000.0);
    }

    pub fn observe_override(&self, mtu: u32) {
        self.predictions.inc();
        self.overrides.inc();
        self.predicted_mtu.set(mtu as i64);
    }

    pub fn observe_fallback(&self) {
        self.fallbacks.inc();
    }

    pub fn observe_update(&self) {
        self.updates.inc();
    }

    /// Prometheus text exposition of every instrument
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Flat snapshot for status reporting
    pub fn snapshot(&self) -> HashMap<String, MetricValue> {
        let mut metrics = HashMap::new();
        metrics.insert("ml.predictions".to_string(), MetricValue::Counter(self.predictions.get()));
        metrics.insert("ml.overrides".to_string(), MetricValue::Counter(self.overrides.get()));
        metrics.insert("ml.fallbacks".to_string(), MetricValue::Counter(self.fallbacks.get()));
        metrics.insert("ml.updates".to_string(), MetricValue::Counter(self.updates.get()));
        metrics.insert(
            "ml.predicted_mtu".to_string(),
            MetricValue::Gauge(self.predicted_mtu.get() as f64),
        );

        let count = self.inference_seconds.get_sample_count();
        if count > 0 {
            let avg_ms = self.inference_seconds.get_sample_sum() / count as f64 * 1000.0;
            metrics.insert("ml.avg_inference_ms".to_string(), MetricValue::Gauge(avg_ms));
        }
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_snapshot() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.observe_prediction(1500, 0.01);
        metrics.observe_override(1400);
        metrics.observe_fallback();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot["ml.predictions"], MetricValue::Counter(2));
        assert_eq!(snapshot["ml.overrides"], MetricValue::Counter(1));
        assert_eq!(snapshot["ml.fallbacks"], MetricValue::Counter(1));
        assert_eq!(snapshot["ml.predicted_mtu"], MetricValue::Gauge(1400.0));
        assert!(snapshot.contains_key("ml.avg_inference_ms"));
    }

    #[test]
    fn test_text_exposition() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.observe_prediction(9000, 0.002);

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("udcn_mtu_predictions_total 1"));
        assert!(text.contains("udcn_mtu_prediction 9000"));
    }

    #[test]
    fn test_registries_are_independent() {
        let a = EngineMetrics::new().unwrap();
        let b = EngineMetrics::new().unwrap();
        a.observe_update();
        assert_eq!(b.snapshot()["ml.updates"], MetricValue::Counter(0));
    }
}
