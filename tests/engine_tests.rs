//
// μDCN MTU Engine Tests
//
// End-to-end tests of the prediction engine across every model type.
//

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use udcn_mtu_engine::ml::decision::DecisionHeuristicModel;
use udcn_mtu_engine::ml::ensemble::EnsembleModel;
use udcn_mtu_engine::ml::linear::LinearRegressionModel;
use udcn_mtu_engine::ml::model::{round_to_100, MtuBounds, MtuPredictionModel, DEFAULT_MTU};
use udcn_mtu_engine::ml::rule_based::RuleBasedModel;
use udcn_mtu_engine::{EngineConfig, FeatureVector, ModelKind, MtuPredictionEngine, NetworkType};

fn engine_with(model: ModelKind) -> MtuPredictionEngine {
    MtuPredictionEngine::new(&EngineConfig { model, ..EngineConfig::default() })
}

fn all_model_kinds() -> Vec<ModelKind> {
    vec![
        ModelKind::RuleBased { base_mtu: 1400 },
        ModelKind::RuleBased { base_mtu: 1500 },
        ModelKind::LinearRegression { artifact: None },
        ModelKind::DecisionHeuristic,
        ModelKind::default(),
    ]
}

fn random_features(rng: &mut StdRng) -> FeatureVector {
    let network_type = match rng.gen_range(0..5) {
        1 => NetworkType::Ethernet,
        2 => NetworkType::WiFi,
        3 => NetworkType::Cellular,
        4 => NetworkType::Satellite,
        _ => NetworkType::Unknown,
    };

    let mut features = FeatureVector::new()
        .with_rtt_ms(rng.gen_range(0.0..2000.0))
        .with_throughput_bps(rng.gen_range(0.0..1e10))
        .with_loss_rate(rng.gen_range(0.0..1.0))
        .with_congestion_window(rng.gen_range(0..1000))
        .with_avg_packet_size(rng.gen_range(0..20_000))
        .with_packet_size_stddev(rng.gen_range(0.0..5000.0))
        .with_network_type(network_type)
        .with_time_of_day(rng.gen_range(0.0..24.0));

    // Drop some fields to exercise sparse input
    if rng.gen_bool(0.3) {
        features.rtt_ms = None;
    }
    if rng.gen_bool(0.3) {
        features.avg_packet_size = None;
    }
    features
}

#[test]
fn test_scenario_fast_ethernet_rule_based() {
    let features = FeatureVector::from_map([
        ("rtt_ms", 10.0),
        ("loss_rate", 0.001),
        ("throughput_bps", 5e8),
        ("avg_packet_size", 1200.0),
        ("network_type", 1.0),
    ]);

    let engine = engine_with(ModelKind::RuleBased { base_mtu: 1500 });
    assert_eq!(engine.predict(&features).mtu, 1700);
}

#[test]
fn test_scenario_poor_cellular_decision_heuristic() {
    let features = FeatureVector::from_map([
        ("rtt_ms", 250.0),
        ("loss_rate", 0.08),
        ("throughput_bps", 1e7),
        ("avg_packet_size", 900.0),
        ("network_type", 3.0),
    ]);

    let engine = engine_with(ModelKind::DecisionHeuristic);
    assert_eq!(engine.predict(&features).mtu, 1000);
}

#[test]
fn test_predictions_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(7);

    for kind in all_model_kinds() {
        let engine = engine_with(kind.clone());
        for _ in 0..300 {
            let features = random_features(&mut rng);
            let mtu = engine.predict(&features).mtu;
            assert!((576..=9000).contains(&mtu), "{} predicted {}", kind, mtu);
        }
    }
}

#[test]
fn test_empty_features_never_fail() {
    for kind in all_model_kinds() {
        let engine = engine_with(kind);
        let mtu = engine.predict(&FeatureVector::new()).mtu;
        assert!((576..=9000).contains(&mtu));
    }
}

#[test]
fn test_extreme_packet_size_never_panics() {
    let from_map = FeatureVector::from_map([("avg_packet_size", 1e20), ("network_type", 1.0)]);
    let from_json: FeatureVector = serde_json::from_str(r#"{"avg_packet_size": 1e20}"#).unwrap();

    for kind in all_model_kinds() {
        let engine = engine_with(kind.clone());
        for features in [&from_map, &from_json] {
            let mtu = engine.predict(features).mtu;
            assert!((576..=9000).contains(&mtu), "{} predicted {}", kind, mtu);
        }
    }

    // Grow branch is capped by the 5% step, not the packet size
    let engine = engine_with(ModelKind::DecisionHeuristic);
    assert_eq!(engine.predict(&from_json).mtu, 1500);
}

#[test]
fn test_heuristics_are_deterministic() {
    let mut rng = StdRng::seed_from_u64(11);
    let rule = RuleBasedModel::new(1500, MtuBounds::default());
    let decision = DecisionHeuristicModel::default();

    for _ in 0..100 {
        let features = random_features(&mut rng);
        assert_eq!(rule.predict(&features).unwrap(), rule.predict(&features).unwrap());
        assert_eq!(decision.predict(&features).unwrap(), decision.predict(&features).unwrap());
    }
}

#[test]
fn test_override_precedence() {
    let mut rng = StdRng::seed_from_u64(3);
    let engine = engine_with(ModelKind::default());

    engine.set_override(Some(1400));
    for _ in 0..50 {
        let prediction = engine.predict(&random_features(&mut rng));
        assert_eq!(prediction.mtu, 1400);
        assert!(prediction.is_override);
        assert!(prediction.raw.is_none());
    }

    engine.set_override(None);
    assert!(!engine.predict(&random_features(&mut rng)).is_override);
}

#[test]
fn test_history_keeps_most_recent_thousand() {
    let engine = engine_with(ModelKind::RuleBased { base_mtu: 1500 });

    for i in 0..1200u64 {
        let features = FeatureVector::new().with_congestion_window(i);
        engine.predict(&features);
    }

    let history = engine.history(None);
    assert_eq!(history.len(), 1000);
    let windows: Vec<u64> = history.iter().map(|r| r.inputs.congestion_window.unwrap()).collect();
    let expected: Vec<u64> = (200..1200).collect();
    assert_eq!(windows, expected);

    let recent = engine.history(Some(5));
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[4].inputs.congestion_window, Some(1199));
}

#[test]
fn test_learning_direction_through_engine() {
    let features = FeatureVector::new()
        .with_rtt_ms(40.0)
        .with_throughput_bps(4_000_000.0)
        .with_loss_rate(0.005)
        .with_avg_packet_size(1100)
        .with_network_type(NetworkType::WiFi);

    let engine = engine_with(ModelKind::LinearRegression { artifact: None });
    let mut previous = engine.predict(&features).mtu;
    for _ in 0..15 {
        engine.update(&features, 2500).unwrap();
        let mtu = engine.predict(&features).mtu;
        assert!(mtu >= previous && mtu <= 2500, "{} after {}", mtu, previous);
        previous = mtu;
    }
    assert!(previous > 1200);
}

#[test]
fn test_ensemble_law() {
    let mut rng = StdRng::seed_from_u64(19);
    let linear = LinearRegressionModel::new(MtuBounds::default());
    let decision = DecisionHeuristicModel::default();

    let samples: Vec<FeatureVector> = (0..50).map(|_| random_features(&mut rng)).collect();
    let expected: Vec<usize> = samples
        .iter()
        .map(|f| {
            let mean = (linear.predict(f).unwrap() + decision.predict(f).unwrap()) as f64 / 2.0;
            round_to_100(mean as usize).clamp(576, 9000)
        })
        .collect();

    let ensemble = EnsembleModel::new(vec![Box::new(linear), Box::new(decision)]);
    for (features, expected) in samples.iter().zip(expected) {
        assert_eq!(ensemble.predict(features).unwrap(), expected);
    }
}

#[test]
fn test_missing_artifact_serves_default() {
    let engine = engine_with(ModelKind::LinearRegression {
        artifact: Some("/nonexistent/mtu_model.json".into()),
    });

    assert!(engine.is_degraded());
    assert_eq!(engine.model_type(), "Degraded");
    let prediction = engine.predict(&FeatureVector::new().with_rtt_ms(10.0));
    assert_eq!(prediction.mtu, DEFAULT_MTU);
    assert!(engine.update(&FeatureVector::new(), 1500).is_ok());
}

#[test]
fn test_export_history_round_trip() {
    let engine = engine_with(ModelKind::RuleBased { base_mtu: 1500 });
    engine.predict(&FeatureVector::new().with_rtt_ms(10.0).with_network_type(NetworkType::WiFi));
    engine.set_override(Some(9000));
    engine.predict(&FeatureVector::new());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prediction_log.json");
    assert_eq!(engine.export_history(&path).unwrap(), 2);

    let contents = std::fs::read_to_string(&path).unwrap();
    let exported: Vec<udcn_mtu_engine::PredictionRecord> = serde_json::from_str(&contents).unwrap();
    let history = engine.history(None);
    assert_eq!(exported.len(), history.len());
    for (exported, recorded) in exported.iter().zip(history.iter()) {
        assert_eq!(exported.inputs, recorded.inputs);
        assert_eq!(exported.output.predicted_mtu, recorded.output.predicted_mtu);
        assert_eq!(exported.is_override, recorded.is_override);
    }
    assert_eq!(exported[0].inputs.network_type(), NetworkType::WiFi);
    assert_eq!(exported[1].output.predicted_mtu, 9000);
}
