//
// μDCN MTU Engine Benchmarks
//

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use udcn_mtu_engine::{EngineConfig, FeatureVector, ModelKind, MtuPredictionEngine, NetworkType};

fn features() -> FeatureVector {
    FeatureVector::new()
        .with_rtt_ms(35.0)
        .with_throughput_bps(10_000_000.0)
        .with_loss_rate(0.001)
        .with_congestion_window(15)
        .with_avg_packet_size(1300)
        .with_packet_size_stddev(150.0)
        .with_network_type(NetworkType::Ethernet)
        .with_time_of_day(14.0)
}

fn bench_predict(c: &mut Criterion) {
    let features = features();
    for (name, model) in [
        ("predict_rule_based", ModelKind::RuleBased { base_mtu: 1500 }),
        ("predict_decision", ModelKind::DecisionHeuristic),
        ("predict_ensemble", ModelKind::default()),
    ] {
        let engine = MtuPredictionEngine::new(&EngineConfig { model, ..EngineConfig::default() });
        c.bench_function(name, |b| b.iter(|| engine.predict(black_box(&features))));
    }
}

fn bench_update(c: &mut Criterion) {
    let features = features();
    let config = EngineConfig {
        model: ModelKind::LinearRegression { artifact: None },
        ..EngineConfig::default()
    };
    let engine = MtuPredictionEngine::new(&config);

    // Fill the replay window so every iteration replays the full 50 samples
    for _ in 0..50 {
        let _ = engine.update(&features, 1600);
    }
    c.bench_function("update_linear_replay", |b| {
        b.iter(|| engine.update(black_box(&features), black_box(1600)))
    });
}

criterion_group!(benches, bench_predict, bench_update);
criterion_main!(benches);
