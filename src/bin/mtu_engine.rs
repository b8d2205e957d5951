//
// μDCN MTU Engine: stand-alone MTU prediction loop
//
// Runs the prediction service against a feature file (re-read every tick)
// or a synthetic metrics source, logging each MTU decision.
//

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::Rng;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use udcn_mtu_engine::ml::features::{FeatureVector, NetworkType};
use udcn_mtu_engine::{
    EngineConfig, FeatureSource, ModelKind, MtuPredictionEngine, MtuPredictionService, Prediction,
};

/// μDCN MTU Engine: adaptive MTU prediction for the transport control plane
#[derive(Parser, Debug)]
#[command(name = "udcn-mtu")]
struct Opt {
    /// JSON engine configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model type (rule-based, linear, decision, ensemble); overrides the config file
    #[arg(short, long)]
    model: Option<ModelKind>,

    /// JSON feature map re-read on every tick; synthetic conditions when absent
    #[arg(short, long)]
    features: Option<PathBuf>,

    /// Prediction interval in milliseconds; overrides the config file
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Fixed MTU override applied at startup
    #[arg(long)]
    override_mtu: Option<u32>,

    /// Write the prediction history here on shutdown
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// Reads the feature map from disk on every sample
struct FileFeatureSource {
    path: PathBuf,
}

impl FeatureSource for FileFeatureSource {
    fn sample(&self) -> udcn_mtu_engine::Result<FeatureVector> {
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Jittered conditions around a typical wired path
struct SyntheticFeatureSource;

impl FeatureSource for SyntheticFeatureSource {
    fn sample(&self) -> udcn_mtu_engine::Result<FeatureVector> {
        let mut rng = rand::thread_rng();
        Ok(FeatureVector::new()
            .with_rtt_ms(rng.gen_range(5.0..250.0))
            .with_throughput_bps(rng.gen_range(1e6..1e9))
            .with_loss_rate(rng.gen_range(0.0..0.08))
            .with_congestion_window(rng.gen_range(4..40))
            .with_avg_packet_size(rng.gen_range(400..1600))
            .with_packet_size_stddev(rng.gen_range(50.0..400.0))
            .with_network_type(NetworkType::Ethernet))
    }
}

fn load_config(opt: &Opt) -> anyhow::Result<EngineConfig> {
    let mut config = match &opt.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(model) = &opt.model {
        config.model = model.clone();
    }
    if let Some(interval_ms) = opt.interval_ms {
        config.prediction_interval_ms = interval_ms;
    }
    if opt.override_mtu.is_some() {
        config.initial_override = opt.override_mtu;
    }
    config.validate()?;
    Ok(config)
}

/// Main entry point
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let opt = Opt::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if opt.debug { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("μDCN MTU engine starting up");

    let config = load_config(&opt)?;
    info!("Configuration: {:?}", config);

    let engine = Arc::new(MtuPredictionEngine::new(&config));
    let source: Arc<dyn FeatureSource> = match &opt.features {
        Some(path) => Arc::new(FileFeatureSource { path: path.clone() }),
        None => Arc::new(SyntheticFeatureSource),
    };

    let service = MtuPredictionService::new(
        Arc::clone(&engine),
        source,
        Duration::from_millis(config.prediction_interval_ms),
    );
    service
        .start(|prediction: &Prediction| {
            info!(
                mtu = prediction.mtu,
                raw = ?prediction.raw,
                inference_time_ms = prediction.inference_time_ms,
                is_override = prediction.is_override,
                "MTU decision"
            );
            Ok(())
        })
        .await?;

    info!("Press Ctrl+C to exit");

    // Wait for Ctrl+C
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutting down μDCN MTU engine"),
        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
    }

    service.stop().await?;

    if let Some(path) = &opt.export {
        let written = engine
            .export_history(path)
            .with_context(|| format!("failed to export history to {}", path.display()))?;
        info!(records = written, path = %path.display(), "prediction history exported");
    }

    Ok(())
}
