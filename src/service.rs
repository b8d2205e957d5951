//
// μDCN MTU Prediction Service
//
// Periodic control loop around the prediction engine: samples features from
// a metrics source every tick, predicts, and hands the MTU to the transport
// control channel through a callback.
//

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::ml::features::FeatureVector;
use crate::ml::mtu_prediction::{MtuPredictionEngine, Prediction};

/// Supplies the current path conditions once per tick
pub trait FeatureSource: Send + Sync {
    fn sample(&self) -> Result<FeatureVector>;
}

impl<F> FeatureSource for F
where
    F: Fn() -> Result<FeatureVector> + Send + Sync,
{
    fn sample(&self) -> Result<FeatureVector> {
        self()
    }
}

/// Callback receiving every prediction
pub type MtuCallback = Box<dyn Fn(&Prediction) -> Result<()> + Send + Sync>;

/// Run one control-loop iteration
fn run_tick(
    engine: &MtuPredictionEngine,
    source: &dyn FeatureSource,
    last_features: &Mutex<Option<FeatureVector>>,
    callback: &MtuCallback,
) -> Option<Prediction> {
    let features = match source.sample() {
        Ok(features) => features,
        Err(e) => {
            warn!(error = %e, "failed to sample network features, skipping tick");
            return None;
        }
    };

    let prediction = engine.predict(&features);
    *last_features.lock() = Some(features);

    if let Err(e) = callback(&prediction) {
        error!(mtu = prediction.mtu, error = %e, "failed to apply predicted MTU");
    } else {
        debug!(mtu = prediction.mtu, is_override = prediction.is_override, "applied predicted MTU");
    }
    Some(prediction)
}

/// Periodic MTU prediction service
pub struct MtuPredictionService {
    engine: Arc<MtuPredictionEngine>,

    source: Arc<dyn FeatureSource>,

    /// Prediction interval
    prediction_interval: Duration,

    /// Whether the service is running
    running: Arc<RwLock<bool>>,

    /// Task handle for the prediction loop
    prediction_task: RwLock<Option<JoinHandle<()>>>,

    /// Features used for the most recent prediction
    last_features: Arc<Mutex<Option<FeatureVector>>>,
}

impl MtuPredictionService {
    pub fn new(
        engine: Arc<MtuPredictionEngine>,
        source: Arc<dyn FeatureSource>,
        prediction_interval: Duration,
    ) -> Self {
        Self {
            engine,
            source,
            prediction_interval,
            running: Arc::new(RwLock::new(false)),
            prediction_task: RwLock::new(None),
            last_features: Arc::new(Mutex::new(None)),
        }
    }

    pub fn engine(&self) -> &Arc<MtuPredictionEngine> {
        &self.engine
    }

    /// Start the prediction loop
    pub async fn start<F>(&self, update_callback: F) -> Result<()>
    where
        F: Fn(&Prediction) -> Result<()> + Send + Sync + 'static,
    {
        {
            let mut running = self.running.write().await;
            if *running {
                return Err(Error::InvalidArgument(
                    "MTU prediction service is already running".to_string(),
                ));
            }
            *running = true;
        }

        let engine = Arc::clone(&self.engine);
        let source = Arc::clone(&self.source);
        let running = Arc::clone(&self.running);
        let last_features = Arc::clone(&self.last_features);
        let callback: MtuCallback = Box::new(update_callback);
        let period = self.prediction_interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                if !*running.read().await {
                    break;
                }

                run_tick(&engine, source.as_ref(), &last_features, &callback);
            }
        });

        *self.prediction_task.write().await = Some(task);

        info!(
            model = self.engine.model_type(),
            interval_ms = period.as_millis() as u64,
            "MTU prediction service started"
        );
        Ok(())
    }

    /// Stop the prediction loop. The engine needs no cleanup.
    pub async fn stop(&self) -> Result<()> {
        *self.running.write().await = false;

        if let Some(task) = self.prediction_task.write().await.take() {
            task.abort();
            info!("MTU prediction service stopped");
        }
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Run a single iteration outside the timer
    pub fn tick<F>(&self, callback: F) -> Option<Prediction>
    where
        F: Fn(&Prediction) -> Result<()> + Send + Sync + 'static,
    {
        let callback: MtuCallback = Box::new(callback);
        run_tick(&self.engine, self.source.as_ref(), &self.last_features, &callback)
    }

    /// Report the MTU that turned out to be optimal for the most recently
    /// sampled conditions
    pub fn report_observed(&self, observed_optimal_mtu: usize) -> Result<()> {
        let features = self.last_features.lock().clone().ok_or_else(|| {
            Error::InvalidArgument("no features have been sampled yet".to_string())
        })?;
        self.engine.update(&features, observed_optimal_mtu)
    }

    /// Features used for the most recent prediction
    pub fn last_features(&self) -> Option<FeatureVector> {
        self.last_features.lock().clone()
    }
}
