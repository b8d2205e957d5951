//
// μDCN MTU Prediction History
//
// Bounded log of every MTU decision, readable from a status surface while the
// control loop keeps appending.
//

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::ml::features::FeatureVector;

/// Default number of records kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Model output stored with each record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutput {
    pub predicted_mtu: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_prediction: Option<f64>,
}

/// One MTU decision. Serializes to the export format directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Seconds since the Unix epoch
    pub timestamp: f64,

    /// The features as supplied by the caller
    pub inputs: FeatureVector,

    pub output: PredictionOutput,

    pub is_override: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_time_ms: Option<f64>,
}

impl PredictionRecord {
    /// Create a record stamped with the current time
    pub fn new(
        inputs: FeatureVector,
        predicted_mtu: usize,
        raw_prediction: Option<f64>,
        inference_time_ms: Option<f64>,
        is_override: bool,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();

        Self {
            timestamp,
            inputs,
            output: PredictionOutput { predicted_mtu, raw_prediction },
            is_override,
            inference_time_ms,
        }
    }

    pub fn predicted_mtu(&self) -> usize {
        self.output.predicted_mtu
    }
}

/// Bounded FIFO of prediction records
#[derive(Debug)]
pub struct PredictionHistory {
    records: RwLock<VecDeque<PredictionRecord>>,
    capacity: usize,
}

impl PredictionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a record, evicting the oldest once full
    pub fn record(&self, record: PredictionRecord) {
        let mut records = self.records.write();
        if records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// The most recent `limit` records (all when `None`), oldest first
    pub fn recent(&self, limit: Option<usize>) -> Vec<PredictionRecord> {
        let records = self.records.read();
        let skip = match limit {
            Some(limit) if limit < records.len() => records.len() - limit,
            _ => 0,
        };
        records.iter().skip(skip).cloned().collect()
    }

    pub fn last(&self) -> Option<PredictionRecord> {
        self.records.read().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Write the full history to `path` as a JSON array. Returns the number
    /// of records written.
    pub fn export(&self, path: &Path) -> Result<usize> {
        // Snapshot first so no file I/O happens under the lock
        let snapshot = self.recent(None);

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writer.flush()?;

        info!(path = %path.display(), records = snapshot.len(), "exported prediction history");
        Ok(snapshot.len())
    }
}

impl Default for PredictionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
