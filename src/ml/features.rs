//
// μDCN MTU Prediction Features
//
// Fixed-schema feature record fed to every MTU prediction model, plus the
// z-score normalization used by the learning models.
//

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of features in a normalized vector
pub const FEATURE_COUNT: usize = 8;

/// Network type hint reported by the metrics source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NetworkType {
    #[default]
    Unknown,
    Ethernet,
    WiFi,
    Cellular,
    Satellite,
}

impl NetworkType {
    /// Numeric code used in feature maps and normalization
    pub fn code(self) -> u8 {
        match self {
            NetworkType::Unknown => 0,
            NetworkType::Ethernet => 1,
            NetworkType::WiFi => 2,
            NetworkType::Cellular => 3,
            NetworkType::Satellite => 4,
        }
    }

    /// Decode a numeric code; anything unrecognised maps to `Unknown`
    pub fn from_code(code: f64) -> Self {
        match code.round() as i64 {
            1 => NetworkType::Ethernet,
            2 => NetworkType::WiFi,
            3 => NetworkType::Cellular,
            4 => NetworkType::Satellite,
            _ => NetworkType::Unknown,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkType::Unknown => "unknown",
            NetworkType::Ethernet => "ethernet",
            NetworkType::WiFi => "wifi",
            NetworkType::Cellular => "cellular",
            NetworkType::Satellite => "satellite",
        };
        f.write_str(name)
    }
}

/// The eight canonical features, in normalized-vector order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureField {
    RttMs,
    ThroughputBps,
    LossRate,
    CongestionWindow,
    AvgPacketSize,
    PacketSizeStddev,
    NetworkType,
    TimeOfDay,
}

impl FeatureField {
    /// All fields in vector order
    pub const ALL: [FeatureField; FEATURE_COUNT] = [
        FeatureField::RttMs,
        FeatureField::ThroughputBps,
        FeatureField::LossRate,
        FeatureField::CongestionWindow,
        FeatureField::AvgPacketSize,
        FeatureField::PacketSizeStddev,
        FeatureField::NetworkType,
        FeatureField::TimeOfDay,
    ];

    /// Canonical map key
    pub fn key(self) -> &'static str {
        match self {
            FeatureField::RttMs => "rtt_ms",
            FeatureField::ThroughputBps => "throughput_bps",
            FeatureField::LossRate => "loss_rate",
            FeatureField::CongestionWindow => "congestion_window",
            FeatureField::AvgPacketSize => "avg_packet_size",
            FeatureField::PacketSizeStddev => "packet_size_stddev",
            FeatureField::NetworkType => "network_type",
            FeatureField::TimeOfDay => "time_of_day",
        }
    }

    /// Resolve a map key, accepting the legacy control-plane spellings
    pub fn from_key(key: &str) -> Option<Self> {
        let field = match key {
            "rtt_ms" | "avg_rtt_ms" => FeatureField::RttMs,
            "throughput_bps" | "avg_throughput_bps" => FeatureField::ThroughputBps,
            "loss_rate" | "packet_loss_rate" => FeatureField::LossRate,
            "congestion_window" => FeatureField::CongestionWindow,
            "avg_packet_size" => FeatureField::AvgPacketSize,
            "packet_size_stddev" => FeatureField::PacketSizeStddev,
            "network_type" => FeatureField::NetworkType,
            "time_of_day" => FeatureField::TimeOfDay,
            _ => return None,
        };
        Some(field)
    }

    /// Fixed normalization mean; never re-estimated at runtime
    pub fn mean(self) -> f64 {
        match self {
            FeatureField::RttMs => 50.0,
            FeatureField::ThroughputBps => 5_000_000.0,
            FeatureField::LossRate => 0.01,
            FeatureField::CongestionWindow => 10.0,
            FeatureField::AvgPacketSize => 1200.0,
            FeatureField::PacketSizeStddev => 200.0,
            FeatureField::NetworkType => 1.5,
            FeatureField::TimeOfDay => 12.0,
        }
    }

    /// Fixed normalization standard deviation
    pub fn std_dev(self) -> f64 {
        match self {
            FeatureField::RttMs => 30.0,
            FeatureField::ThroughputBps => 3_000_000.0,
            FeatureField::LossRate => 0.02,
            FeatureField::CongestionWindow => 5.0,
            FeatureField::AvgPacketSize => 500.0,
            FeatureField::PacketSizeStddev => 100.0,
            FeatureField::NetworkType => 1.0,
            FeatureField::TimeOfDay => 7.0,
        }
    }
}

/// Measured path conditions used for MTU prediction.
///
/// Every field is optional: a metrics source may only know a subset. Absent
/// fields normalize to 0.0 and read as their normalization mean when a
/// heuristic model needs a raw value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct FeatureVector {
    /// Round-trip time in milliseconds
    pub rtt_ms: Option<f64>,

    /// Throughput in bits per second
    pub throughput_bps: Option<f64>,

    /// Packet loss rate (0.0 to 1.0)
    pub loss_rate: Option<f64>,

    /// Congestion window in packets
    pub congestion_window: Option<u64>,

    /// Average packet size in bytes
    pub avg_packet_size: Option<u64>,

    /// Standard deviation of packet sizes
    pub packet_size_stddev: Option<f64>,

    /// Network type hint
    pub network_type: Option<NetworkType>,

    /// Local time of day in hours, [0, 24)
    pub time_of_day: Option<f64>,
}

impl FeatureVector {
    /// Empty vector; every field absent
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a sparse key/value map. Unknown keys and non-finite values
    /// are skipped, never rejected.
    pub fn from_map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut features = Self::default();
        for (key, value) in entries {
            let key = key.as_ref();
            match FeatureField::from_key(key) {
                Some(field) if value.is_finite() => features.set(field, value),
                Some(_) => debug!(key, value, "ignoring non-finite feature value"),
                None => debug!(key, "ignoring unknown feature key"),
            }
        }
        features
    }

    /// Sparse map of the supplied fields, keyed by canonical name
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        FeatureField::ALL
            .iter()
            .filter_map(|&field| self.get(field).map(|value| (field.key(), value)))
            .collect()
    }

    /// Set a field from a raw numeric value, sanitising it into range
    pub fn set(&mut self, field: FeatureField, value: f64) {
        let non_negative = value.max(0.0);
        match field {
            FeatureField::RttMs => self.rtt_ms = Some(non_negative),
            FeatureField::ThroughputBps => self.throughput_bps = Some(non_negative),
            FeatureField::LossRate => self.loss_rate = Some(value.clamp(0.0, 1.0)),
            FeatureField::CongestionWindow => {
                self.congestion_window = Some(non_negative.round() as u64)
            }
            FeatureField::AvgPacketSize => self.avg_packet_size = Some(non_negative.round() as u64),
            FeatureField::PacketSizeStddev => self.packet_size_stddev = Some(non_negative),
            FeatureField::NetworkType => self.network_type = Some(NetworkType::from_code(value)),
            FeatureField::TimeOfDay => self.time_of_day = Some(value.rem_euclid(24.0)),
        }
    }

    /// Raw value of a field, if supplied
    pub fn get(&self, field: FeatureField) -> Option<f64> {
        match field {
            FeatureField::RttMs => self.rtt_ms,
            FeatureField::ThroughputBps => self.throughput_bps,
            FeatureField::LossRate => self.loss_rate,
            FeatureField::CongestionWindow => self.congestion_window.map(|v| v as f64),
            FeatureField::AvgPacketSize => self.avg_packet_size.map(|v| v as f64),
            FeatureField::PacketSizeStddev => self.packet_size_stddev,
            FeatureField::NetworkType => self.network_type.map(|t| t.code() as f64),
            FeatureField::TimeOfDay => self.time_of_day,
        }
    }

    /// Raw value of a field, or its normalization mean when absent
    pub fn value_or_neutral(&self, field: FeatureField) -> f64 {
        self.get(field).unwrap_or_else(|| field.mean())
    }

    /// Network type, `Unknown` when absent
    pub fn network_type(&self) -> NetworkType {
        self.network_type.unwrap_or_default()
    }

    /// Z-score normalize into the fixed 8-element order
    pub fn normalize(&self) -> [f64; FEATURE_COUNT] {
        let mut normalized = [0.0; FEATURE_COUNT];
        for (slot, field) in normalized.iter_mut().zip(FeatureField::ALL) {
            if let Some(value) = self.get(field) {
                *slot = (value - field.mean()) / field.std_dev();
            }
        }
        normalized
    }

    pub fn with_rtt_ms(mut self, rtt_ms: f64) -> Self {
        self.set(FeatureField::RttMs, rtt_ms);
        self
    }

    pub fn with_throughput_bps(mut self, throughput_bps: f64) -> Self {
        self.set(FeatureField::ThroughputBps, throughput_bps);
        self
    }

    pub fn with_loss_rate(mut self, loss_rate: f64) -> Self {
        self.set(FeatureField::LossRate, loss_rate);
        self
    }

    pub fn with_congestion_window(mut self, congestion_window: u64) -> Self {
        self.congestion_window = Some(congestion_window);
        self
    }

    pub fn with_avg_packet_size(mut self, avg_packet_size: u64) -> Self {
        self.avg_packet_size = Some(avg_packet_size);
        self
    }

    pub fn with_packet_size_stddev(mut self, stddev: f64) -> Self {
        self.set(FeatureField::PacketSizeStddev, stddev);
        self
    }

    pub fn with_network_type(mut self, network_type: NetworkType) -> Self {
        self.network_type = Some(network_type);
        self
    }

    pub fn with_time_of_day(mut self, hours: f64) -> Self {
        self.set(FeatureField::TimeOfDay, hours);
        self
    }
}

impl From<HashMap<String, f64>> for FeatureVector {
    fn from(map: HashMap<String, f64>) -> Self {
        Self::from_map(map)
    }
}

impl From<FeatureVector> for BTreeMap<String, f64> {
    fn from(features: FeatureVector) -> Self {
        features
            .to_map()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}
