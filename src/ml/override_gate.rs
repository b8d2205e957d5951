//
// μDCN MTU Override Gate
//
// Operator-supplied fixed MTU that preempts every prediction model.
//

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

use crate::ml::model::{MAX_MTU, MIN_MTU};

/// Current override setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrideState {
    #[default]
    Disabled,
    Enabled(u32),
}

impl OverrideState {
    pub fn value(&self) -> Option<u32> {
        match self {
            OverrideState::Disabled => None,
            OverrideState::Enabled(value) => Some(*value),
        }
    }
}

impl From<Option<u32>> for OverrideState {
    fn from(value: Option<u32>) -> Self {
        value.map_or(OverrideState::Disabled, OverrideState::Enabled)
    }
}

/// Thread-safe holder for the override setting
#[derive(Debug, Default)]
pub struct OverrideGate {
    state: RwLock<OverrideState>,
}

impl OverrideGate {
    pub fn new(initial: OverrideState) -> Self {
        Self { state: RwLock::new(initial) }
    }

    /// Enable (`Some`) or disable (`None`) the override.
    ///
    /// Values outside the valid MTU range are accepted with a warning rather
    /// than rejected.
    pub fn set(&self, value: Option<u32>) {
        if let Some(mtu) = value {
            if (mtu as usize) < MIN_MTU || (mtu as usize) > MAX_MTU {
                warn!(
                    mtu,
                    min = MIN_MTU,
                    max = MAX_MTU,
                    "MTU override value is outside valid range"
                );
            }
        }

        *self.state.write() = OverrideState::from(value);
        match value {
            Some(mtu) => info!(mtu, "MTU prediction override set"),
            None => info!("MTU prediction override disabled"),
        }
    }

    pub fn state(&self) -> OverrideState {
        *self.state.read()
    }

    /// Hold the override steady while a prediction is computed and recorded
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, OverrideState> {
        self.state.read()
    }
}
