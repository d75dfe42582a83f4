use std::sync::Arc;

use parking_lot::RwLock;

use crate::aggregator::{FilterConfig, SampleAggregator};
use crate::error::Result;
use crate::types::{EyeTrackerState, RawDualEyeSample, UserPositionSample};

/// Cloneable handle to one [`SampleAggregator`] shared between the device
/// callback context (writer) and any number of output streams (readers).
///
/// Writers hold the lock for one filter step; readers copy the whole state
/// out under the read lock, so a snapshot never mixes two updates.
#[derive(Clone)]
pub struct SharedTracker {
    inner: Arc<RwLock<SampleAggregator>>,
}

impl SharedTracker {
    pub fn new(config: FilterConfig) -> Result<Self> {
        Ok(Self::from_aggregator(SampleAggregator::new(config)?))
    }

    pub fn from_aggregator(aggregator: SampleAggregator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(aggregator)),
        }
    }

    pub fn on_raw_sample(&self, sample: &RawDualEyeSample) {
        self.inner.write().on_raw_sample(sample);
    }

    pub fn on_raw_sample_at(&self, arrival: f64, sample: &RawDualEyeSample) {
        self.inner.write().on_raw_sample_at(arrival, sample);
    }

    pub fn on_user_position_sample(&self, sample: &UserPositionSample) {
        self.inner.write().on_user_position_sample(sample);
    }

    pub fn read_state(&self) -> EyeTrackerState {
        self.inner.read().read_state()
    }

    pub fn reset(&self) {
        self.inner.write().reset();
    }
}

impl Default for SharedTracker {
    fn default() -> Self {
        Self::from_aggregator(SampleAggregator::default())
    }
}
