use std::sync::Arc;
use std::time::Instant;

use gaze_rs::SharedTracker;

use crate::config::{DeviceKind, ServerConfig};
use crate::simulated::SimulatedDevice;
use crate::traits::EyeTrackerDevice;

/// Main server state shared across all handlers
pub struct AppState {
    pub config: ServerConfig,
    pub tracker: SharedTracker,
    pub device: Option<Arc<dyn EyeTrackerDevice>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        device: Option<Arc<dyn EyeTrackerDevice>>,
    ) -> Result<Self, gaze_rs::GazeError> {
        let tracker = SharedTracker::new(config.filter)?;
        Ok(Self {
            config,
            tracker,
            device,
            start_time: Instant::now(),
        })
    }

    /// Build state with the device selected in `config`
    pub fn from_config(config: ServerConfig) -> Result<Self, gaze_rs::GazeError> {
        let device: Option<Arc<dyn EyeTrackerDevice>> = match config.device {
            DeviceKind::Simulated => Some(Arc::new(SimulatedDevice::new(config.sample_hz))),
            DeviceKind::None => None,
        };
        Self::new(config, device)
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
