use async_trait::async_trait;
use gaze_rs::{GazePoint, SharedTracker};
use serde::{Deserialize, Serialize};

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors reported by an eye tracker
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The call is not allowed in the device's current mode, e.g. entering
    /// calibration twice.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Device disconnected: {0}")]
    Disconnected(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Outcome of a calibration step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    Success,
    Failure,
}

/// Gaze recorded for both eyes while the user looked at a calibration target
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub left: GazePoint,
    pub right: GazePoint,
}

impl CalibrationSample {
    pub fn is_valid(&self) -> bool {
        self.left.is_valid() && self.right.is_valid()
    }
}

/// One calibration target and the samples collected for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub position: GazePoint,
    pub samples: Vec<CalibrationSample>,
}

impl CalibrationPoint {
    /// Whether the device ended up with no usable samples for this target.
    pub fn needs_recollection(&self) -> bool {
        !self.samples.iter().any(CalibrationSample::is_valid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub status: CalibrationStatus,
    pub points: Vec<CalibrationPoint>,
}

/// Eye tracker hardware as seen by the server.
///
/// Implementations deliver gaze and user-position samples to the tracker
/// handed to [`subscribe`](EyeTrackerDevice::subscribe) from their own
/// callback context until [`unsubscribe`](EyeTrackerDevice::unsubscribe).
/// Calibration calls follow the vendor workflow: enter calibration mode,
/// collect a sample per target, compute and apply, leave calibration mode.
#[async_trait]
pub trait EyeTrackerDevice: Send + Sync {
    /// Human-readable device name
    fn name(&self) -> &str;

    /// Start delivering samples into `tracker`
    async fn subscribe(&self, tracker: SharedTracker) -> DeviceResult<()>;

    /// Stop delivering samples
    async fn unsubscribe(&self) -> DeviceResult<()>;

    /// Fails with [`DeviceError::InvalidOperation`] if already calibrating
    async fn enter_calibration_mode(&self) -> DeviceResult<()>;

    async fn leave_calibration_mode(&self) -> DeviceResult<()>;

    /// Collect calibration data while the user looks at `(x, y)`
    async fn collect_data(&self, x: f64, y: f64) -> DeviceResult<CalibrationStatus>;

    /// Drop the data collected for the target at `(x, y)`
    async fn discard_data(&self, x: f64, y: f64) -> DeviceResult<()>;

    /// Compute a calibration from the collected data and apply it to the device
    async fn compute_and_apply(&self) -> DeviceResult<CalibrationResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_without_valid_samples_needs_recollection() {
        let lost = CalibrationSample {
            left: GazePoint::INVALID,
            right: GazePoint::new(0.1, 0.1),
        };
        let mut point = CalibrationPoint {
            position: GazePoint::new(0.1, 0.1),
            samples: vec![lost],
        };
        assert!(point.needs_recollection());

        point.samples.push(CalibrationSample {
            left: GazePoint::new(0.1, 0.1),
            right: GazePoint::new(0.11, 0.1),
        });
        assert!(!point.needs_recollection());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CalibrationStatus::Success).unwrap(),
            r#""success""#
        );
    }
}
