use serde::{Deserialize, Serialize};

/// Maps `NaN` to JSON `null` on the way out and `null` back to `NaN` on the way in.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

/// Gaze location in normalized display-area coordinates.
///
/// `NaN` in either field means the gaze is not currently tracked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazePoint {
    #[serde(with = "nan_as_null")]
    pub x: f64,
    #[serde(with = "nan_as_null")]
    pub y: f64,
}

impl GazePoint {
    pub const INVALID: GazePoint = GazePoint {
        x: f64::NAN,
        y: f64::NAN,
    };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_valid(&self) -> bool {
        !(self.x.is_nan() || self.y.is_nan())
    }

    /// Component-wise mean of two points. `NaN` in either input propagates.
    pub fn midpoint(&self, other: &GazePoint) -> GazePoint {
        GazePoint {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

impl Default for GazePoint {
    fn default() -> Self {
        Self::INVALID
    }
}

impl From<(f64, f64)> for GazePoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Head position of one eye in normalized track-box space.
///
/// The three fields are either all finite or all `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyePosition {
    #[serde(with = "nan_as_null")]
    pub x: f64,
    #[serde(with = "nan_as_null")]
    pub y: f64,
    #[serde(with = "nan_as_null")]
    pub z: f64,
}

impl EyePosition {
    pub const INVALID: EyePosition = EyePosition {
        x: f64::NAN,
        y: f64::NAN,
        z: f64::NAN,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_valid(&self) -> bool {
        !(self.x.is_nan() || self.y.is_nan() || self.z.is_nan())
    }

    /// Flip the x axis so the position matches the display's left/right convention
    /// instead of the camera's.
    pub fn mirrored(&self) -> EyePosition {
        EyePosition {
            x: 1.0 - self.x,
            y: self.y,
            z: self.z,
        }
    }
}

impl Default for EyePosition {
    fn default() -> Self {
        Self::INVALID
    }
}

/// One binocular gaze sample as delivered by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawDualEyeSample {
    /// Device timestamp in seconds. Not used for filtering.
    pub timestamp: f64,
    pub left: GazePoint,
    pub right: GazePoint,
}

impl RawDualEyeSample {
    pub fn new(timestamp: f64, left_x: f64, left_y: f64, right_x: f64, right_y: f64) -> Self {
        Self {
            timestamp,
            left: GazePoint::new(left_x, left_y),
            right: GazePoint::new(right_x, right_y),
        }
    }

    /// Binocular average, invalid if either eye was lost.
    pub fn combined(&self) -> GazePoint {
        self.left.midpoint(&self.right)
    }
}

/// User-position guide sample: per-eye validity plus raw track-box positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserPositionSample {
    pub left_valid: bool,
    pub right_valid: bool,
    pub left: EyePosition,
    pub right: EyePosition,
}

impl UserPositionSample {
    pub fn absent() -> Self {
        Self {
            left_valid: false,
            right_valid: false,
            left: EyePosition::INVALID,
            right: EyePosition::INVALID,
        }
    }

    pub fn user_present(&self) -> bool {
        self.left_valid || self.right_valid
    }
}

/// Latest tracker output, copied out to readers as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeTrackerState {
    pub gaze_point: GazePoint,
    pub fixation_point: GazePoint,
    pub left_eye_position: EyePosition,
    pub right_eye_position: EyePosition,
    pub user_present: bool,
}

impl Default for EyeTrackerState {
    fn default() -> Self {
        Self {
            gaze_point: GazePoint::INVALID,
            fixation_point: GazePoint::INVALID,
            left_eye_position: EyePosition::INVALID,
            right_eye_position: EyePosition::INVALID,
            user_present: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaze_point_validity() {
        assert!(GazePoint::new(0.2, 0.8).is_valid());
        assert!(!GazePoint::new(f64::NAN, 0.8).is_valid());
        assert!(!GazePoint::new(0.2, f64::NAN).is_valid());
        assert!(!GazePoint::default().is_valid());
    }

    #[test]
    fn test_combined_propagates_nan() {
        let sample = RawDualEyeSample::new(1.0, 0.2, 0.4, f64::NAN, 0.6);
        let combined = sample.combined();
        assert!(combined.x.is_nan());
        assert!((combined.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let json = serde_json::to_string(&GazePoint::new(f64::NAN, 0.25)).unwrap();
        assert_eq!(json, r#"{"x":null,"y":0.25}"#);
    }

    #[test]
    fn test_null_deserializes_as_nan() {
        let point: GazePoint = serde_json::from_str(r#"{"x":null,"y":0.5}"#).unwrap();
        assert!(point.x.is_nan());
        assert_eq!(point.y, 0.5);
    }

    #[test]
    fn test_mirrored_eye_position() {
        let mirrored = EyePosition::new(0.3, 0.4, 0.5).mirrored();
        assert!((mirrored.x - 0.7).abs() < 1e-12);
        assert_eq!(mirrored.y, 0.4);
        assert_eq!(mirrored.z, 0.5);
    }

    #[test]
    fn test_default_state_is_untracked() {
        let state = EyeTrackerState::default();
        assert!(!state.gaze_point.is_valid());
        assert!(!state.fixation_point.is_valid());
        assert!(!state.left_eye_position.is_valid());
        assert!(!state.user_present);
    }
}
