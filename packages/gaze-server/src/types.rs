use serde::{Deserialize, Serialize};

pub const MESSAGE_OK: &str = "ok";
pub const MESSAGE_FAILED: &str = "failed";
pub const MESSAGE_NOT_FOUND: &str = "eyetracker not found";

/// Body returned by the calibration endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    /// Targets the client should collect again after a failed calibration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recalibrate: Option<Vec<[f64; 2]>>,
}

impl MessageResponse {
    pub fn ok() -> Self {
        Self::new(MESSAGE_OK)
    }

    pub fn failed() -> Self {
        Self::new(MESSAGE_FAILED)
    }

    pub fn not_found() -> Self {
        Self::new(MESSAGE_NOT_FOUND)
    }

    pub fn recalibrate(points: Vec<[f64; 2]>) -> Self {
        Self {
            message: MESSAGE_FAILED.to_string(),
            recalibrate: Some(points),
        }
    }

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            recalibrate: None,
        }
    }
}

/// Query string of `POST /calibration:result`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CalibrationResultQuery {
    #[serde(default)]
    pub force: bool,
}

/// Reply to every text message received over the websocket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusAck {
    pub status: String,
}

impl StatusAck {
    pub fn ok() -> Self {
        Self {
            status: MESSAGE_OK.to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub device: Option<String>,
    pub user_present: bool,
    pub uptime_seconds: u64,
}
