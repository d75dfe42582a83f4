use std::env;
use std::str::FromStr;
use std::time::Duration;

use gaze_rs::{FilterConfig, SmootherParams};
use serde::Serialize;

/// Which eye tracker backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Synthetic gaze with fixations, saccades and blinks
    Simulated,
    /// No tracker; calibration endpoints report "eyetracker not found"
    None,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::None => "none",
        }
    }
}

impl FromStr for DeviceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simulated" => Ok(Self::Simulated),
            "none" => Ok(Self::None),
            other => Err(ConfigError::InvalidValue(format!(
                "GAZE_DEVICE must be 'simulated' or 'none', got '{}'",
                other
            ))),
        }
    }
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Bind address (0.0.0.0 for LAN, 127.0.0.1 for localhost)
    pub bind_addr: String,
    /// Eye tracker backend
    pub device: DeviceKind,
    /// Websocket output rate (frames per second)
    pub stream_hz: f64,
    /// Raw sample rate of the simulated tracker
    pub sample_hz: f64,
    /// Gaze filter parameters
    pub filter: FilterConfig,
    /// CORS allowed origins; "*" allows any
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_addr: "127.0.0.1".to_string(),
            device: DeviceKind::Simulated,
            stream_hz: 60.0,
            sample_hz: 120.0,
            filter: FilterConfig::default(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse = |key: &str| -> Result<Option<f64>, ConfigError> {
            lookup(key)
                .map(|v| {
                    v.trim().parse::<f64>().map_err(|_| {
                        ConfigError::InvalidValue(format!("{} must be a number, got '{}'", key, v))
                    })
                })
                .transpose()
        };

        let port = match lookup("GAZE_PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidPort)?,
            None => defaults.port,
        };

        let device = match lookup("GAZE_DEVICE") {
            Some(v) => v.parse()?,
            None => defaults.device,
        };

        let filter = FilterConfig {
            smoother: SmootherParams {
                min_cutoff: parse("GAZE_MIN_CUTOFF")?
                    .unwrap_or(defaults.filter.smoother.min_cutoff),
                beta: parse("GAZE_BETA")?.unwrap_or(defaults.filter.smoother.beta),
                derivative_cutoff: parse("GAZE_DERIVATIVE_CUTOFF")?
                    .unwrap_or(defaults.filter.smoother.derivative_cutoff),
            },
            velocity_threshold: parse("GAZE_VELOCITY_THRESHOLD")?
                .unwrap_or(defaults.filter.velocity_threshold),
        };

        let config = Self {
            port,
            bind_addr: lookup("GAZE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            device,
            stream_hz: parse("GAZE_STREAM_HZ")?.unwrap_or(defaults.stream_hz),
            sample_hz: parse("GAZE_SAMPLE_HZ")?.unwrap_or(defaults.sample_hz),
            filter,
            cors_origins: lookup("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, rate) in [
            ("GAZE_STREAM_HZ", self.stream_hz),
            ("GAZE_SAMPLE_HZ", self.sample_hz),
        ] {
            if !rate.is_finite() || rate <= 0.0 || rate > 10_000.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be in (0, 10000], got {}",
                    name, rate
                )));
            }
        }
        self.filter.smoother.validate()?;
        gaze_rs::FixationClassifier::new(self.filter.velocity_threshold)?;
        Ok(())
    }

    /// Get the full bind address (addr:port)
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Interval between websocket frames
    pub fn stream_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.stream_hz)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
    #[error("Invalid filter configuration: {0}")]
    Filter(#[from] gaze_rs::GazeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.device, DeviceKind::Simulated);
        assert_eq!(config.filter, FilterConfig::default());
        assert_eq!(config.stream_period(), Duration::from_secs_f64(1.0 / 60.0));
        assert!(config.allows_any_origin());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("GAZE_PORT", "9100"),
            ("GAZE_DEVICE", "none"),
            ("GAZE_BETA", "0.25"),
            ("GAZE_VELOCITY_THRESHOLD", "3.5"),
            ("CORS_ORIGINS", "http://localhost:3000, http://127.0.0.1:3000"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9100");
        assert_eq!(config.device, DeviceKind::None);
        assert_eq!(config.filter.smoother.beta, 0.25);
        assert_eq!(config.filter.velocity_threshold, 3.5);
        assert_eq!(config.cors_origins.len(), 2);
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("GAZE_PORT", "eighty")])),
            Err(ConfigError::InvalidPort)
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("GAZE_STREAM_HZ", "0")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("GAZE_MIN_CUTOFF", "-1")])),
            Err(ConfigError::Filter(_))
        ));
        assert!(ServerConfig::from_lookup(lookup(&[("GAZE_DEVICE", "tobii")])).is_err());
    }
}
