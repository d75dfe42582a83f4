use std::f64::consts::PI;

use crate::error::{GazeError, Result};

/// Tuning for [`SignalSmoother`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SmootherParams {
    /// Cutoff frequency (Hz) at rest. Lower = less jitter, more lag.
    pub min_cutoff: f64,
    /// How much the cutoff widens per unit of speed. Higher = less lag during motion.
    pub beta: f64,
    /// Cutoff frequency (Hz) used to smooth the derivative itself.
    pub derivative_cutoff: f64,
}

impl Default for SmootherParams {
    fn default() -> Self {
        Self {
            min_cutoff: 1.0,
            beta: 0.0,
            derivative_cutoff: 1.0,
        }
    }
}

impl SmootherParams {
    pub fn validate(&self) -> Result<()> {
        positive("min_cutoff", self.min_cutoff)?;
        positive("derivative_cutoff", self.derivative_cutoff)?;
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(GazeError::InvalidParameter {
                name: "beta",
                value: self.beta,
                reason: "must be finite and non-negative",
            });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GazeError::InvalidParameter {
            name,
            value,
            reason: "must be finite and positive",
        })
    }
}

/// Weight of the newest sample in an exponential moving average for a step
/// of `elapsed` seconds at the given cutoff frequency.
pub fn smoothing_factor(elapsed: f64, cutoff: f64) -> f64 {
    let r = 2.0 * PI * cutoff * elapsed;
    r / (r + 1.0)
}

pub fn exponential_smoothing(alpha: f64, value: f64, previous: f64) -> f64 {
    alpha * value + (1.0 - alpha) * previous
}

/// One-euro adaptive low-pass filter over a scalar series.
///
/// Smooths heavily while the signal is still and opens up the cutoff as the
/// signal's speed grows. Timestamps are in seconds.
///
/// A step whose elapsed time is not strictly positive (repeated or
/// out-of-order timestamp) is a no-op: the previous output is returned and no
/// state changes. A non-finite timestamp is ignored the same way and never
/// becomes the baseline. `NaN` values are not guarded; callers must keep them
/// out.
#[derive(Debug, Clone)]
pub struct SignalSmoother {
    params: SmootherParams,
    last_timestamp: Option<f64>,
    last_value: f64,
    last_derivative: f64,
}

impl SignalSmoother {
    pub fn new(params: SmootherParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            last_timestamp: None,
            last_value: 0.0,
            last_derivative: 0.0,
        })
    }

    pub fn filter(&mut self, timestamp: f64, value: f64) -> f64 {
        if !timestamp.is_finite() {
            return match self.last_timestamp {
                Some(_) => self.last_value,
                None => value,
            };
        }

        let Some(last_timestamp) = self.last_timestamp else {
            self.last_timestamp = Some(timestamp);
            self.last_value = value;
            return value;
        };

        let elapsed = timestamp - last_timestamp;
        if elapsed.is_nan() || elapsed <= 0.0 {
            return self.last_value;
        }

        let derivative_alpha = smoothing_factor(elapsed, self.params.derivative_cutoff);
        let derivative = (value - self.last_value) / elapsed;
        let derivative_hat =
            exponential_smoothing(derivative_alpha, derivative, self.last_derivative);

        let cutoff = self.params.min_cutoff + self.params.beta * derivative_hat.abs();
        let alpha = smoothing_factor(elapsed, cutoff);
        let value_hat = exponential_smoothing(alpha, value, self.last_value);

        self.last_timestamp = Some(timestamp);
        self.last_value = value_hat;
        self.last_derivative = derivative_hat;

        value_hat
    }

    /// Forget all history; the next sample is treated as a cold start.
    pub fn reset(&mut self) {
        self.last_timestamp = None;
        self.last_value = 0.0;
        self.last_derivative = 0.0;
    }

    pub fn params(&self) -> &SmootherParams {
        &self.params
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    pub fn last_value(&self) -> f64 {
        self.last_value
    }

    pub fn last_derivative(&self) -> f64 {
        self.last_derivative
    }
}

impl Default for SignalSmoother {
    fn default() -> Self {
        Self {
            params: SmootherParams::default(),
            last_timestamp: None,
            last_value: 0.0,
            last_derivative: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_passes_through() {
        let mut smoother = SignalSmoother::default();
        assert_eq!(smoother.filter(12.5, 0.42), 0.42);
        assert_eq!(smoother.last_timestamp(), Some(12.5));
    }

    #[test]
    fn test_zero_timestamp_is_a_real_baseline() {
        let mut smoother = SignalSmoother::default();
        smoother.filter(0.0, 0.2);
        let out = smoother.filter(0.1, 0.8);
        // A second cold start would have returned 0.8 unchanged.
        assert!(out < 0.8 && out > 0.2);
    }

    #[test]
    fn test_constant_signal_is_fixed_point() {
        let mut smoother = SignalSmoother::default();
        for i in 0..200 {
            let out = smoother.filter(i as f64 * 0.008, 0.37);
            assert!((out - 0.37).abs() < 1e-12);
        }
        assert!(smoother.last_derivative().abs() < 1e-9);
    }

    #[test]
    fn test_step_matches_reference_arithmetic() {
        let mut smoother = SignalSmoother::default();
        smoother.filter(1.0, 0.0);
        let out = smoother.filter(1.1, 1.0);

        let r = 2.0 * PI * 1.0 * 0.1_f64;
        let alpha = r / (r + 1.0);
        let derivative = (1.0 - 0.0) / (1.1_f64 - 1.0);
        assert!((out - alpha).abs() < 1e-12);
        assert!((smoother.last_derivative() - alpha * derivative).abs() < 1e-9);
    }

    #[test]
    fn test_beta_reduces_lag() {
        let fast = SmootherParams {
            beta: 5.0,
            ..SmootherParams::default()
        };
        let mut plain = SignalSmoother::default();
        let mut adaptive = SignalSmoother::new(fast).unwrap();

        let mut plain_out = 0.0;
        let mut adaptive_out = 0.0;
        for i in 0..10 {
            let t = i as f64 * 0.01;
            let v = i as f64 * 0.05;
            plain_out = plain.filter(t, v);
            adaptive_out = adaptive.filter(t, v);
        }
        let target = 9.0 * 0.05;
        assert!((target - adaptive_out) < (target - plain_out));
    }

    #[test]
    fn test_repeated_timestamp_returns_previous_output() {
        let mut smoother = SignalSmoother::default();
        smoother.filter(1.0, 0.3);
        let before = smoother.filter(1.05, 0.5);
        let derivative = smoother.last_derivative();

        let out = smoother.filter(1.05, 0.9);
        assert_eq!(out, before);
        assert!(out.is_finite());
        assert_eq!(smoother.last_timestamp(), Some(1.05));
        assert_eq!(smoother.last_derivative(), derivative);
    }

    #[test]
    fn test_backwards_timestamp_is_ignored() {
        let mut smoother = SignalSmoother::default();
        smoother.filter(2.0, 0.3);
        assert_eq!(smoother.filter(1.0, 0.9), 0.3);
        assert_eq!(smoother.last_timestamp(), Some(2.0));
    }

    #[test]
    fn test_non_finite_timestamp_never_becomes_baseline() {
        let mut smoother = SignalSmoother::default();
        assert_eq!(smoother.filter(f64::NAN, 0.2), 0.2);
        assert_eq!(smoother.last_timestamp(), None);

        assert_eq!(smoother.filter(0.01, 0.8), 0.8);
        let out = smoother.filter(5.0, 0.2);
        assert!(out < 0.3, "filter should follow the signal, got {}", out);

        assert_eq!(smoother.filter(f64::INFINITY, 0.9), out);
        assert_eq!(smoother.last_timestamp(), Some(5.0));
    }

    #[test]
    fn test_reset_returns_to_cold_start() {
        let mut smoother = SignalSmoother::default();
        smoother.filter(1.0, 0.3);
        smoother.filter(1.1, 0.6);
        smoother.reset();
        assert_eq!(smoother.last_timestamp(), None);
        assert_eq!(smoother.filter(5.0, 0.9), 0.9);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let bad_cutoff = SmootherParams {
            min_cutoff: 0.0,
            ..SmootherParams::default()
        };
        assert!(matches!(
            SignalSmoother::new(bad_cutoff),
            Err(GazeError::InvalidParameter { name: "min_cutoff", .. })
        ));

        let bad_beta = SmootherParams {
            beta: -1.0,
            ..SmootherParams::default()
        };
        assert!(SignalSmoother::new(bad_beta).is_err());

        let bad_derivative = SmootherParams {
            derivative_cutoff: f64::NAN,
            ..SmootherParams::default()
        };
        assert!(SignalSmoother::new(bad_derivative).is_err());
    }

    #[test]
    fn test_smoothing_factor_limits() {
        assert!(smoothing_factor(1e-9, 1.0) < 1e-6);
        assert!(smoothing_factor(1e6, 1.0) > 0.999_999);
    }
}
