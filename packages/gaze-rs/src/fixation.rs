use crate::error::{GazeError, Result};

pub const DEFAULT_VELOCITY_THRESHOLD: f64 = 2.0;

/// Streaming velocity-threshold (I-VT) fixation detector.
///
/// Each point is compared with the running centroid of the current fixation.
/// When `distance² / dt` reaches the threshold a saccade is assumed and a new
/// fixation starts at that point; otherwise the centroid becomes the mean of
/// the fixation's samples seen *before* the current one, so it trails the
/// stream by one sample.
///
/// Velocity is in normalized display units² per second with timestamps in
/// seconds. Steps with a non-positive `dt` or a non-finite timestamp are
/// no-ops.
#[derive(Debug, Clone)]
pub struct FixationClassifier {
    velocity_threshold: f64,
    last_timestamp: Option<f64>,
    centroid: (f64, f64),
    // Running sums in arrival order; identical to summing the stored samples.
    sum_x: f64,
    sum_y: f64,
    samples: usize,
}

impl FixationClassifier {
    pub fn new(velocity_threshold: f64) -> Result<Self> {
        if !velocity_threshold.is_finite() || velocity_threshold < 0.0 {
            return Err(GazeError::InvalidParameter {
                name: "velocity_threshold",
                value: velocity_threshold,
                reason: "must be finite and non-negative",
            });
        }
        Ok(Self {
            velocity_threshold,
            last_timestamp: None,
            centroid: (0.0, 0.0),
            sum_x: 0.0,
            sum_y: 0.0,
            samples: 0,
        })
    }

    pub fn classify(&mut self, timestamp: f64, x: f64, y: f64) -> (f64, f64) {
        if !timestamp.is_finite() {
            return match self.last_timestamp {
                Some(_) => self.centroid,
                None => (x, y),
            };
        }

        let Some(last_timestamp) = self.last_timestamp else {
            self.start_fixation(timestamp, x, y);
            return (x, y);
        };

        let elapsed = timestamp - last_timestamp;
        if elapsed.is_nan() || elapsed <= 0.0 {
            return self.centroid;
        }

        let (cx, cy) = self.centroid;
        let velocity = ((x - cx).powi(2) + (y - cy).powi(2)) / elapsed;

        if velocity >= self.velocity_threshold {
            log::trace!(
                "saccade: velocity {:.4} >= {:.4}, new fixation at ({:.4}, {:.4})",
                velocity,
                self.velocity_threshold,
                x,
                y
            );
            self.start_fixation(timestamp, x, y);
        } else {
            let n = self.samples as f64;
            self.centroid = (self.sum_x / n, self.sum_y / n);
        }

        self.last_timestamp = Some(timestamp);
        self.sum_x += x;
        self.sum_y += y;
        self.samples += 1;

        self.centroid
    }

    fn start_fixation(&mut self, timestamp: f64, x: f64, y: f64) {
        self.last_timestamp = Some(timestamp);
        self.centroid = (x, y);
        self.sum_x = x;
        self.sum_y = y;
        self.samples = 1;
    }

    pub fn reset(&mut self) {
        self.last_timestamp = None;
        self.centroid = (0.0, 0.0);
        self.sum_x = 0.0;
        self.sum_y = 0.0;
        self.samples = 0;
    }

    pub fn velocity_threshold(&self) -> f64 {
        self.velocity_threshold
    }

    pub fn centroid(&self) -> (f64, f64) {
        self.centroid
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// Number of samples accumulated for the current fixation.
    pub fn fixation_len(&self) -> usize {
        self.samples
    }
}

impl Default for FixationClassifier {
    fn default() -> Self {
        Self {
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            last_timestamp: None,
            centroid: (0.0, 0.0),
            sum_x: 0.0,
            sum_y: 0.0,
            samples: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_is_centroid() {
        let mut ivt = FixationClassifier::default();
        assert_eq!(ivt.classify(3.0, 0.25, 0.75), (0.25, 0.75));
        assert_eq!(ivt.fixation_len(), 1);
    }

    #[test]
    fn test_saccade_resets_centroid() {
        let mut ivt = FixationClassifier::new(2.0).unwrap();
        ivt.classify(0.0, 0.5, 0.5);
        ivt.classify(0.005, 0.5005, 0.5);

        // distance² = 0.32 over 0.01s -> 32 >= 2
        let centroid = ivt.classify(0.015, 0.9, 0.9);
        assert_eq!(centroid, (0.9, 0.9));
        // reset seeds the point, then the end-of-step append adds it again
        assert_eq!(ivt.fixation_len(), 2);
    }

    #[test]
    fn test_centroid_lags_by_one_sample() {
        let mut ivt = FixationClassifier::new(2.0).unwrap();
        ivt.classify(0.0, 0.50, 0.50);

        // history {0.50}: centroid is the old mean, not including 0.52
        assert_eq!(ivt.classify(0.1, 0.52, 0.50), (0.50, 0.50));

        // history {0.50, 0.52}
        let (cx, cy) = ivt.classify(0.2, 0.51, 0.50);
        assert_eq!(cx, (0.50 + 0.52) / 2.0);
        assert_eq!(cy, 0.50);
        assert_eq!(ivt.fixation_len(), 3);
    }

    #[test]
    fn test_mean_matches_sequential_sum() {
        let mut ivt = FixationClassifier::new(2.0).unwrap();
        let xs = [0.31, 0.305, 0.312, 0.298, 0.301, 0.309];
        for (i, &x) in xs.iter().enumerate() {
            ivt.classify(i as f64 * 0.1, x, 0.6);
        }
        let (cx, _) = ivt.classify(0.6, 0.3, 0.6);
        let expected = xs.iter().sum::<f64>() / xs.len() as f64;
        assert_eq!(cx, expected);
    }

    #[test]
    fn test_repeated_timestamp_is_noop() {
        let mut ivt = FixationClassifier::new(2.0).unwrap();
        ivt.classify(1.0, 0.4, 0.4);
        ivt.classify(1.1, 0.41, 0.4);
        let centroid = ivt.centroid();
        let len = ivt.fixation_len();

        let out = ivt.classify(1.1, 0.95, 0.05);
        assert_eq!(out, centroid);
        assert!(out.0.is_finite() && out.1.is_finite());
        assert_eq!(ivt.fixation_len(), len);
    }

    #[test]
    fn test_non_finite_timestamp_never_becomes_baseline() {
        let mut ivt = FixationClassifier::new(2.0).unwrap();
        assert_eq!(ivt.classify(f64::NAN, 0.2, 0.2), (0.2, 0.2));
        assert_eq!(ivt.last_timestamp(), None);
        assert_eq!(ivt.fixation_len(), 0);

        assert_eq!(ivt.classify(0.01, 0.8, 0.8), (0.8, 0.8));
        ivt.classify(0.02, 0.8, 0.8);
        assert_eq!(ivt.classify(f64::INFINITY, 0.1, 0.1), (0.8, 0.8));
        assert_eq!(ivt.last_timestamp(), Some(0.02));
        assert_eq!(ivt.fixation_len(), 2);
    }

    #[test]
    fn test_reset_then_cold_start() {
        let mut ivt = FixationClassifier::default();
        ivt.classify(1.0, 0.4, 0.4);
        ivt.reset();
        assert_eq!(ivt.last_timestamp(), None);
        assert_eq!(ivt.classify(1.0, 0.1, 0.2), (0.1, 0.2));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        assert!(FixationClassifier::new(-0.5).is_err());
        assert!(FixationClassifier::new(f64::INFINITY).is_err());
        assert!(FixationClassifier::new(0.0).is_ok());
    }
}
