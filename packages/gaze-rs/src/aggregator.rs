use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fixation::{FixationClassifier, DEFAULT_VELOCITY_THRESHOLD};
use crate::smoother::{SignalSmoother, SmootherParams};
use crate::types::*;

/// Parameters for the whole filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub smoother: SmootherParams,
    pub velocity_threshold: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            smoother: SmootherParams::default(),
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
        }
    }
}

/// Turns binocular raw samples into a smoothed gaze point and a fixation point.
///
/// Owns one smoother per axis and one fixation classifier. Both filters are
/// timed by arrival on this aggregator's monotonic clock (seconds since
/// construction), not by the device timestamp.
///
/// Samples with an untracked eye bypass the filters entirely: the `NaN`
/// average is published as both gaze and fixation point and filter state is
/// left as it was, so tracking resumes from the last good sample.
pub struct SampleAggregator {
    smoother_x: SignalSmoother,
    smoother_y: SignalSmoother,
    classifier: FixationClassifier,
    state: EyeTrackerState,
    epoch: Instant,
}

impl SampleAggregator {
    pub fn new(config: FilterConfig) -> Result<Self> {
        Ok(Self {
            smoother_x: SignalSmoother::new(config.smoother)?,
            smoother_y: SignalSmoother::new(config.smoother)?,
            classifier: FixationClassifier::new(config.velocity_threshold)?,
            state: EyeTrackerState::default(),
            epoch: Instant::now(),
        })
    }

    /// Seconds elapsed on the arrival clock.
    pub fn arrival_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    pub fn on_raw_sample(&mut self, sample: &RawDualEyeSample) {
        let arrival = self.arrival_time();
        self.on_raw_sample_at(arrival, sample);
    }

    /// Same as [`on_raw_sample`](Self::on_raw_sample) with an explicit arrival
    /// time in seconds, for replaying recordings.
    pub fn on_raw_sample_at(&mut self, arrival: f64, sample: &RawDualEyeSample) {
        let combined = sample.combined();

        if !combined.is_valid() {
            if self.state.gaze_point.is_valid() {
                log::debug!("gaze tracking lost at {:.3}s", arrival);
            }
            self.state.gaze_point = combined;
            self.state.fixation_point = combined;
            return;
        }

        if !self.state.gaze_point.is_valid() {
            log::debug!("gaze tracking acquired at {:.3}s", arrival);
        }

        let x = self.smoother_x.filter(arrival, combined.x);
        let y = self.smoother_y.filter(arrival, combined.y);
        self.state.gaze_point = GazePoint::new(x, y);

        let fixation = self.classifier.classify(arrival, x, y);
        self.state.fixation_point = GazePoint::from(fixation);
    }

    pub fn on_user_position_sample(&mut self, sample: &UserPositionSample) {
        let present = sample.user_present();
        if present != self.state.user_present {
            log::debug!("user present: {}", present);
        }
        self.state.user_present = present;

        if !present {
            self.state.left_eye_position = EyePosition::INVALID;
            self.state.right_eye_position = EyePosition::INVALID;
            return;
        }

        self.state.left_eye_position = eye_position(sample.left_valid, &sample.left);
        self.state.right_eye_position = eye_position(sample.right_valid, &sample.right);
    }

    pub fn state(&self) -> &EyeTrackerState {
        &self.state
    }

    pub fn read_state(&self) -> EyeTrackerState {
        self.state
    }

    /// Return both filters to cold start and clear the published state.
    pub fn reset(&mut self) {
        self.smoother_x.reset();
        self.smoother_y.reset();
        self.classifier.reset();
        self.state = EyeTrackerState::default();
    }

    pub fn smoother_x(&self) -> &SignalSmoother {
        &self.smoother_x
    }

    pub fn smoother_y(&self) -> &SignalSmoother {
        &self.smoother_y
    }

    pub fn classifier(&self) -> &FixationClassifier {
        &self.classifier
    }
}

impl Default for SampleAggregator {
    fn default() -> Self {
        Self {
            smoother_x: SignalSmoother::default(),
            smoother_y: SignalSmoother::default(),
            classifier: FixationClassifier::default(),
            state: EyeTrackerState::default(),
            epoch: Instant::now(),
        }
    }
}

fn eye_position(valid: bool, raw: &EyePosition) -> EyePosition {
    if valid {
        raw.mirrored()
    } else {
        EyePosition::INVALID
    }
}
