use std::time::{Duration, Instant};

use async_trait::async_trait;
use gaze_rs::{EyePosition, GazePoint, RawDualEyeSample, SharedTracker, UserPositionSample};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::traits::{
    CalibrationPoint, CalibrationResult, CalibrationSample, CalibrationStatus, DeviceError,
    DeviceResult, EyeTrackerDevice,
};

/// Per-eye jitter amplitude in display units
const JITTER: f64 = 0.004;
/// Chance per sample that a blink starts
const BLINK_PROBABILITY: f64 = 0.002;
const BLINK_DURATION: Duration = Duration::from_millis(120);
/// User-position guide samples are sent at a tenth of the gaze rate
const POSITION_EVERY: u64 = 10;
const SAMPLES_PER_CALIBRATION_POINT: usize = 8;

/// Synthetic binocular gaze: dwell on a target, jump to another, blink now and then.
pub struct GazeSimulator {
    rng: StdRng,
    sample_hz: f64,
    target: (f64, f64),
    dwell_remaining: u64,
    blink_remaining: u64,
    produced: u64,
}

impl GazeSimulator {
    pub fn new(seed: u64, sample_hz: f64) -> Self {
        let mut simulator = Self {
            rng: StdRng::seed_from_u64(seed),
            sample_hz,
            target: (0.5, 0.5),
            dwell_remaining: 0,
            blink_remaining: 0,
            produced: 0,
        };
        simulator.dwell_remaining = simulator.next_dwell();
        simulator
    }

    fn next_dwell(&mut self) -> u64 {
        let seconds = self.rng.gen_range(0.2..0.8);
        (seconds * self.sample_hz).ceil() as u64
    }

    /// Next raw sample stamped with the device clock `timestamp` (seconds).
    pub fn next_sample(&mut self, timestamp: f64) -> RawDualEyeSample {
        self.produced += 1;

        if self.dwell_remaining == 0 {
            self.target = (self.rng.gen_range(0.05..0.95), self.rng.gen_range(0.05..0.95));
            self.dwell_remaining = self.next_dwell();
        }
        self.dwell_remaining -= 1;

        if self.blink_remaining == 0 && self.rng.gen_bool(BLINK_PROBABILITY) {
            self.blink_remaining = (BLINK_DURATION.as_secs_f64() * self.sample_hz).ceil() as u64;
        }
        if self.blink_remaining > 0 {
            self.blink_remaining -= 1;
            return RawDualEyeSample::new(timestamp, f64::NAN, f64::NAN, f64::NAN, f64::NAN);
        }

        let (tx, ty) = self.target;
        RawDualEyeSample::new(
            timestamp,
            tx + self.rng.gen_range(-JITTER..JITTER),
            ty + self.rng.gen_range(-JITTER..JITTER),
            tx + self.rng.gen_range(-JITTER..JITTER),
            ty + self.rng.gen_range(-JITTER..JITTER),
        )
    }

    /// User-position guide sample, due every [`POSITION_EVERY`] gaze samples.
    pub fn next_user_position(&mut self) -> Option<UserPositionSample> {
        if self.produced % POSITION_EVERY != 0 {
            return None;
        }
        let mut wobble = || self.rng.gen_range(-0.01..0.01);
        Some(UserPositionSample {
            left_valid: true,
            right_valid: true,
            left: EyePosition::new(0.55 + wobble(), 0.5 + wobble(), 0.5 + wobble()),
            right: EyePosition::new(0.45 + wobble(), 0.5 + wobble(), 0.5 + wobble()),
        })
    }
}

#[derive(Default)]
struct CalibrationSession {
    active: bool,
    points: Vec<CalibrationPoint>,
}

/// [`EyeTrackerDevice`] that needs no hardware.
pub struct SimulatedDevice {
    sample_hz: f64,
    seed: u64,
    task: Mutex<Option<JoinHandle<()>>>,
    calibration: Mutex<CalibrationSession>,
}

impl SimulatedDevice {
    pub fn new(sample_hz: f64) -> Self {
        Self::with_seed(sample_hz, rand::random())
    }

    pub fn with_seed(sample_hz: f64, seed: u64) -> Self {
        Self {
            sample_hz,
            seed,
            task: Mutex::new(None),
            calibration: Mutex::new(CalibrationSession::default()),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.task.lock().is_some()
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibration.lock().active
    }

    fn require_calibrating(session: &CalibrationSession) -> DeviceResult<()> {
        if session.active {
            Ok(())
        } else {
            Err(DeviceError::InvalidOperation(
                "not in calibration mode".to_string(),
            ))
        }
    }
}

#[async_trait]
impl EyeTrackerDevice for SimulatedDevice {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn subscribe(&self, tracker: SharedTracker) -> DeviceResult<()> {
        let mut task = self.task.lock();
        if task.is_some() {
            return Err(DeviceError::InvalidOperation(
                "already subscribed".to_string(),
            ));
        }

        let mut simulator = GazeSimulator::new(self.seed, self.sample_hz);
        let period = Duration::from_secs_f64(1.0 / self.sample_hz);
        let epoch = Instant::now();

        *task = Some(tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let sample = simulator.next_sample(epoch.elapsed().as_secs_f64());
                tracker.on_raw_sample(&sample);
                if let Some(position) = simulator.next_user_position() {
                    tracker.on_user_position_sample(&position);
                }
            }
        }));

        info!("Simulated tracker streaming at {} Hz", self.sample_hz);
        Ok(())
    }

    async fn unsubscribe(&self) -> DeviceResult<()> {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
            info!("Simulated tracker stopped");
        }
        Ok(())
    }

    async fn enter_calibration_mode(&self) -> DeviceResult<()> {
        let mut session = self.calibration.lock();
        if session.active {
            return Err(DeviceError::InvalidOperation(
                "already in calibration mode".to_string(),
            ));
        }
        session.active = true;
        session.points.clear();
        debug!("Entered calibration mode");
        Ok(())
    }

    async fn leave_calibration_mode(&self) -> DeviceResult<()> {
        let mut session = self.calibration.lock();
        Self::require_calibrating(&session)?;
        session.active = false;
        session.points.clear();
        debug!("Left calibration mode");
        Ok(())
    }

    async fn collect_data(&self, x: f64, y: f64) -> DeviceResult<CalibrationStatus> {
        let mut session = self.calibration.lock();
        Self::require_calibrating(&session)?;

        let position = GazePoint::new(x, y);
        if !position.is_valid() || !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            return Ok(CalibrationStatus::Failure);
        }

        let point_seed = x.to_bits().rotate_left(17) ^ y.to_bits();
        let mut rng = StdRng::seed_from_u64(self.seed ^ point_seed);
        let samples = (0..SAMPLES_PER_CALIBRATION_POINT)
            .map(|_| CalibrationSample {
                left: GazePoint::new(
                    x + rng.gen_range(-JITTER..JITTER),
                    y + rng.gen_range(-JITTER..JITTER),
                ),
                right: GazePoint::new(
                    x + rng.gen_range(-JITTER..JITTER),
                    y + rng.gen_range(-JITTER..JITTER),
                ),
            })
            .collect();

        session.points.retain(|p| p.position != position);
        session.points.push(CalibrationPoint { position, samples });
        Ok(CalibrationStatus::Success)
    }

    async fn discard_data(&self, x: f64, y: f64) -> DeviceResult<()> {
        let mut session = self.calibration.lock();
        Self::require_calibrating(&session)?;
        let position = GazePoint::new(x, y);
        session.points.retain(|p| p.position != position);
        Ok(())
    }

    async fn compute_and_apply(&self) -> DeviceResult<CalibrationResult> {
        let session = self.calibration.lock();
        Self::require_calibrating(&session)?;

        let status = if session.points.is_empty() {
            CalibrationStatus::Failure
        } else {
            CalibrationStatus::Success
        };
        Ok(CalibrationResult {
            status,
            points: session.points.clone(),
        })
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}
