//! Streaming gaze filters.
//!
//! Raw binocular samples go through a [`SampleAggregator`], which averages the
//! two eyes, smooths each axis with a one-euro [`SignalSmoother`] and feeds the
//! smoothed point to a velocity-threshold [`FixationClassifier`]. The latest
//! result is an [`EyeTrackerState`], shared with readers through
//! [`SharedTracker`].

pub mod aggregator;
pub mod error;
pub mod fixation;
pub mod shared;
pub mod smoother;
pub mod types;

pub use aggregator::{FilterConfig, SampleAggregator};
pub use error::{GazeError, Result};
pub use fixation::{FixationClassifier, DEFAULT_VELOCITY_THRESHOLD};
pub use shared::SharedTracker;
pub use smoother::{SignalSmoother, SmootherParams};
pub use types::*;
