//! Offline replay of recorded gaze samples through the filter pipeline.
//!
//! Input is CSV with the header `arrival,left_x,left_y,right_x,right_y`.
//! `arrival` is the host arrival time in seconds; an empty or `nan` gaze cell
//! means that eye was not tracked. A non-finite `arrival` is rejected. Each
//! sample yields one JSON line holding the
//! tracker state after it was processed.

use std::io::{Read, Write};

use gaze_rs::{FilterConfig, RawDualEyeSample, SampleAggregator};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Filter error: {0}")]
    Filter(#[from] gaze_rs::GazeError),

    #[error("Row {row}: arrival must be a finite number of seconds, got {value}")]
    InvalidArrival { row: usize, value: f64 },
}

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    arrival: f64,
    left_x: Option<f64>,
    left_y: Option<f64>,
    right_x: Option<f64>,
    right_y: Option<f64>,
}

impl ReplayRecord {
    fn to_sample(&self) -> RawDualEyeSample {
        let cell = |v: Option<f64>| v.unwrap_or(f64::NAN);
        RawDualEyeSample::new(
            self.arrival,
            cell(self.left_x),
            cell(self.left_y),
            cell(self.right_x),
            cell(self.right_y),
        )
    }
}

/// Run every sample in `input` through a fresh aggregator, writing one state
/// per line to `output`. Returns the number of samples replayed.
pub fn replay<R: Read, W: Write>(
    input: R,
    mut output: W,
    config: FilterConfig,
) -> Result<usize, ReplayError> {
    let mut aggregator = SampleAggregator::new(config)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut count = 0;
    for record in reader.deserialize::<ReplayRecord>() {
        let record = record?;
        if !record.arrival.is_finite() {
            return Err(ReplayError::InvalidArrival {
                row: count + 1,
                value: record.arrival,
            });
        }
        aggregator.on_raw_sample_at(record.arrival, &record.to_sample());
        serde_json::to_writer(&mut output, aggregator.state())?;
        output.write_all(b"\n")?;
        count += 1;
    }
    output.flush()?;

    debug!("Replayed {} samples", count);
    Ok(count)
}
