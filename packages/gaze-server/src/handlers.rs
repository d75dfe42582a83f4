use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use gaze_rs::{EyeTrackerState, GazePoint};
use tracing::{info, warn};

use crate::state::AppState;
use crate::traits::{CalibrationStatus, DeviceError};
use crate::types::{CalibrationResultQuery, HealthResponse, MessageResponse};

type CalibrationReply = Result<Json<MessageResponse>, (StatusCode, Json<MessageResponse>)>;

fn device_failure(action: &str, e: DeviceError) -> (StatusCode, Json<MessageResponse>) {
    warn!("Calibration {} failed: {}", action, e);
    let status = match e {
        DeviceError::InvalidOperation(_) => StatusCode::CONFLICT,
        DeviceError::Disconnected(_) => StatusCode::SERVICE_UNAVAILABLE,
        DeviceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(MessageResponse::new(e.to_string())))
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        device: state.device.as_ref().map(|d| d.name().to_string()),
        user_present: state.tracker.read_state().user_present,
        uptime_seconds: state.uptime_seconds(),
    };

    (StatusCode::OK, Json(response))
}

/// Latest tracker snapshot
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<EyeTrackerState> {
    Json(state.tracker.read_state())
}

/// Enter calibration mode, restarting it if the device is already calibrating
pub async fn calibration_start(State(state): State<Arc<AppState>>) -> CalibrationReply {
    let Some(device) = state.device.as_ref() else {
        return Ok(Json(MessageResponse::not_found()));
    };

    match device.enter_calibration_mode().await {
        Ok(()) => {}
        Err(DeviceError::InvalidOperation(reason)) => {
            info!("Already calibrating ({}), restarting calibration", reason);
            device
                .leave_calibration_mode()
                .await
                .map_err(|e| device_failure("restart", e))?;
            device
                .enter_calibration_mode()
                .await
                .map_err(|e| device_failure("start", e))?;
        }
        Err(e) => return Err(device_failure("start", e)),
    }

    Ok(Json(MessageResponse::ok()))
}

/// Collect calibration data for the target the user is looking at
pub async fn calibration_collect(
    State(state): State<Arc<AppState>>,
    Json(point): Json<GazePoint>,
) -> CalibrationReply {
    let Some(device) = state.device.as_ref() else {
        return Ok(Json(MessageResponse::not_found()));
    };

    info!("Collect: {} {}", point.x, point.y);
    if !point.is_valid() {
        return Ok(Json(MessageResponse::failed()));
    }

    let status = device
        .collect_data(point.x, point.y)
        .await
        .map_err(|e| device_failure("collect", e))?;

    Ok(Json(match status {
        CalibrationStatus::Success => MessageResponse::ok(),
        CalibrationStatus::Failure => MessageResponse::failed(),
    }))
}

/// Compute and apply the calibration.
///
/// On success, or when `force` is set, calibration mode is left. Otherwise the
/// targets without any usable sample are discarded and returned so the client
/// can collect them again.
pub async fn calibration_result(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalibrationResultQuery>,
) -> CalibrationReply {
    let Some(device) = state.device.as_ref() else {
        return Ok(Json(MessageResponse::not_found()));
    };

    let result = device
        .compute_and_apply()
        .await
        .map_err(|e| device_failure("compute", e))?;

    info!(
        "Calibration result: {:?} with {} points",
        result.status,
        result.points.len()
    );
    for point in &result.points {
        let valid = point.samples.iter().filter(|s| s.is_valid()).count();
        info!(
            "  ({:.3}, {:.3}): {}/{} valid samples",
            point.position.x,
            point.position.y,
            valid,
            point.samples.len()
        );
    }

    if query.force || result.status == CalibrationStatus::Success {
        device
            .leave_calibration_mode()
            .await
            .map_err(|e| device_failure("finish", e))?;
        return Ok(Json(MessageResponse::ok()));
    }

    let recalibrate: Vec<[f64; 2]> = result
        .points
        .iter()
        .filter(|p| p.needs_recollection())
        .map(|p| [p.position.x, p.position.y])
        .collect();

    for [x, y] in &recalibrate {
        device
            .discard_data(*x, *y)
            .await
            .map_err(|e| device_failure("discard", e))?;
    }

    Ok(Json(MessageResponse::recalibrate(recalibrate)))
}

/// Subscribe the device to the tracker, logging instead of failing when absent
pub async fn subscribe_device(state: &AppState) -> Result<(), DeviceError> {
    match state.device.as_ref() {
        Some(device) => {
            device.subscribe(state.tracker.clone()).await?;
            info!("Subscribed to {} eye tracker", device.name());
        }
        None => warn!("No eye tracker found"),
    }
    Ok(())
}

pub async fn unsubscribe_device(state: &AppState) -> Result<(), DeviceError> {
    if let Some(device) = state.device.as_ref() {
        device.unsubscribe().await?;
        info!("Unsubscribed from {} eye tracker", device.name());
    }
    Ok(())
}
