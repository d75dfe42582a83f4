//! HTTP and websocket front end for the gaze filtering pipeline.
//!
//! The server owns one [`gaze_rs::SharedTracker`] fed by an
//! [`EyeTrackerDevice`], streams the smoothed gaze point over `/ws` and
//! exposes the device calibration workflow over plain HTTP.

pub mod cli;
pub mod config;
pub mod handlers;
pub mod replay;
pub mod simulated;
pub mod state;
pub mod traits;
pub mod types;
pub mod websocket;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use config::{ConfigError, DeviceKind, ServerConfig};
pub use simulated::SimulatedDevice;
pub use state::AppState;
pub use traits::{DeviceError, EyeTrackerDevice};
pub use websocket::handle_websocket;

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/ws", get(handle_websocket))
        .route("/health", get(handlers::health_check))
        .route("/state", get(handlers::get_state))
        .route("/calibration:start", post(handlers::calibration_start))
        .route("/calibration:collect", post(handlers::calibration_collect))
        .route("/calibration:result", post(handlers::calibration_result))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
