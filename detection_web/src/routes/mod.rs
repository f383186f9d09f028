mod health;
mod metrics;

use crate::server::SharedState;
use axum::{routing::get, Router};

pub use health::healthcheck;
pub use metrics::metrics_handler;

const HEALTH_PATH: &str = "/health";
const METRICS_PATH: &str = "/metrics";

/// Paths taken at the server root, outside the route table.
pub const ROOT_PATHS: [&str; 2] = [HEALTH_PATH, METRICS_PATH];

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route(HEALTH_PATH, get(healthcheck))
        .route(METRICS_PATH, get(metrics_handler))
}
