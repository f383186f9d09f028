use crate::server::SharedState;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct Status {
    status: String,
    base_path: String,
}

/// Liveness of this server only; backend reachability is reported on the home view.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<Status> {
    Json(Status {
        status: "Available".into(),
        base_path: state.routes.base().to_string(),
    })
}
