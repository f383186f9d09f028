mod routes;
mod server;
mod telemetry;
mod views;

pub mod app;
pub mod backend;
pub mod client;
pub mod config;
pub mod models;
pub mod router;

pub use app::start_app;
pub use backend::{DetectionBackend, DetectionError};
pub use client::DetectionClient;
pub use server::{HttpServer, SharedState};
