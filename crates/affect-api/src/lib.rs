//! Axum HTTP API for affect and attention prediction.
//!
//! This crate provides:
//! - `/predict` for MP4/AVI clips and `/predict_frame` for still images
//! - Liveness and readiness probes
//! - Per-IP rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{bootstrap, AppState};
