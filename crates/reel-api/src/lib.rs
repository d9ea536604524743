//! Axum HTTP API server.
//!
//! Thin control surface over the generation pipeline: start a session,
//! poll its progress, and download the artifacts it produced.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
