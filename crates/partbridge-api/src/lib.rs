//! # partbridge-api
//!
//! HTTP surface of the preview service built on Axum: the conversion
//! endpoint, a health endpoint, CORS and request logging, and the mapping
//! from domain errors to `{ "error": ... }` responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
