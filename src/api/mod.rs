//! HTTP and WebSocket surface.

pub mod routes;
mod ws;

pub use routes::{ApiError, ApiState, api_routes};
