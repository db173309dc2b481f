//! # tokengate-api
//!
//! HTTP gateway for TokenGate built on Axum.
//!
//! Provides the login/logout endpoints, the session gate middleware that
//! protects every other route, the `AuthUser` extractor, DTOs, and error
//! mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_gateway};
pub use middleware::auth::{AuthGate, GateRejection};
pub use state::AppState;
