//! # tokengate-core
//!
//! Core crate for TokenGate. Contains the session store trait,
//! configuration schemas, the typed request context attached by the
//! authentication gate, and the unified error system.
//!
//! This crate has **no** internal dependencies on other TokenGate crates.

pub mod config;
pub mod context;
pub mod error;
pub mod result;
pub mod traits;

pub use context::RequestContext;
pub use error::AppError;
pub use result::AppResult;
