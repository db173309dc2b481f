//! # tokengate-facade
//!
//! The RPC-facing side of the session cache.
//!
//! ## Modules
//!
//! - `dto`: request and response types with typed failure codes
//! - `service`: the `SessionFacade` contract and the in-process `CacheFacade`
//! - `server`: axum router exposing the facade over HTTP/JSON
//! - `client`: reqwest-based `RemoteCacheFacade`

pub mod client;
pub mod dto;
pub mod server;
pub mod service;

pub use client::RemoteCacheFacade;
pub use server::{rpc_router, run_cache_service};
pub use service::{CacheFacade, SessionFacade};
