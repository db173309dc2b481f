//! # tokengate-store
//!
//! Session store backends for TokenGate. Supports two modes:
//!
//! - **redis**: Redis-backed store using the [redis](https://crates.io/crates/redis) crate,
//!   with native key expiry and a server-side script for conditional writes
//! - **memory**: In-process store on a sharded map, for tests and single-node use
//!
//! The backend is selected at runtime based on configuration and wrapped in
//! a [`StoreManager`] that bounds every call with a timeout.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::StoreManager;
