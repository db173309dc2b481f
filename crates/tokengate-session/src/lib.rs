//! # tokengate-session
//!
//! Session lifecycle for TokenGate.
//!
//! ## Modules
//!
//! - `record`: the session record and its stored field encoding
//! - `cache`: write-once insert, lookup and idempotent delete with a fixed TTL

pub mod cache;
pub mod record;

pub use cache::SessionCache;
pub use record::{SessionIdentity, SessionRecord};
