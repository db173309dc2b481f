//! Core traits defined in `tokengate-core` and implemented by other crates.

pub mod store;

pub use store::{RecordFields, SessionStore};
