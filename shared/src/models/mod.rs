//! Data models
//!
//! Shared between the analytics server and its clients (via API).

pub mod order;

// Re-exports
pub use order::*;
