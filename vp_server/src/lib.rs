//! HTTP and WebSocket server for shared card tables.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod persistence;
