//! # Runtime
//!
//! Process start-up: crypto provider, logging, metrics, provider registration
//! and the HTTP server.

mod initialization;

pub use initialization::{init_tracing, initialize, InitializationResult};
