//! # Configuration
//!
//! Process-level settings loaded from environment variables.

mod runtime;

pub use runtime::{LogFormat, RuntimeConfig};
