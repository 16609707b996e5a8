//! Observability: structured logging through `tracing`.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};
