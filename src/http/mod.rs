//! HTTP transport and the ambient pieces the binaries share.

pub mod client;
pub mod config;
pub mod logging;
pub mod router;
pub mod shutdown;

pub use client::{FetchOutcome, QuoteClient};
pub use config::{ClientArgs, ConfigError, ServerArgs, ServerSettings};
pub use logging::{init_logging, LogFormat};
pub use router::router;
pub use shutdown::ShutdownSignals;
