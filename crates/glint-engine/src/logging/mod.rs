//! Logger setup.
//!
//! The crate itself only emits through the `log` facade; binaries call
//! [`init_logging`] once to route it through `env_logger`.

mod init;

pub use init::{init_logging, LoggingConfig};
