//! Logger initialization.
//!
//! The engine only talks to the `log` facade; the binary picks the backend
//! through [`init_logging`].

mod init;

pub use init::{init_logging, LoggingConfig};
