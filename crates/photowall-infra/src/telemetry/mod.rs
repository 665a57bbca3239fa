//! Tracing initialization
//!
//! `RUST_LOG` overrides the default filter. `LOG_FORMAT=json` switches to structured
//! JSON lines for log shippers.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry};
