//! Photowall Infrastructure Library
//!
//! Shared infrastructure used by the API server and the derivation worker:
//! - Tracing initialization
//! - Request ID middleware
//! - Shutdown signal handling
//! - HTTP error body

pub mod error;
pub mod middleware;
pub mod shutdown;
pub mod telemetry;

pub use error::ErrorResponse;
pub use middleware::{get_request_id, request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use shutdown::shutdown_signal;
pub use telemetry::{init_telemetry, shutdown_telemetry};
