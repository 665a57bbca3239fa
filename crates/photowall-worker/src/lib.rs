//! Photowall Worker Library
//!
//! The work queue that carries filenames from the upload path to derivation workers,
//! the best-effort dispatcher used by the API, and the worker loop that consumes it.

pub mod consumer;
pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod queue;

pub use consumer::DerivationWorker;
pub use dispatcher::WorkDispatcher;
pub use error::QueueError;
pub use memory::MemoryWorkQueue;
pub use postgres::PgWorkQueue;
pub use queue::{connect_queue, WorkQueue};
