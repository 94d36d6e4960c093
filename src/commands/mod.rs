//! CLI command implementations.

pub mod export;
pub mod worker;

pub use export::{ExportCommand, ExportOutput};
pub use worker::WorkerCommand;
