//! SketchSolve application shell.
//!
//! A headless host that reads pointer and tool commands as JSON lines,
//! drives the engine, and exchanges extractions with the solver service.

pub mod commands;
pub mod host;

pub use commands::HostCommand;
pub use host::{Flow, Host, HostError};
