//! OpenHedgehog common types and errors.
//!
//! This crate provides foundational types shared by the bootstrap crates:
//! - Environment snapshots with "defined and non-empty" semantics
//! - Process identity wrapper
//! - Common error types
//! - Output formats

pub mod env;
pub mod error;
pub mod id;
pub mod output;

pub use env::EnvMap;
pub use error::{Error, ErrorCategory, Result};
pub use id::ProcessId;
pub use output::OutputFormat;

/// Program name used when the invocation does not carry one.
pub const PROGRAM_NAME: &str = "openhedgehog";
