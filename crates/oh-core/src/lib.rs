//! OpenHedgehog bootstrap core.
//!
//! This library provides the startup layer shared by every entry point:
//! - Argument normalization and read-only flag inspection
//! - Global `--dev` / `--profile` parsing and profile environment export
//! - Profile-aware command rendering for hints
//! - Port availability probing and listener diagnostics
//! - Exit codes and structured logging
//!
//! The binary entry point is in `main.rs`.

pub mod bootstrap;
pub mod cli;
pub mod collect;
pub mod exit_codes;
pub mod logging;
pub mod ports;

pub use bootstrap::{bootstrap, BootstrapContext};
