//! Command-line interface
//!
//! Self-contained demos over an in-process node. State is
//! process-lifetime only, so each command builds, drives, and reports on
//! its own node.

pub mod commands;

pub use commands::{Command, Opt};
