//! # Ward Process
//!
//! Low-level process operations for the Ward supervisor.
//!
//! This crate provides cross-platform primitives for:
//! - Spawning a child with piped standard streams
//! - Writing newline-terminated commands to the child's stdin
//! - Bounded waiting for exit and forced termination
//! - Liveness checks
//! - Launch input validation

pub mod check;
pub mod execute;
pub mod terminate;
pub mod validation;

// Re-export main types
pub use execute::*;
pub use validation::*;
