//! # Ward Common
//!
//! Common types shared across the Ward node supervisor crates.
//!
//! This crate provides the foundational pieces that every other Ward crate
//! builds upon: typed errors for artifact resolution and process control,
//! node and service identities, and the localized user-facing messages.

pub mod errors;
pub mod messages;
pub mod types;

// Re-export commonly used items
pub use errors::{ArtifactError, ArtifactResult, ProcessError, ProcessResult};
pub use messages::{Language, Message};
pub use types::{NodeIdentity, ServiceIdentity};
