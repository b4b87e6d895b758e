//! # Ward Service
//!
//! Supervision of one service process per [`ServiceRuntime`].
//!
//! ```text
//! node orchestrator
//!       ↓ create_runtime(context, service config)
//! ServiceRuntime trait
//!       ↓ implemented by
//! JvmService ── ArtifactResolver, classpath, arguments
//!       ↓ spawns
//! SupervisedProcess ── capture threads → ConsoleRelay
//! ```

pub mod arguments;
pub mod config;
pub mod hooks;
pub mod jvm;
pub mod runtime;

pub use config::{EnvironmentType, NodeConfig, ProcessConfiguration, ServiceConfiguration};
pub use hooks::ConfigurationPreparer;
pub use jvm::JvmService;
pub use runtime::{create_runtime, NodeContext, RuntimeKind, ServiceDiagnostics, ServiceRuntime};
