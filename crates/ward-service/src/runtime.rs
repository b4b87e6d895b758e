//! The runtime trait every supervised service implements, and runtime selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use ward_artifact::ArtifactResolver;
use ward_common::{ProcessResult, ServiceIdentity};
use ward_console::{ChannelMessageSender, LogLine, LogTargetRegistry, RelayStatus, ServiceEventSink};
use ward_process::validate_service_name;
use ward_process_state::ProcessState;

use crate::config::{NodeConfig, ServiceConfiguration};
use crate::hooks::ConfigurationPreparer;
use crate::jvm::JvmService;

/// How a service process is launched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeKind {
    #[default]
    Jvm,
}

impl std::fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeKind::Jvm => write!(f, "jvm"),
        }
    }
}

/// Lifecycle control of one service process.
///
/// Start and stop failures are absorbed: they are logged and reflected in
/// [`state`](ServiceRuntime::state) and [`diagnostics`](ServiceRuntime::diagnostics)
/// rather than returned.
pub trait ServiceRuntime: Send {
    fn runtime(&self) -> RuntimeKind;

    fn identity(&self) -> &ServiceIdentity;

    /// Log targets receiving this service's console output.
    fn log_targets(&self) -> &LogTargetRegistry;

    /// Resolve, spawn and attach. Ignored unless the state allows a start.
    fn start(&mut self);

    /// Ask the process to shut down, killing it after the termination timeout.
    fn stop(&mut self);

    /// Write one command line to the process's stdin.
    fn run_command(&mut self, command: &str);

    /// Whether a process is attached and still running.
    fn alive(&self) -> bool;

    fn state(&self) -> ProcessState;

    fn diagnostics(&self) -> ServiceDiagnostics;

    /// Most recent console lines, oldest first.
    fn cached_log_lines(&self) -> Vec<LogLine>;
}

/// Service diagnostics information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDiagnostics {
    pub service: String,
    pub runtime: RuntimeKind,
    pub state: ProcessState,
    pub alive: bool,
    pub process_id: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    /// Description of the most recent failure, if any.
    pub last_error: Option<String>,
    /// Failed starts or stops within the retained transition history.
    pub failure_count: usize,
    pub wrapper_path: Option<PathBuf>,
    pub application_path: Option<PathBuf>,
    /// Counters of the current or most recent process's console relay.
    pub relay: Option<RelayStatus>,
}

/// Node-wide collaborators shared by every runtime on the node.
#[derive(Clone)]
pub struct NodeContext {
    pub config: Arc<NodeConfig>,
    pub resolver: Arc<ArtifactResolver>,
    pub events: Arc<dyn ServiceEventSink>,
    pub sender: Arc<dyn ChannelMessageSender>,
    pub preparer: Option<Arc<dyn ConfigurationPreparer>>,
}

impl NodeContext {
    /// Build a context whose resolver follows `config`.
    pub fn new(
        config: NodeConfig,
        events: Arc<dyn ServiceEventSink>,
        sender: Arc<dyn ChannelMessageSender>,
    ) -> io::Result<Self> {
        let resolver = ArtifactResolver::new(
            config.launcher_source()?,
            config.cache_directory.clone(),
            Arc::new(config.catalog()),
        );

        Ok(Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            events,
            sender,
            preparer: None,
        })
    }

    pub fn with_preparer(mut self, preparer: Arc<dyn ConfigurationPreparer>) -> Self {
        self.preparer = Some(preparer);
        self
    }
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("node", &self.config.identity)
            .field("has_preparer", &self.preparer.is_some())
            .finish()
    }
}

/// Create the runtime selected by `service.runtime`.
pub fn create_runtime(
    context: &NodeContext,
    service: ServiceConfiguration,
) -> ProcessResult<Box<dyn ServiceRuntime>> {
    validate_service_name(&service.name)?;

    match service.runtime {
        RuntimeKind::Jvm => Ok(Box::new(JvmService::new(context.clone(), service))),
    }
}
