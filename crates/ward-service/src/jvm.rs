//! Supervision of a JVM service started through the bundled launcher.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use ward_artifact::{build_classpath, ArtifactInfo, CLASSPATH_SEPARATOR};
use ward_common::{ArtifactError, Message, ProcessError, ServiceIdentity};
use ward_console::{
    spawn_capture, ConsoleRelay, LogLine, LogTargetRegistry, ServiceSnapshot, SharedSnapshot,
    StreamType,
};
use ward_process::{spawn, validate_executable, LaunchSpec, SupervisedProcess};
use ward_process_state::{ProcessState, ProcessStateMachine};

use crate::arguments::JvmLaunch;
use crate::config::ServiceConfiguration;
use crate::runtime::{NodeContext, RuntimeKind, ServiceDiagnostics, ServiceRuntime};

/// Commands that ask the launcher to shut the application down, in order.
const SHUTDOWN_COMMANDS: [&str; 2] = ["end", "stop"];

/// Supervisor of one JVM service process.
pub struct JvmService {
    context: NodeContext,
    config: ServiceConfiguration,
    identity: ServiceIdentity,
    snapshot: SharedSnapshot,
    targets: LogTargetRegistry,
    state_machine: ProcessStateMachine,
    process: Option<SupervisedProcess>,
    relay: Option<Arc<ConsoleRelay>>,
    last_error: Option<String>,
    wrapper_path: Option<PathBuf>,
    application_path: Option<PathBuf>,
    start_time: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for JvmService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JvmService")
            .field("service", &self.identity.name)
            .field("state", &self.state_machine.current_state())
            .field("pid", &self.process.as_ref().map(SupervisedProcess::pid))
            .field("targets", &self.targets.len())
            .finish()
    }
}

impl JvmService {
    pub fn new(context: NodeContext, config: ServiceConfiguration) -> Self {
        let identity = config.identity(&context.config.identity);
        let snapshot = Arc::new(RwLock::new(ServiceSnapshot::new(identity.clone())));

        Self {
            state_machine: ProcessStateMachine::new(&identity.name),
            context,
            config,
            identity,
            snapshot,
            targets: LogTargetRegistry::new(),
            process: None,
            relay: None,
            last_error: None,
            wrapper_path: None,
            application_path: None,
            start_time: None,
        }
    }

    /// Shared snapshot of this service, as carried by console events.
    pub fn snapshot(&self) -> ServiceSnapshot {
        self.snapshot.read().clone()
    }

    fn interpreter(&self) -> &str {
        self.config
            .java_command
            .as_deref()
            .unwrap_or(&self.context.config.java_command)
    }

    fn publish(&self) {
        let pid = self.process.as_ref().map(SupervisedProcess::pid);
        self.snapshot
            .write()
            .update(self.state_machine.current_state(), pid);
    }

    fn fail(&mut self, reason: String) {
        if let Err(e) = self.state_machine.transition_to_failed(reason.clone()) {
            warn!(service = %self.identity.name, error = %e, "Unable to record failure");
        }
        self.last_error = Some(reason);
        self.publish();
    }

    fn report_artifact_error(&self, error: &ArtifactError) {
        let language = &self.context.config.language;
        match error {
            ArtifactError::ArtifactNotFound {
                environment,
                directory,
            } => {
                let message = Message::ApplicationArchiveNotFound {
                    service: self.identity.name.clone(),
                    environment: environment.clone(),
                    directory: directory.clone(),
                };
                error!(service = %self.identity.name, "{}", message.render(language));
            }
            ArtifactError::ResourceMissing { resource } => {
                let message = Message::LauncherMissing {
                    resource: resource.clone(),
                };
                error!(service = %self.identity.name, "{}", message.render(language));
            }
            other => error!(
                service = %self.identity.name,
                directory = %self.config.directory.display(),
                category = other.category(),
                error = %other,
                "Unable to resolve service artifacts"
            ),
        }
    }

    fn resolve_artifacts(&self) -> Result<(ArtifactInfo, ArtifactInfo), ArtifactError> {
        let wrapper = self.context.resolver.resolve_wrapper()?;
        let application = self
            .context
            .resolver
            .resolve_application(&self.identity.environment, &self.config.directory)?;
        Ok((wrapper, application))
    }

    fn launch_spec(&self, wrapper: &ArtifactInfo, application: &ArtifactInfo, classpath: &str) -> LaunchSpec {
        let node = &self.context.config;
        let environment_arguments = node
            .environment_type(&self.identity.environment)
            .map(|t| t.default_process_arguments.as_slice())
            .unwrap_or_default();

        let mut args = JvmLaunch {
            interpreter: self.interpreter(),
            node_jvm_options: &node.default_jvm_options,
            service_jvm_options: &self.config.process.jvm_options,
            max_heap_memory_mb: self.config.process.max_heap_memory_mb,
            language: &node.language,
            classpath,
            host: &self.identity.host,
            port: self.identity.port,
            wrapper,
            application,
            environment_arguments,
            process_parameters: &self.config.process.process_parameters,
        }
        .arguments();
        let program = args.remove(0);

        LaunchSpec {
            program,
            args,
            working_directory: Some(self.config.directory.clone()),
            environment: self
                .config
                .process
                .environment_variables
                .iter()
                .map(|(key, value)| (key.to_uppercase(), value.clone()))
                .collect(),
        }
    }

    fn attach_console(&mut self, process: &mut SupervisedProcess) {
        let relay = Arc::new(ConsoleRelay::new(
            self.context.config.identity.clone(),
            self.snapshot.clone(),
            self.targets.clone(),
            self.context.events.clone(),
            self.context.sender.clone(),
            self.context.config.relay_config(),
        ));

        if let Some(stdout) = process.take_stdout() {
            self.capture(StreamType::Stdout, stdout, &relay);
        }
        if let Some(stderr) = process.take_stderr() {
            self.capture(StreamType::Stderr, stderr, &relay);
        }

        self.relay = Some(relay);
    }

    fn capture<R>(&self, stream: StreamType, reader: R, relay: &Arc<ConsoleRelay>)
    where
        R: Read + Send + 'static,
    {
        if let Err(e) = spawn_capture(&self.identity.name, stream, reader, relay.clone()) {
            warn!(
                service = %self.identity.name,
                stream = %stream,
                error = %e,
                "Unable to start console capture"
            );
        }
    }
}

impl ServiceRuntime for JvmService {
    fn runtime(&self) -> RuntimeKind {
        RuntimeKind::Jvm
    }

    fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    fn log_targets(&self) -> &LogTargetRegistry {
        &self.targets
    }

    fn start(&mut self) {
        if !self.state_machine.can_start() {
            warn!(
                service = %self.identity.name,
                state = %self.state_machine.current_state(),
                "Start ignored, service is not startable in its current state"
            );
            return;
        }
        if let Err(e) = self.state_machine.transition_to_starting() {
            warn!(service = %self.identity.name, error = %e, "Start ignored");
            return;
        }
        self.last_error = None;
        self.publish();

        if let Some(preparer) = self.context.preparer.clone() {
            if let Err(e) = preparer.configure(&self.identity, &self.config.directory) {
                error!(
                    service = %self.identity.name,
                    directory = %self.config.directory.display(),
                    error = %e,
                    "Configuration preparation failed"
                );
                self.fail(format!("configuration preparation failed: {}", e));
                return;
            }
        }

        self.context.events.pre_process_start(&self.snapshot());

        let (wrapper, application) = match self.resolve_artifacts() {
            Ok(artifacts) => artifacts,
            Err(e) => {
                self.report_artifact_error(&e);
                self.fail(e.to_string());
                return;
            }
        };
        self.wrapper_path = Some(wrapper.absolute_path.clone());
        self.application_path = Some(application.absolute_path.clone());

        let mut classpath = match build_classpath(&wrapper.absolute_path, &self.context.config.library_directory) {
            Ok(fragment) => fragment,
            Err(e) => {
                self.report_artifact_error(&e);
                self.fail(e.to_string());
                return;
            }
        };
        classpath.push_str(&wrapper.absolute_path.to_string_lossy());
        debug!(
            service = %self.identity.name,
            entries = classpath.split(CLASSPATH_SEPARATOR).count(),
            "Classpath assembled"
        );

        if let Err(e) = validate_executable(self.interpreter()) {
            error!(service = %self.identity.name, error = %e, "Invalid interpreter");
            self.fail(e.to_string());
            return;
        }

        let spec = self.launch_spec(&wrapper, &application, &classpath);
        let mut process = match spawn(&self.identity.name, &spec) {
            Ok(process) => process,
            Err(e) => {
                error!(
                    service = %self.identity.name,
                    directory = %self.config.directory.display(),
                    command = %spec.command_line(),
                    error = %e,
                    "Unable to start service process"
                );
                self.fail(e.to_string());
                return;
            }
        };

        self.attach_console(&mut process);
        let pid = process.pid();
        self.start_time = Some(process.started_at());
        self.process = Some(process);

        if let Err(e) = self.state_machine.transition_to_running() {
            warn!(service = %self.identity.name, error = %e, "Unexpected state after spawn");
        }
        self.publish();

        info!(
            service = %self.identity.name,
            pid,
            application = %application.file_name(),
            "Service process started"
        );
        self.context.events.post_process_start(&self.snapshot());
    }

    fn stop(&mut self) {
        let Some(mut process) = self.process.take() else {
            debug!(service = %self.identity.name, "Stop ignored, no process attached");
            return;
        };

        if let Err(e) = self.state_machine.transition_to_stopping() {
            warn!(service = %self.identity.name, error = %e, "Stopping from unexpected state");
        }
        self.snapshot
            .write()
            .update(self.state_machine.current_state(), Some(process.pid()));

        for command in SHUTDOWN_COMMANDS {
            if let Err(e) = process.send_line(command) {
                debug!(service = %self.identity.name, command, error = %e, "Unable to send shutdown command");
            }
        }

        let timeout = self.context.config.process_termination_timeout;
        let exited = match process.wait_for_exit(timeout) {
            Ok(Some(status)) => {
                info!(service = %self.identity.name, code = ?status.code(), "Service process exited");
                true
            }
            Ok(None) => {
                warn!(
                    service = %self.identity.name,
                    timeout_ms = timeout.as_millis() as u64,
                    "Service process did not exit in time, killing it"
                );
                false
            }
            Err(e) => {
                let e = ProcessError::io(&self.identity.name, &e);
                warn!(service = %self.identity.name, error = %e, "Waiting for service process failed, killing it");
                false
            }
        };

        if !exited {
            if let Err(e) = process.force_kill() {
                warn!(service = %self.identity.name, error = %e, "Forced termination failed");
            }
            process.detach_reaper();
        }

        let reason = if exited { "exited" } else { "killed" };
        if let Err(e) = self.state_machine.transition_to_stopped(reason) {
            warn!(service = %self.identity.name, error = %e, "Unexpected state after stop");
        }
        self.publish();
    }

    fn run_command(&mut self, command: &str) {
        match self.process.as_mut() {
            Some(process) => {
                if let Err(e) = process.send_line(command) {
                    debug!(service = %self.identity.name, error = %e, "Unable to send command");
                }
            }
            None => debug!(service = %self.identity.name, "Command ignored, no process attached"),
        }
    }

    fn alive(&self) -> bool {
        self.process.as_ref().is_some_and(SupervisedProcess::is_alive)
    }

    fn state(&self) -> ProcessState {
        self.state_machine.current_state()
    }

    fn diagnostics(&self) -> ServiceDiagnostics {
        ServiceDiagnostics {
            service: self.identity.name.clone(),
            runtime: RuntimeKind::Jvm,
            state: self.state_machine.current_state(),
            alive: self.alive(),
            process_id: self.process.as_ref().map(SupervisedProcess::pid),
            start_time: self.start_time,
            last_error: self
                .last_error
                .clone()
                .or_else(|| self.state_machine.last_failure_reason().map(str::to_string)),
            failure_count: self.state_machine.count_transitions_to(ProcessState::Failed),
            wrapper_path: self.wrapper_path.clone(),
            application_path: self.application_path.clone(),
            relay: self.relay.as_ref().map(|r| r.status()),
        }
    }

    fn cached_log_lines(&self) -> Vec<LogLine> {
        self.relay
            .as_ref()
            .map(|r| r.cache().snapshot())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use ward_console::{ChannelError, ChannelMessage, ChannelMessageSender, ConsoleLineEvent, ServiceEventSink};

    struct Quiet;

    impl ServiceEventSink for Quiet {
        fn pre_process_start(&self, _service: &ServiceSnapshot) {}
        fn post_process_start(&self, _service: &ServiceSnapshot) {}
        fn console_line(&self, _channel: &str, _event: &ConsoleLineEvent) {}
    }

    impl ChannelMessageSender for Quiet {
        fn send(&self, _message: ChannelMessage) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    fn service(java_command: Option<&str>) -> JvmService {
        let node = NodeConfig::load_from_string(
            "identity: node-1\njava_command: /usr/bin/java\nlauncher_path: /nonexistent/wrapper.jar\n",
        )
        .unwrap();
        let mut config = ServiceConfiguration::load_from_string(
            "name: Proxy-1\nenvironment: VELOCITY\nport: 25565\ndirectory: /nonexistent/Proxy-1\n",
        )
        .unwrap();
        config.java_command = java_command.map(str::to_string);
        let quiet = Arc::new(Quiet);
        let context = NodeContext::new(node, quiet.clone(), quiet).unwrap();
        JvmService::new(context, config)
    }

    #[test]
    fn test_interpreter_override() {
        assert_eq!(service(None).interpreter(), "/usr/bin/java");
        assert_eq!(service(Some("/opt/jdk21/bin/java")).interpreter(), "/opt/jdk21/bin/java");
    }

    #[test]
    fn test_idle_service_ignores_stop_and_commands() {
        let mut service = service(None);
        service.stop();
        service.run_command("list");
        assert_eq!(service.state(), ProcessState::Idle);
        assert!(!service.alive());
        assert!(service.cached_log_lines().is_empty());

        let diagnostics = service.diagnostics();
        assert_eq!(diagnostics.runtime, RuntimeKind::Jvm);
        assert!(diagnostics.relay.is_none());
    }

    #[test]
    fn test_snapshot_tracks_failure() {
        let mut service = service(None);
        service.start();
        assert_eq!(service.state(), ProcessState::Failed);
        assert_eq!(service.snapshot().state, ProcessState::Failed);
        assert_eq!(service.snapshot().identity.node.as_str(), "node-1");
        assert_eq!(service.diagnostics().failure_count, 1);

        service.start();
        assert_eq!(service.diagnostics().failure_count, 2);
    }
}
