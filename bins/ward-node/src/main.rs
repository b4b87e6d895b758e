use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use ward_console::{
    ChannelError, ChannelMessage, ChannelMessageSender, ConsoleLineEvent, LogTarget,
    ServiceEventSink, ServiceSnapshot, StreamType,
};
use ward_process_state::ProcessState;
use ward_service::{create_runtime, NodeConfig, NodeContext, ServiceConfiguration};

/// Console channel used for this terminal.
const TERMINAL_COMPONENT: &str = "terminal";

/// Stdin line that stops the service and exits.
const SHUTDOWN_LINE: &str = ".shutdown";

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Ward node - supervise a JVM service from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Node configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    node: String,

    /// Service configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    service: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Run duration in seconds (for testing)
    #[arg(long)]
    run_duration: Option<u64>,
}

/// Prints console lines and lifecycle events through tracing.
struct TracingEventSink;

impl ServiceEventSink for TracingEventSink {
    fn pre_process_start(&self, service: &ServiceSnapshot) {
        info!(service = %service.identity.name, "Preparing service start");
    }

    fn post_process_start(&self, service: &ServiceSnapshot) {
        info!(service = %service.identity.name, pid = ?service.pid, "Service started");
    }

    fn console_line(&self, _channel: &str, event: &ConsoleLineEvent) {
        match event.stream {
            StreamType::Stdout => info!("[{}] {}", event.service.identity.name, event.line),
            StreamType::Stderr => warn!("[{}] {}", event.service.identity.name, event.line),
        }
    }
}

/// Stand-in for the cluster network when a node runs on its own.
struct LoggingChannelSender;

impl ChannelMessageSender for LoggingChannelSender {
    fn send(&self, message: ChannelMessage) -> Result<(), ChannelError> {
        debug!(
            target_node = %message.target,
            channel = %message.channel,
            key = %message.key,
            bytes = message.payload.len(),
            "Dropping channel message, no cluster network attached"
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.debug)?;

    info!("Starting Ward node");
    info!("Node config: {}, service config: {}", args.node, args.service);

    let node = NodeConfig::load_from_file(&args.node)?;
    let service = ServiceConfiguration::load_from_file(&args.service)?;
    service.validate_for(&node)?;

    let local_node = node.identity.clone();
    let context = NodeContext::new(node, Arc::new(TracingEventSink), Arc::new(LoggingChannelSender))
        .context("Failed to locate the bundled launcher")?;
    let mut runtime = create_runtime(&context, service)?;
    runtime
        .log_targets()
        .add(LogTarget::new(local_node, TERMINAL_COMPONENT));

    runtime.start();
    if runtime.state() != ProcessState::Running {
        let diagnostics = runtime.diagnostics();
        error!("Service did not start: {:?}", diagnostics.last_error);
        return Err(anyhow::anyhow!(
            "Start failed: {}",
            diagnostics.last_error.unwrap_or_else(|| "unknown error".to_string())
        ));
    }

    let commands = spawn_stdin_reader()?;
    let deadline = args.run_duration.map(|secs| {
        info!("Running for {} seconds (test mode)", secs);
        Instant::now() + Duration::from_secs(secs)
    });

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("Run duration elapsed");
            break;
        }
        if !runtime.alive() {
            warn!("Service process exited on its own");
            break;
        }

        match commands.recv_timeout(POLL_INTERVAL) {
            Ok(line) if line.trim() == SHUTDOWN_LINE => break,
            Ok(line) => runtime.run_command(&line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("Standard input closed");
                break;
            }
        }
    }

    info!("Stopping service...");
    runtime.stop();
    info!("Service stopped, state: {}", runtime.state());

    Ok(())
}

fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to spawn stdin reader")?;
    Ok(rx)
}

fn initialize_logging(debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .with_thread_ids(true)
        .init();

    Ok(())
}
