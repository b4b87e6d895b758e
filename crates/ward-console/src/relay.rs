//! Console line fan-out.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use ward_common::NodeIdentity;

use crate::cache::LogCache;
use crate::events::{ConsoleLineEvent, ServiceEventSink, SharedSnapshot};
use crate::network::{ChannelMessageSender, ConsoleLinePayload};
use crate::targets::LogTargetRegistry;
use crate::types::{LogLine, StreamType};

pub const DEFAULT_MAX_CACHED_LOG_LINES: usize = 128;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub max_cached_log_lines: usize,
    /// Echo stderr lines to the node's own log output.
    pub print_error_stream_to_console: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_cached_log_lines: DEFAULT_MAX_CACHED_LOG_LINES,
            print_error_stream_to_console: false,
        }
    }
}

/// Relay counters and cache state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStatus {
    pub lines_relayed: u64,
    pub local_deliveries: u64,
    pub remote_messages: u64,
    pub send_failures: u64,
    pub cached_lines: usize,
    pub targets: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Delivers every captured line of one service to its log targets.
///
/// Shared between the stdout and stderr capture threads.
pub struct ConsoleRelay {
    local_node: NodeIdentity,
    snapshot: SharedSnapshot,
    targets: LogTargetRegistry,
    events: Arc<dyn ServiceEventSink>,
    sender: Arc<dyn ChannelMessageSender>,
    cache: LogCache,
    config: RelayConfig,
    lines_relayed: AtomicU64,
    local_deliveries: AtomicU64,
    remote_messages: AtomicU64,
    send_failures: AtomicU64,
    last_activity: RwLock<Option<DateTime<Utc>>>,
}

impl std::fmt::Debug for ConsoleRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleRelay")
            .field("local_node", &self.local_node)
            .field("targets", &self.targets.len())
            .field("config", &self.config)
            .field("lines_relayed", &self.lines_relayed.load(Ordering::Relaxed))
            .finish()
    }
}

impl ConsoleRelay {
    pub fn new(
        local_node: NodeIdentity,
        snapshot: SharedSnapshot,
        targets: LogTargetRegistry,
        events: Arc<dyn ServiceEventSink>,
        sender: Arc<dyn ChannelMessageSender>,
        config: RelayConfig,
    ) -> Self {
        Self {
            local_node,
            snapshot,
            targets,
            events,
            sender,
            cache: LogCache::new(config.max_cached_log_lines),
            config,
            lines_relayed: AtomicU64::new(0),
            local_deliveries: AtomicU64::new(0),
            remote_messages: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
            last_activity: RwLock::new(None),
        }
    }

    pub fn targets(&self) -> &LogTargetRegistry {
        &self.targets
    }

    pub fn cache(&self) -> &LogCache {
        &self.cache
    }

    /// Fan one line out to every target registered right now.
    pub fn on_line(&self, line: LogLine) {
        let service = self.snapshot.read().clone();

        if self.config.print_error_stream_to_console && line.stream == StreamType::Stderr {
            warn!(service = %service.identity.name, "{}", line.text);
        }

        for target in self.targets.snapshot() {
            if target.destination == self.local_node {
                let event = ConsoleLineEvent {
                    service: service.clone(),
                    line: line.text.clone(),
                    stream: line.stream,
                };
                self.events.console_line(&target.component_id, &event);
                self.local_deliveries.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            let payload = ConsoleLinePayload {
                service: service.clone(),
                component_id: target.component_id.clone(),
                line: line.text.clone(),
                stderr: line.is_stderr(),
            };
            let sent = payload
                .into_message(target.destination.clone())
                .and_then(|message| self.sender.send(message));

            match sent {
                Ok(()) => {
                    self.remote_messages.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.send_failures.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        service = %service.identity.name,
                        target = %target.destination,
                        component = %target.component_id,
                        error = %e,
                        "Console line not sent"
                    );
                }
            }
        }

        self.cache.push(line);
        self.lines_relayed.fetch_add(1, Ordering::Relaxed);
        *self.last_activity.write() = Some(Utc::now());
    }

    pub fn status(&self) -> RelayStatus {
        RelayStatus {
            lines_relayed: self.lines_relayed.load(Ordering::Relaxed),
            local_deliveries: self.local_deliveries.load(Ordering::Relaxed),
            remote_messages: self.remote_messages.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            cached_lines: self.cache.len(),
            targets: self.targets.len(),
            last_activity: *self.last_activity.read(),
        }
    }
}
