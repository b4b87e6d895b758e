//! Lifecycle and console events delivered on the local node.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ward_common::ServiceIdentity;
use ward_process_state::ProcessState;

use crate::types::StreamType;

/// Point-in-time view of a supervised service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub identity: ServiceIdentity,
    pub state: ProcessState,
    pub pid: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl ServiceSnapshot {
    pub fn new(identity: ServiceIdentity) -> Self {
        Self {
            identity,
            state: ProcessState::Idle,
            pid: None,
            timestamp: Utc::now(),
        }
    }

    /// Record a new state and pid, refreshing the timestamp.
    pub fn update(&mut self, state: ProcessState, pid: Option<u32>) {
        self.state = state;
        self.pid = pid;
        self.timestamp = Utc::now();
    }
}

/// Snapshot written by the supervisor and read by the relay.
pub type SharedSnapshot = Arc<RwLock<ServiceSnapshot>>;

/// A console line delivered to a local consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleLineEvent {
    pub service: ServiceSnapshot,
    pub line: String,
    pub stream: StreamType,
}

/// Receiver of service events on the local node.
pub trait ServiceEventSink: Send + Sync {
    /// Fired before artifacts are resolved for a start.
    fn pre_process_start(&self, service: &ServiceSnapshot);

    /// Fired once the process has been spawned.
    fn post_process_start(&self, service: &ServiceSnapshot);

    /// A console line for the consumer registered as `channel`.
    fn console_line(&self, channel: &str, event: &ConsoleLineEvent);
}
