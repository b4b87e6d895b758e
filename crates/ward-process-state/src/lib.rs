use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ward_common::errors::{ProcessError, ProcessResult};

const MAX_HISTORY: usize = 100;

/// Lifecycle state of a supervised service process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Never started
    Idle,
    /// Resolving artifacts and spawning
    Starting,
    /// Process spawned and attached
    Running,
    /// Shutdown protocol in progress
    Stopping,
    /// Process exited or was killed, handle cleared
    Stopped,
    /// Start aborted on an unrecoverable error
    Failed,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Idle => write!(f, "idle"),
            ProcessState::Starting => write!(f, "starting"),
            ProcessState::Running => write!(f, "running"),
            ProcessState::Stopping => write!(f, "stopping"),
            ProcessState::Stopped => write!(f, "stopped"),
            ProcessState::Failed => write!(f, "failed"),
        }
    }
}

impl ProcessState {
    /// States from which a new start is valid.
    pub fn is_restart_point(&self) -> bool {
        matches!(
            self,
            ProcessState::Idle | ProcessState::Stopped | ProcessState::Failed
        )
    }
}

/// Represents a state transition with timestamp and optional reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from_state: ProcessState,
    pub to_state: ProcessState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// State machine guarding the lifecycle of one supervised service.
#[derive(Debug, Clone)]
pub struct ProcessStateMachine {
    service: String,
    current_state: ProcessState,
    previous_state: Option<ProcessState>,
    state_history: Vec<StateTransition>,
    last_transition_time: DateTime<Utc>,
}

impl ProcessStateMachine {
    /// Create a new state machine for a service, starting in `Idle`.
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            current_state: ProcessState::Idle,
            previous_state: None,
            state_history: Vec::new(),
            last_transition_time: Utc::now(),
        }
    }

    pub fn current_state(&self) -> ProcessState {
        self.current_state
    }

    pub fn previous_state(&self) -> Option<ProcessState> {
        self.previous_state
    }

    pub fn state_history(&self) -> &[StateTransition] {
        &self.state_history
    }

    pub fn last_transition_time(&self) -> DateTime<Utc> {
        self.last_transition_time
    }

    /// Check if a transition from current state to target state is valid
    pub fn is_valid_transition(&self, target_state: ProcessState) -> bool {
        use ProcessState::*;

        match (self.current_state, target_state) {
            (Idle | Stopped | Failed, Starting) => true,
            (Starting, Running) => true,
            (Running, Stopping) => true,
            (Stopping, Stopped) => true,

            // Any in-flight step may fail
            (Starting | Running | Stopping, Failed) => true,

            _ => false,
        }
    }

    /// Transition to a new state with optional reason
    pub fn transition_to(
        &mut self,
        target_state: ProcessState,
        reason: Option<String>,
    ) -> ProcessResult<()> {
        if !self.is_valid_transition(target_state) {
            return Err(ProcessError::invalid_state(
                &self.service,
                format!("a state leading to {}", target_state),
                self.current_state.to_string(),
            ));
        }

        let from_state = self.current_state;
        let now = Utc::now();
        self.state_history.push(StateTransition {
            from_state,
            to_state: target_state,
            timestamp: now,
            reason,
        });
        if self.state_history.len() > MAX_HISTORY {
            self.state_history.remove(0);
        }

        self.previous_state = Some(from_state);
        self.current_state = target_state;
        self.last_transition_time = now;

        tracing::debug!(
            service = %self.service,
            from = %from_state,
            to = %target_state,
            "Service state transition"
        );

        Ok(())
    }

    pub fn transition_to_starting(&mut self) -> ProcessResult<()> {
        self.transition_to(ProcessState::Starting, Some("Process start requested".to_string()))
    }

    pub fn transition_to_running(&mut self) -> ProcessResult<()> {
        self.transition_to(ProcessState::Running, Some("Process spawned".to_string()))
    }

    pub fn transition_to_stopping(&mut self) -> ProcessResult<()> {
        self.transition_to(ProcessState::Stopping, Some("Process stop requested".to_string()))
    }

    pub fn transition_to_stopped(&mut self, reason: impl Into<String>) -> ProcessResult<()> {
        self.transition_to(ProcessState::Stopped, Some(reason.into()))
    }

    pub fn transition_to_failed(&mut self, reason: impl Into<String>) -> ProcessResult<()> {
        self.transition_to(ProcessState::Failed, Some(reason.into()))
    }

    pub fn can_start(&self) -> bool {
        self.current_state.is_restart_point()
    }

    pub fn last_transition(&self) -> Option<&StateTransition> {
        self.state_history.last()
    }

    /// Count transitions to a specific state
    pub fn count_transitions_to(&self, state: ProcessState) -> usize {
        self.state_history
            .iter()
            .filter(|t| t.to_state == state)
            .count()
    }

    /// Reason attached to the most recent transition into `Failed`, if any.
    pub fn last_failure_reason(&self) -> Option<&str> {
        self.state_history
            .iter()
            .rev()
            .find(|t| t.to_state == ProcessState::Failed)
            .and_then(|t| t.reason.as_deref())
    }
}
