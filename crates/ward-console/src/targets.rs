//! Registry of log targets attached to one service.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::types::LogTarget;

/// Ordered, de-duplicated set of log targets.
///
/// Cloning shares the underlying set, so the orchestrator can register and
/// unregister targets while the relay is fanning out.
#[derive(Debug, Clone, Default)]
pub struct LogTargetRegistry {
    targets: Arc<RwLock<Vec<LogTarget>>>,
}

impl LogTargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target; returns `false` if it was already registered.
    pub fn add(&self, target: LogTarget) -> bool {
        let mut targets = self.targets.write();
        if targets.contains(&target) {
            return false;
        }
        targets.push(target);
        true
    }

    /// Unregister a target; returns `false` if it was not registered.
    pub fn remove(&self, target: &LogTarget) -> bool {
        let mut targets = self.targets.write();
        let before = targets.len();
        targets.retain(|t| t != target);
        targets.len() != before
    }

    /// Copy of the current targets in registration order.
    pub fn snapshot(&self) -> Vec<LogTarget> {
        self.targets.read().clone()
    }

    pub fn len(&self) -> usize {
        self.targets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.read().is_empty()
    }

    pub fn clear(&self) {
        self.targets.write().clear();
    }
}
