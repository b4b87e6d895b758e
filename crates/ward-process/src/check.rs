//! Process liveness checks.

use crate::execute::SupervisedProcess;
use tracing::debug;

impl SupervisedProcess {
    /// Whether the OS still reports the child as running.
    ///
    /// Non-blocking; reaps the child if it already exited.
    pub fn is_alive(&self) -> bool {
        match self.child.lock().try_wait() {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(e) => {
                debug!(service = %self.id, pid = self.pid, error = %e, "Unable to query process status");
                false
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use crate::execute::{spawn, LaunchSpec};
    use std::time::Duration;

    #[test]
    fn test_alive_until_killed() {
        let spec = LaunchSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 30".to_string()],
            ..Default::default()
        };
        let process = spawn("sleeper", &spec).unwrap();
        assert!(process.is_alive());

        process.force_kill().unwrap();
        process.wait_for_exit(Duration::from_secs(10)).unwrap();
        assert!(!process.is_alive());
    }
}
