//! Process termination primitives.
//!
//! Graceful shutdown is driven by the supervisor over stdin; this module only
//! provides the bounded wait and the forced termination fallback.

use crate::execute::SupervisedProcess;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

impl SupervisedProcess {
    /// Block up to `timeout` for the child to exit.
    ///
    /// Returns `Ok(None)` if the timeout elapsed with the child still running.
    pub fn wait_for_exit(&self, timeout: Duration) -> io::Result<Option<ExitStatus>> {
        let mut child = self.child.lock();
        child.wait_timeout(timeout)
    }

    /// Force kill the child (SIGKILL on Unix, TerminateProcess on Windows).
    ///
    /// A child that already exited is not an error.
    pub fn force_kill(&self) -> io::Result<()> {
        let mut child = self.child.lock();
        match child.kill() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {
                debug!(service = %self.id, pid = self.pid, "Process already exited before kill");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Hand the child to a background thread that reaps it once it exits.
    ///
    /// Used after a forced kill so the handle can be dropped without leaving a
    /// zombie behind on Unix.
    pub fn detach_reaper(self) {
        let id = self.id;
        let pid = self.pid;
        let mut child = self.child.into_inner();

        let spawned = std::thread::Builder::new()
            .name(format!("{}-reaper", id))
            .spawn(move || match child.wait() {
                Ok(status) => info!(service = %id, pid, code = ?status.code(), "Process reaped"),
                Err(e) => warn!(service = %id, pid, error = %e, "Failed to reap process"),
            });

        if let Err(e) = spawned {
            warn!(pid, error = %e, "Unable to spawn reaper thread");
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use crate::execute::{spawn, LaunchSpec};
    use std::time::{Duration, Instant};

    fn sleeper() -> LaunchSpec {
        LaunchSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 30".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_wait_times_out_then_force_kill() {
        let process = spawn("sleeper", &sleeper()).unwrap();

        let started = Instant::now();
        let status = process.wait_for_exit(Duration::from_millis(200)).unwrap();
        assert!(status.is_none());
        assert!(started.elapsed() >= Duration::from_millis(200));

        process.force_kill().unwrap();
        let status = process.wait_for_exit(Duration::from_secs(10)).unwrap();
        assert!(status.is_some());
        assert!(!status.unwrap().success());
    }

    #[test]
    fn test_force_kill_after_exit_is_ok() {
        let spec = LaunchSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 0".to_string()],
            ..Default::default()
        };
        let process = spawn("quick", &spec).unwrap();
        process.wait_for_exit(Duration::from_secs(10)).unwrap();
        assert!(process.force_kill().is_ok());
    }

    #[test]
    fn test_detach_reaper_after_kill() {
        let process = spawn("sleeper", &sleeper()).unwrap();
        process.force_kill().unwrap();
        process.detach_reaper();
    }
}
