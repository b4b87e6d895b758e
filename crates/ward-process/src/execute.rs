//! Process execution primitives.
//!
//! Spawns a child with all three standard streams piped and keeps the handle
//! together with its stdin so commands can be injected later.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use tracing::debug;
use ward_common::{ProcessError, ProcessResult};

/// Everything needed to launch a child process.
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
    /// Added on top of the inherited environment.
    pub environment: Vec<(String, String)>,
}

impl LaunchSpec {
    /// The full command line, program first, joined by spaces.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A spawned child owned by a supervisor.
///
/// The child handle sits behind a mutex so liveness can be queried through a
/// shared reference while the owner keeps exclusive access to stdin.
#[derive(Debug)]
pub struct SupervisedProcess {
    pub(crate) id: String,
    pub(crate) pid: u32,
    pub(crate) child: Mutex<Child>,
    stdin: Option<ChildStdin>,
    started_at: DateTime<Utc>,
}

/// Spawn `spec` with piped stdin, stdout and stderr.
///
/// `id` names the owning service in errors and logs.
pub fn spawn(id: &str, spec: &LaunchSpec) -> ProcessResult<SupervisedProcess> {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(ref wd) = spec.working_directory {
        cmd.current_dir(wd);
    }

    for (key, value) in &spec.environment {
        cmd.env(key, value);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| ProcessError::spawn_failed(id, e.to_string()))?;

    let pid = child.id();
    let stdin = child.stdin.take();
    debug!(service = %id, pid, "Child process spawned");

    Ok(SupervisedProcess {
        id: id.to_string(),
        pid,
        child: Mutex::new(child),
        stdin,
        started_at: Utc::now(),
    })
}

impl SupervisedProcess {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Take the stdout pipe; `None` once taken.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.get_mut().stdout.take()
    }

    /// Take the stderr pipe; `None` once taken.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.get_mut().stderr.take()
    }

    /// Write `line` followed by `\n` to the child's stdin and flush.
    pub fn send_line(&mut self, line: &str) -> io::Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "stdin of the process is closed")
        })?;

        stdin.write_all(format!("{}\n", line).as_bytes())?;
        stdin.flush()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sh(script: &str, dir: &std::path::Path) -> LaunchSpec {
        LaunchSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            working_directory: Some(dir.to_path_buf()),
            environment: Vec::new(),
        }
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let spec = LaunchSpec {
            program: "/definitely/not/a/real/binary".to_string(),
            ..Default::default()
        };
        let err = spawn("missing", &spec).unwrap_err();
        assert!(matches!(err, ProcessError::SpawnFailed { .. }));
    }

    #[test]
    fn test_send_line_reaches_child() {
        let dir = tempfile::tempdir().unwrap();
        let spec = sh(r#"read a; read b; printf '%s|%s' "$a" "$b" > out.txt"#, dir.path());

        let mut process = spawn("echo", &spec).unwrap();
        process.send_line("end").unwrap();
        process.send_line("stop").unwrap();

        let status = process.wait_for_exit(Duration::from_secs(10)).unwrap();
        assert!(status.is_some());
        let written = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(written, "end|stop");
    }

    #[test]
    fn test_environment_and_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = sh(r#"printf '%s' "$WARD_TEST_VALUE" > env.txt"#, dir.path());
        spec.environment.push(("WARD_TEST_VALUE".to_string(), "mixed Case".to_string()));

        let process = spawn("env", &spec).unwrap();
        process.wait_for_exit(Duration::from_secs(10)).unwrap();
        let written = std::fs::read_to_string(dir.path().join("env.txt")).unwrap();
        assert_eq!(written, "mixed Case");
    }

    #[test]
    fn test_command_line() {
        let spec = LaunchSpec {
            program: "java".to_string(),
            args: vec!["-Xmx512M".to_string(), "-jar".to_string()],
            ..Default::default()
        };
        assert_eq!(spec.command_line(), "java -Xmx512M -jar");
    }
}
