//! Error types for the Ward supervisor.
//!
//! Two families exist: [`ArtifactError`] covers everything that can go wrong
//! while locating the launcher and application archives, and
//! [`ProcessError`] covers process control. Both are absorbed at the
//! supervisor boundary; they are logged and turned into state transitions
//! rather than propagated to the owning node.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for artifact resolution.
pub type ArtifactResult<T> = std::result::Result<T, ArtifactError>;

/// Errors raised while resolving launcher and application archives.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The launcher bundled with the supervisor could not be found.
    #[error("Bundled resource missing: {resource}")]
    ResourceMissing { resource: String },

    /// No archive in the service directory matches the environment.
    #[error("No application archive for environment {environment} found in {}", directory.display())]
    ArtifactNotFound {
        environment: String,
        directory: PathBuf,
    },

    /// The archive manifest is absent or lacks a required attribute.
    #[error("Invalid manifest in {}: {reason}", path.display())]
    ManifestInvalid { path: PathBuf, reason: String },

    /// The archive exists but could not be opened or read.
    #[error("Unable to read archive {}: {reason}", path.display())]
    ArchiveIo { path: PathBuf, reason: String },

    /// I/O error outside an archive (directory scans, path resolution).
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    pub fn resource_missing(resource: impl Into<String>) -> Self {
        Self::ResourceMissing {
            resource: resource.into(),
        }
    }

    pub fn not_found(environment: impl Into<String>, directory: impl AsRef<Path>) -> Self {
        Self::ArtifactNotFound {
            environment: environment.into(),
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn manifest_invalid(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::ManifestInvalid {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn archive_io(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::ArchiveIo {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Short machine-friendly category, used in diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ResourceMissing { .. } => "resource_missing",
            Self::ArtifactNotFound { .. } => "artifact_not_found",
            Self::ManifestInvalid { .. } => "manifest_invalid",
            Self::ArchiveIo { .. } => "archive_io",
            Self::Io { .. } => "io",
        }
    }
}

// ==============================================================================
// Process Control Errors
// ==============================================================================

/// Process-specific error types.
#[derive(Error, Debug, Clone)]
pub enum ProcessError {
    #[error("Process spawn failed: {id} - {reason}")]
    SpawnFailed { id: String, reason: String },

    #[error("Process state error: {id} - expected {expected}, got {actual}")]
    InvalidState {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("Process configuration error: {id} - {reason}")]
    Configuration { id: String, reason: String },

    #[error("Process I/O error: {id} - {reason}")]
    Io { id: String, reason: String },
}

impl ProcessError {
    pub fn spawn_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_state(
        id: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            id: id.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn configuration(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn io(id: impl Into<String>, error: &std::io::Error) -> Self {
        Self::Io {
            id: id.into(),
            reason: error.to_string(),
        }
    }
}

/// Result type for process operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_error_messages() {
        let err = ArtifactError::resource_missing("wrapper.jar");
        assert_eq!(err.to_string(), "Bundled resource missing: wrapper.jar");
        assert_eq!(err.category(), "resource_missing");

        let err = ArtifactError::not_found("MINECRAFT_SERVER", "/srv/lobby-1");
        assert!(err.to_string().contains("MINECRAFT_SERVER"));
        assert!(err.to_string().contains("/srv/lobby-1"));
    }

    #[test]
    fn test_io_error_keeps_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ArtifactError::io("/srv/Lobby-1", io);
        assert!(matches!(err, ArtifactError::Io { .. }));
        assert_eq!(err.category(), "io");
        assert_eq!(err.to_string(), "I/O error at /srv/Lobby-1: denied");
    }

    #[test]
    fn test_process_error_construction() {
        let error = ProcessError::spawn_failed("lobby-1", "executable not found");
        assert!(matches!(error, ProcessError::SpawnFailed { .. }));
        assert_eq!(
            error.to_string(),
            "Process spawn failed: lobby-1 - executable not found"
        );

        let error = ProcessError::invalid_state("lobby-1", "idle|stopped|failed", "running");
        assert!(error.to_string().contains("expected idle|stopped|failed"));
    }
}
