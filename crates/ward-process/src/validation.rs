//! Validation utilities for launch inputs.

use ward_common::{ProcessError, ProcessResult};

/// Validate that an executable name or path is usable.
pub fn validate_executable(path: &str) -> ProcessResult<()> {
    if path.trim().is_empty() {
        return Err(ProcessError::configuration(
            "validation",
            "Executable path cannot be empty",
        ));
    }

    Ok(())
}

/// Validate a service name, which also names its directory and threads.
pub fn validate_service_name(name: &str) -> ProcessResult<()> {
    if name.is_empty() {
        return Err(ProcessError::configuration(
            "validation",
            "Service name cannot be empty",
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ProcessError::configuration(
            name,
            "Service name can only contain alphanumeric characters, dots, hyphens, and underscores",
        ));
    }

    Ok(())
}
