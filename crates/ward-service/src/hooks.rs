//! Hooks run around a service start by downstream platform integrations.

use std::path::Path;
use ward_common::ServiceIdentity;

/// Rewrites platform-specific configuration files in a service directory
/// before the process is spawned.
pub trait ConfigurationPreparer: Send + Sync {
    fn configure(&self, service: &ServiceIdentity, directory: &Path) -> anyhow::Result<()>;
}
