//! Version catalog: which named environments exist and which environment
//! type each one belongs to.

use serde::{Deserialize, Serialize};

/// A named environment (e.g. `paper`) and its type (e.g. `MINECRAFT_SERVER`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEnvironment {
    pub name: String,
    pub environment_type: String,
}

impl ServiceEnvironment {
    pub fn new(name: impl Into<String>, environment_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment_type: environment_type.into(),
        }
    }
}

/// Provider of known service environments.
pub trait VersionCatalog: Send + Sync {
    fn environments(&self) -> Vec<ServiceEnvironment>;

    /// Names of every environment declared with `environment_type`.
    fn environment_names_of_type(&self, environment_type: &str) -> Vec<String> {
        self.environments()
            .into_iter()
            .filter(|env| env.environment_type == environment_type)
            .map(|env| env.name)
            .collect()
    }
}

/// Catalog backed by a fixed list, usually taken from node configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticVersionCatalog {
    environments: Vec<ServiceEnvironment>,
}

impl StaticVersionCatalog {
    pub fn new(environments: Vec<ServiceEnvironment>) -> Self {
        Self { environments }
    }

    pub fn with_environment(mut self, environment: ServiceEnvironment) -> Self {
        self.environments.push(environment);
        self
    }
}

impl VersionCatalog for StaticVersionCatalog {
    fn environments(&self) -> Vec<ServiceEnvironment> {
        self.environments.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_names_of_type() {
        let catalog = StaticVersionCatalog::default()
            .with_environment(ServiceEnvironment::new("paper", "MINECRAFT_SERVER"))
            .with_environment(ServiceEnvironment::new("velocity", "VELOCITY"))
            .with_environment(ServiceEnvironment::new("spigot", "MINECRAFT_SERVER"));

        assert_eq!(
            catalog.environment_names_of_type("MINECRAFT_SERVER"),
            vec!["paper".to_string(), "spigot".to_string()]
        );
        assert!(catalog.environment_names_of_type("BUNGEECORD").is_empty());
    }
}
