use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use ward_artifact::{LauncherSource, ServiceEnvironment, StaticVersionCatalog};
use ward_common::{Language, NodeIdentity, ServiceIdentity};
use ward_console::RelayConfig;

use crate::runtime::RuntimeKind;

pub mod validation;

/// Node-wide settings shared by every service on this node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub identity: NodeIdentity,
    #[serde(default = "default_java_command")]
    pub java_command: String,
    #[serde(default)]
    pub default_jvm_options: Vec<String>,
    #[serde(
        default = "default_process_termination_timeout",
        with = "duration_serde"
    )]
    pub process_termination_timeout: Duration,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_cache_directory")]
    pub cache_directory: PathBuf,
    #[serde(default = "default_library_directory")]
    pub library_directory: PathBuf,
    /// Bundled launcher; defaults to `wrapper.jar` next to the executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launcher_path: Option<PathBuf>,
    #[serde(default = "default_max_cached_log_lines")]
    pub max_cached_log_lines: usize,
    #[serde(default)]
    pub print_error_stream_to_console: bool,
    #[serde(default)]
    pub environments: Vec<ServiceEnvironment>,
    #[serde(default)]
    pub environment_types: Vec<EnvironmentType>,
}

/// A kind of application (e.g. `MINECRAFT_SERVER`) and how it is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentType {
    pub name: String,
    #[serde(default)]
    pub default_process_arguments: Vec<String>,
}

/// One service instance to supervise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfiguration {
    pub name: String,
    /// Environment type name, see [`EnvironmentType`].
    pub environment: String,
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    pub directory: PathBuf,
    #[serde(default)]
    pub runtime: RuntimeKind,
    /// Overrides the node `java_command` for this service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_command: Option<String>,
    #[serde(default)]
    pub process: ProcessConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfiguration {
    #[serde(default = "default_max_heap_memory_mb")]
    pub max_heap_memory_mb: u32,
    #[serde(default)]
    pub jvm_options: Vec<String>,
    #[serde(default)]
    pub process_parameters: Vec<String>,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
}

impl Default for ProcessConfiguration {
    fn default() -> Self {
        Self {
            max_heap_memory_mb: default_max_heap_memory_mb(),
            jvm_options: Vec::new(),
            process_parameters: Vec::new(),
            environment_variables: BTreeMap::new(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read node config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: NodeConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML node configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_node_config(self)
    }

    pub fn environment_type(&self, name: &str) -> Option<&EnvironmentType> {
        self.environment_types.iter().find(|t| t.name == name)
    }

    pub fn catalog(&self) -> StaticVersionCatalog {
        StaticVersionCatalog::new(self.environments.clone())
    }

    pub fn launcher_source(&self) -> io::Result<LauncherSource> {
        match &self.launcher_path {
            Some(path) => Ok(LauncherSource::File(path.clone())),
            None => LauncherSource::beside_executable(),
        }
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            max_cached_log_lines: self.max_cached_log_lines,
            print_error_stream_to_console: self.print_error_stream_to_console,
        }
    }
}

impl ServiceConfiguration {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read service config file: {}", path.as_ref().display())
        })?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: ServiceConfiguration =
            serde_yaml::from_str(content).context("Failed to parse YAML service configuration")?;

        validation::validate_service_config(&config)?;
        Ok(config)
    }

    /// Check this service against the node it is about to run on.
    pub fn validate_for(&self, node: &NodeConfig) -> Result<()> {
        validation::validate_service_config(self)?;
        validation::validate_service_on_node(self, node)
    }

    /// Identity with a fresh unique id, hosted by `node`.
    pub fn identity(&self, node: &NodeIdentity) -> ServiceIdentity {
        ServiceIdentity::new(
            self.name.clone(),
            self.environment.clone(),
            self.host.clone(),
            self.port,
            node.clone(),
        )
    }
}

// Default value functions
fn default_java_command() -> String {
    "java".to_string()
}

fn default_process_termination_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from("temp").join("caches")
}

fn default_library_directory() -> PathBuf {
    PathBuf::from("launcher").join("libs")
}

fn default_max_cached_log_lines() -> usize {
    128
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_heap_memory_mb() -> u32 {
    512
}

// Custom serialization for Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, String> {
        let invalid = || format!("Invalid duration: {}", s);
        // "ms" first, it also ends with 's'
        if let Some(num) = s.strip_suffix("ms") {
            num.parse().map(Duration::from_millis).map_err(|_| invalid())
        } else if let Some(num) = s.strip_suffix('s') {
            num.parse().map(Duration::from_secs).map_err(|_| invalid())
        } else if let Some(num) = s.strip_suffix('m') {
            num.parse::<u64>()
                .map(|mins| Duration::from_secs(mins * 60))
                .map_err(|_| invalid())
        } else {
            Err(format!("Duration must end with 's', 'ms', or 'm': {}", s))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE_YAML: &str = r#"
identity: node-1
default_jvm_options:
  - "-XX:+UseG1GC"
process_termination_timeout: 1500ms
language: de_DE
launcher_path: /opt/ward/wrapper.jar
environments:
  - name: paper
    environment_type: MINECRAFT_SERVER
environment_types:
  - name: MINECRAFT_SERVER
    default_process_arguments: ["nogui"]
"#;

    #[test]
    fn test_load_node_config() {
        let config = NodeConfig::load_from_string(NODE_YAML).unwrap();
        assert_eq!(config.identity.as_str(), "node-1");
        assert_eq!(config.java_command, "java");
        assert_eq!(config.process_termination_timeout, Duration::from_millis(1500));
        assert_eq!(config.language.as_str(), "de_DE");
        assert_eq!(config.cache_directory, PathBuf::from("temp").join("caches"));
        assert_eq!(config.library_directory, PathBuf::from("launcher").join("libs"));
        assert_eq!(config.max_cached_log_lines, 128);
        assert!(!config.print_error_stream_to_console);
        assert_eq!(
            config.environment_type("MINECRAFT_SERVER").unwrap().default_process_arguments,
            vec!["nogui".to_string()]
        );
        assert!(matches!(config.launcher_source().unwrap(), LauncherSource::File(_)));
    }

    #[test]
    fn test_node_defaults() {
        let config = NodeConfig::load_from_string("identity: node-2\n").unwrap();
        assert_eq!(config.process_termination_timeout, Duration::from_secs(5));
        assert_eq!(config.language, Language::default());
        assert!(config.environments.is_empty());
        assert_eq!(config.relay_config().max_cached_log_lines, 128);
    }

    #[test]
    fn test_load_service_config() {
        let service = ServiceConfiguration::load_from_string(
            r#"
name: Lobby-1
environment: MINECRAFT_SERVER
port: 44955
directory: /srv/ward/Lobby-1
process:
  max_heap_memory_mb: 1024
  environment_variables:
    lang: C
"#,
        )
        .unwrap();
        assert_eq!(service.host, "127.0.0.1");
        assert_eq!(service.runtime, RuntimeKind::Jvm);
        assert_eq!(service.process.max_heap_memory_mb, 1024);
        assert_eq!(service.process.environment_variables.get("lang").map(String::as_str), Some("C"));

        let node = NodeConfig::load_from_string(NODE_YAML).unwrap();
        service.validate_for(&node).unwrap();
        let identity = service.identity(&node.identity);
        assert_eq!(identity.address(), "127.0.0.1:44955");
        assert_eq!(identity.node, node.identity);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(NodeConfig::load_from_string("identity: [").is_err());
        assert!(ServiceConfiguration::load_from_string("name: only").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(duration_serde::parse_duration("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(duration_serde::parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(duration_serde::parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert!(duration_serde::parse_duration("10").is_err());
        assert!(duration_serde::parse_duration("xs").is_err());
    }

    #[test]
    fn test_duration_round_trip() {
        let mut config = NodeConfig::load_from_string("identity: node-3\n").unwrap();
        config.process_termination_timeout = Duration::from_millis(250);
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("process_termination_timeout: 250ms"));
        let back = NodeConfig::load_from_string(&yaml).unwrap();
        assert_eq!(back.process_termination_timeout, Duration::from_millis(250));
    }
}
