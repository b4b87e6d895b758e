use super::*;
use anyhow::{anyhow, Result};
use std::collections::HashSet;
use ward_process::validate_service_name;

/// Validate node-wide configuration
pub fn validate_node_config(config: &NodeConfig) -> Result<()> {
    if config.identity.as_str().trim().is_empty() {
        return Err(anyhow!("Node identity cannot be empty"));
    }

    if config.java_command.trim().is_empty() {
        return Err(anyhow!("java_command cannot be empty"));
    }

    if config.process_termination_timeout.is_zero() {
        return Err(anyhow!("Process termination timeout must be greater than 0"));
    }

    if !config.language.is_well_formed() {
        return Err(anyhow!(
            "Invalid language tag: {}, expected a form like en_US",
            config.language
        ));
    }

    let mut names = HashSet::new();
    for environment_type in &config.environment_types {
        if environment_type.name.is_empty() {
            return Err(anyhow!("Environment type name cannot be empty"));
        }
        if !names.insert(environment_type.name.as_str()) {
            return Err(anyhow!("Duplicate environment type: {}", environment_type.name));
        }
    }

    for environment in &config.environments {
        if environment.name.is_empty() {
            return Err(anyhow!("Environment name cannot be empty"));
        }
        if environment.environment_type.is_empty() {
            return Err(anyhow!("Environment {} has no environment type", environment.name));
        }
    }

    Ok(())
}

/// Validate a service configuration on its own
pub fn validate_service_config(service: &ServiceConfiguration) -> Result<()> {
    validate_service_name(&service.name).map_err(|e| anyhow!("{}", e))?;

    if service.environment.is_empty() {
        return Err(anyhow!("Service {} has no environment type", service.name));
    }

    if service.port == 0 {
        return Err(anyhow!("Port must be between 1 and 65535, got: {}", service.port));
    }

    if service.host.trim().is_empty() {
        return Err(anyhow!("Service {} has an empty bind host", service.name));
    }

    if service.process.max_heap_memory_mb == 0 {
        return Err(anyhow!("Service {} must have a heap size greater than 0", service.name));
    }

    if service.java_command.as_deref().is_some_and(|c| c.trim().is_empty()) {
        return Err(anyhow!("Service {} has an empty java_command override", service.name));
    }

    Ok(())
}

/// Validate that a service can run on the given node
pub fn validate_service_on_node(service: &ServiceConfiguration, node: &NodeConfig) -> Result<()> {
    if node.environment_type(&service.environment).is_none() {
        return Err(anyhow!(
            "Environment type {} of service {} is not declared on node {}",
            service.environment,
            service.name,
            node.identity
        ));
    }

    Ok(())
}
