//! JVM command line assembly.
//!
//! The launcher consumes four positional arguments after its own main class
//! (application main class, agent class, application path, preload flag) and
//! strips them before handing the rest to the application, so their position
//! is fixed.

use ward_artifact::ArtifactInfo;
use ward_common::Language;

/// System properties every JVM service is started with.
pub const DEFAULT_SYSTEM_PROPERTIES: [&str; 4] = [
    "-Dfile.encoding=UTF-8",
    "-Dlog4j2.formatMsgNoLookups=true",
    "-DIReallyKnowWhatIAmDoingISwear=true",
    "-Djline.terminal=jline.UnsupportedTerminal",
];

pub const LANGUAGE_PROPERTY: &str = "-Dcloudnet.wrapper.messages.language=";
pub const SYSTEM_LIBRARIES_PROPERTY: &str = "-Dfabric.systemLibraries=";
pub const BIND_HOST_PROPERTY: &str = "-Dservice.bind.host=";
pub const BIND_PORT_PROPERTY: &str = "-Dservice.bind.port=";

/// Placeholder passed when the application declares no agent class.
pub const NO_AGENT_CLASS: &str = "null";

/// Inputs of one JVM launch.
#[derive(Debug, Clone)]
pub struct JvmLaunch<'a> {
    pub interpreter: &'a str,
    pub node_jvm_options: &'a [String],
    pub service_jvm_options: &'a [String],
    pub max_heap_memory_mb: u32,
    pub language: &'a Language,
    pub classpath: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub wrapper: &'a ArtifactInfo,
    pub application: &'a ArtifactInfo,
    pub environment_arguments: &'a [String],
    pub process_parameters: &'a [String],
}

impl JvmLaunch<'_> {
    /// The full argument vector, interpreter first.
    pub fn arguments(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(32);

        args.push(self.interpreter.to_string());
        args.extend(self.node_jvm_options.iter().cloned());
        args.extend(self.service_jvm_options.iter().cloned());

        // Fixed heap avoids resizing at runtime
        args.push(format!("-Xmx{}M", self.max_heap_memory_mb));
        args.push(format!("-Xms{}M", self.max_heap_memory_mb));

        args.extend(DEFAULT_SYSTEM_PROPERTIES.iter().map(|p| p.to_string()));
        args.push(format!(
            "-javaagent:{}",
            self.wrapper.absolute_path.to_string_lossy()
        ));
        args.push(format!("{}{}", LANGUAGE_PROPERTY, self.language));
        args.push(format!("{}{}", SYSTEM_LIBRARIES_PROPERTY, self.classpath));
        args.push(format!("{}{}", BIND_HOST_PROPERTY, self.host));
        args.push(format!("{}{}", BIND_PORT_PROPERTY, self.port));

        args.push("-cp".to_string());
        args.push(self.classpath.to_string());
        args.push(self.wrapper.main_class().to_string());

        args.push(self.application.main_class().to_string());
        args.push(
            self.application
                .agent_class()
                .unwrap_or(NO_AGENT_CLASS)
                .to_string(),
        );
        args.push(self.application.absolute_path.to_string_lossy().into_owned());
        args.push(self.application.preload.to_string());

        args.extend(self.environment_arguments.iter().cloned());
        args.extend(self.process_parameters.iter().cloned());

        args
    }
}
