//! Core types for console relaying

use serde::{Deserialize, Serialize};
use ward_common::NodeIdentity;

/// Stream type (stdout or stderr)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Stdout,
    Stderr,
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamType::Stdout => write!(f, "stdout"),
            StreamType::Stderr => write!(f, "stderr"),
        }
    }
}

/// One captured console line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub text: String,
    pub stream: StreamType,
}

impl LogLine {
    pub fn new(text: impl Into<String>, stream: StreamType) -> Self {
        Self {
            text: text.into(),
            stream,
        }
    }

    pub fn stdout(text: impl Into<String>) -> Self {
        Self::new(text, StreamType::Stdout)
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self::new(text, StreamType::Stderr)
    }

    pub fn is_stderr(&self) -> bool {
        self.stream == StreamType::Stderr
    }
}

/// A consumer of console output: a component on some node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogTarget {
    pub destination: NodeIdentity,
    /// Logical consumer at the destination, e.g. an attached console.
    pub component_id: String,
}

impl LogTarget {
    pub fn new(destination: impl Into<NodeIdentity>, component_id: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            component_id: component_id.into(),
        }
    }
}
