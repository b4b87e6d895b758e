//! Localized, user-facing messages.
//!
//! Only a handful of conditions are surfaced to administrators verbatim; they
//! are rendered in the node's configured language, falling back to English.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A language tag such as `en_US` or `de_DE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary language subtag, lower-cased (`de_DE` -> `de`).
    pub fn primary(&self) -> String {
        self.0
            .split(['_', '-'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Whether the tag looks like `ll` or `ll_CC`.
    pub fn is_well_formed(&self) -> bool {
        let mut parts = self.0.split(['_', '-']);
        let primary_ok = parts
            .next()
            .is_some_and(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_alphabetic()));
        let region_ok = parts
            .next()
            .map_or(true, |r| r.len() == 2 && r.chars().all(|c| c.is_ascii_alphabetic()));
        primary_ok && region_ok && parts.next().is_none()
    }
}

impl Default for Language {
    fn default() -> Self {
        Self("en_US".to_string())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messages with a localized rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// No application archive matched the service environment.
    ApplicationArchiveNotFound {
        service: String,
        environment: String,
        directory: PathBuf,
    },
    /// The bundled launcher could not be located.
    LauncherMissing { resource: String },
}

impl Message {
    pub fn render(&self, language: &Language) -> String {
        match (self, language.primary().as_str()) {
            (
                Message::ApplicationArchiveNotFound {
                    service,
                    environment,
                    directory,
                },
                "de",
            ) => format!(
                "Fuer den Dienst {} wurde keine Anwendungsdatei fuer die Umgebung {} in {} gefunden",
                service,
                environment,
                directory.display()
            ),
            (
                Message::ApplicationArchiveNotFound {
                    service,
                    environment,
                    directory,
                },
                _,
            ) => format!(
                "Unable to find an application jar for service {} (environment {}) in {}",
                service,
                environment,
                directory.display()
            ),
            (Message::LauncherMissing { resource }, "de") => format!(
                "Die mitgelieferte Datei \"{}\" fehlt, JVM-Dienste koennen nicht gestartet werden",
                resource
            ),
            (Message::LauncherMissing { resource }, _) => format!(
                "Built-in \"{}\" missing, unable to start jvm based services",
                resource
            ),
        }
    }
}
