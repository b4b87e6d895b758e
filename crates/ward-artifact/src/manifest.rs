//! JAR manifest parsing.
//!
//! Only the main section is read. Headers are `Name: value`, a line starting
//! with a single space continues the previous value, and the first blank line
//! ends the main section.

use std::collections::BTreeMap;

pub const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

pub const MAIN_CLASS: &str = "Main-Class";
pub const PREMAIN_CLASS: &str = "Premain-Class";
pub const LAUNCHER_AGENT_CLASS: &str = "Launcher-Agent-Class";

/// Main attributes of a JAR manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: BTreeMap<String, String>,
}

impl Manifest {
    pub fn parse(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        let mut attributes: BTreeMap<String, String> = BTreeMap::new();
        let mut current: Option<String> = None;

        for raw in text.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.is_empty() {
                break;
            }

            if let Some(continuation) = line.strip_prefix(' ') {
                if let Some(value) = current.as_ref().and_then(|k| attributes.get_mut(k)) {
                    value.push_str(continuation);
                }
                continue;
            }

            match line.split_once(':') {
                Some((name, value)) if !name.is_empty() => {
                    let value = value.strip_prefix(' ').unwrap_or(value);
                    attributes.insert(name.to_string(), value.to_string());
                    current = Some(name.to_string());
                }
                // Not a header; a continuation cannot follow it
                _ => current = None,
            }
        }

        Self { attributes }
    }

    /// Look up an attribute; names compare case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn main_class(&self) -> Option<&str> {
        self.get(MAIN_CLASS).filter(|v| !v.trim().is_empty())
    }

    /// `Premain-Class`, falling back to `Launcher-Agent-Class`.
    pub fn agent_class(&self) -> Option<&str> {
        self.get(PREMAIN_CLASS)
            .or_else(|| self.get(LAUNCHER_AGENT_CLASS))
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn into_attributes(self) -> BTreeMap<String, String> {
        self.attributes
    }
}
