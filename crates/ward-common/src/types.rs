//! Identity types shared by the supervisor, the console relay and the
//! orchestrator layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies a cluster member, possibly the local node.
///
/// # Example
/// ```
/// use ward_common::NodeIdentity;
///
/// let node = NodeIdentity::from("node-1");
/// assert_eq!(node.as_str(), "node-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    /// Creates a new NodeIdentity from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the node id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeIdentity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable identifier of one managed service instance.
///
/// Owned by the orchestrator; a supervisor only ever holds a copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub name: String,
    pub unique_id: Uuid,
    /// Name of the environment type (e.g. `MINECRAFT_SERVER`).
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// The node hosting this service.
    pub node: NodeIdentity,
}

impl ServiceIdentity {
    /// Creates an identity with a freshly generated unique id.
    pub fn new(
        name: impl Into<String>,
        environment: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        node: NodeIdentity,
    ) -> Self {
        Self {
            name: name.into(),
            unique_id: Uuid::new_v4(),
            environment: environment.into(),
            host: host.into(),
            port,
            node,
        }
    }

    /// `host:port` the service binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_identity() {
        let id = NodeIdentity::from("node-1");
        assert_eq!(id.as_str(), "node-1");
        assert_eq!(id.to_string(), "node-1");
        assert_eq!(id, NodeIdentity::new(String::from("node-1")));
    }

    #[test]
    fn test_service_identity_unique_ids() {
        let node = NodeIdentity::from("node-1");
        let a = ServiceIdentity::new("Lobby-1", "MINECRAFT_SERVER", "127.0.0.1", 44955, node.clone());
        let b = ServiceIdentity::new("Lobby-1", "MINECRAFT_SERVER", "127.0.0.1", 44955, node);
        assert_ne!(a.unique_id, b.unique_id);
        assert_eq!(a.address(), "127.0.0.1:44955");
        assert_eq!(a.to_string(), "Lobby-1");
    }

    #[test]
    fn test_service_identity_serde() {
        let identity = ServiceIdentity::new("Proxy-1", "VELOCITY", "0.0.0.0", 25565, "node-2".into());
        let json = serde_json::to_string(&identity).unwrap();
        let back: ServiceIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(identity, back);
    }
}
