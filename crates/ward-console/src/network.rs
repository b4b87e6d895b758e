//! The cluster message carrying a console line to another node.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ward_common::NodeIdentity;

use crate::events::ServiceSnapshot;

pub const INTERNAL_MSG_CHANNEL: &str = "internal_msg_channel";
pub const CONSOLE_LINE_KEY: &str = "screen_new_line";

/// A message addressed to one node on a named channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub target: NodeIdentity,
    pub channel: String,
    pub key: String,
    /// JSON-encoded body.
    pub payload: Vec<u8>,
}

/// Body of a `screen_new_line` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleLinePayload {
    pub service: ServiceSnapshot,
    pub component_id: String,
    pub line: String,
    pub stderr: bool,
}

impl ConsoleLinePayload {
    pub fn into_message(self, target: NodeIdentity) -> Result<ChannelMessage, ChannelError> {
        let payload = serde_json::to_vec(&self)?;
        Ok(ChannelMessage {
            target,
            channel: INTERNAL_MSG_CHANNEL.to_string(),
            key: CONSOLE_LINE_KEY.to_string(),
            payload,
        })
    }

    pub fn from_message(message: &ChannelMessage) -> Result<Self, ChannelError> {
        Ok(serde_json::from_slice(&message.payload)?)
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("No connection to node {0}")]
    Unreachable(NodeIdentity),

    #[error("Payload encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Outbound side of the cluster network. Sends are fire-and-forget.
pub trait ChannelMessageSender: Send + Sync {
    fn send(&self, message: ChannelMessage) -> Result<(), ChannelError>;
}
