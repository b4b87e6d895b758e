//! # Ward Console
//!
//! Captures the output of a supervised process and relays each line to the
//! log targets registered for it. Targets on the local node receive an
//! in-process event; targets elsewhere receive a channel message.

pub mod cache;
pub mod capture;
pub mod events;
pub mod network;
pub mod relay;
pub mod targets;
pub mod types;

pub use cache::LogCache;
pub use capture::spawn_capture;
pub use events::{ConsoleLineEvent, ServiceEventSink, ServiceSnapshot, SharedSnapshot};
pub use network::{
    ChannelError, ChannelMessage, ChannelMessageSender, ConsoleLinePayload, CONSOLE_LINE_KEY,
    INTERNAL_MSG_CHANNEL,
};
pub use relay::{ConsoleRelay, RelayConfig, RelayStatus};
pub use targets::LogTargetRegistry;
pub use types::{LogLine, LogTarget, StreamType};
