//! Broadcastable events: which channels, which name, which payload.

use serde::{Deserialize, Serialize};

use crate::Event;

/// A broadcast channel.
///
/// Private channels require the subscriber to be authorized for the resource
/// (`private-providers.12`); public channels do not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "visibility", content = "name", rename_all = "lowercase")]
pub enum Channel {
    Public(String),
    Private(String),
}

impl Channel {
    pub fn public(name: impl Into<String>) -> Self {
        Self::Public(name.into())
    }

    pub fn private(name: impl Into<String>) -> Self {
        Self::Private(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Channel::Public(n) | Channel::Private(n) => n,
        }
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Channel::Public(n) => f.write_str(n),
            Channel::Private(n) => write!(f, "private-{n}"),
        }
    }
}

/// An event that is pushed to live clients.
pub trait BroadcastEvent: Event {
    /// Channels the event is delivered on.
    fn broadcast_on(&self) -> Vec<Channel>;

    /// Client-facing event name (defaults to the event type).
    fn broadcast_as(&self) -> &'static str {
        self.event_type()
    }

    /// Client-facing payload.
    fn broadcast_with(&self) -> serde_json::Value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_channels_render_with_prefix() {
        assert_eq!(Channel::private("providers.4").to_string(), "private-providers.4");
        assert_eq!(Channel::public("catalog").to_string(), "catalog");
        assert_eq!(Channel::private("orders.1").name(), "orders.1");
    }
}
