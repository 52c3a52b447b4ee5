//! Connection status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Observable status of a real-time connection.
///
/// Exactly one status holds at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// A transport is being opened.
    Connecting,
    /// The transport is open.
    Connected,
    /// No transport. Either never opened, closed, or waiting to reconnect.
    #[default]
    Disconnected,
    /// The transport reported an error. Close handling is unaffected.
    Error,
}

impl ConnectionStatus {
    /// Returns true if the transport is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Error => write!(f, "error"),
        }
    }
}
