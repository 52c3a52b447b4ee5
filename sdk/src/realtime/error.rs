//! Real-time client error types.

use std::fmt;

use tokio_tungstenite::tungstenite;

/// Real-time client errors.
///
/// The driver contains these internally; owners only see them when
/// constructing a client or when calling a decoder directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeError {
    /// Connection failed.
    Connection(String),

    /// WebSocket protocol error.
    Protocol(String),

    /// Failed to serialize an outbound message.
    Serialization(String),

    /// Failed to decode an inbound frame.
    Deserialization(String),

    /// Invalid configuration.
    InvalidConfig(String),

    /// Transport closed.
    Closed,
}

impl fmt::Display for RealtimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "connection failed: {}", msg),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::Serialization(msg) => write!(f, "serialization failed: {}", msg),
            Self::Deserialization(msg) => write!(f, "deserialization failed: {}", msg),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::Closed => write!(f, "connection closed"),
        }
    }
}

impl std::error::Error for RealtimeError {}

impl From<tungstenite::Error> for RealtimeError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Io(e) => Self::Connection(e.to_string()),
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::Closed
            }
            other => Self::Protocol(other.to_string()),
        }
    }
}
