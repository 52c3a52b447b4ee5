//! Transport seam between the driver and the socket.
//!
//! A [`Connector`] opens a [`Transport`]: a stream of inbound
//! [`TransportEvent`]s plus a sender for outbound frames. The production
//! connector uses `tokio-tungstenite`; tests substitute a channel-backed
//! one.

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use super::error::RealtimeError;

/// Something that happened on an open transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame arrived.
    Text(String),
    /// The transport reported an error. A close may or may not follow.
    Error(String),
    /// The transport closed.
    Closed,
}

/// Outbound instruction for the transport writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Write a text frame.
    Text(String),
    /// Close the transport.
    Close,
}

/// An open transport.
pub struct Transport {
    events: BoxStream<'static, TransportEvent>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("writer_closed", &self.outbound.is_closed())
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Creates a transport from an event stream and an outbound sender.
    #[must_use]
    pub fn new(
        events: BoxStream<'static, TransportEvent>,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self { events, outbound }
    }

    /// Waits for the next event. An exhausted stream reads as `Closed`.
    pub async fn next_event(&mut self) -> TransportEvent {
        self.events.next().await.unwrap_or(TransportEvent::Closed)
    }

    /// Queues a text frame. Returns false if the writer is gone.
    pub fn send_text(&self, text: String) -> bool {
        self.outbound.send(Outbound::Text(text)).is_ok()
    }

    /// Asks the writer to close the transport.
    pub fn close(self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

/// Opens transports to a URL.
pub trait Connector: Send + Sync + 'static {
    /// Starts opening a transport.
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Transport, RealtimeError>>;
}

/// WebSocket connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl Connector for TungsteniteConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Transport, RealtimeError>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;

            let (mut sink, source) = ws_stream.split();
            let (outbound, mut rx) = mpsc::unbounded_channel::<Outbound>();

            tokio::spawn(async move {
                while let Some(frame) = rx.recv().await {
                    match frame {
                        Outbound::Text(text) => {
                            if let Err(e) = sink.send(Message::Text(text.into())).await {
                                debug!(error = %e, "websocket write failed");
                                break;
                            }
                        }
                        Outbound::Close => {
                            let _ = sink.close().await;
                            break;
                        }
                    }
                }
            });

            let events = source
                .filter_map(|result| async move {
                    match result {
                        Ok(Message::Text(text)) => Some(TransportEvent::Text(text.to_string())),
                        Ok(Message::Close(_)) => Some(TransportEvent::Closed),
                        Ok(_) => None,
                        Err(e) => Some(TransportEvent::Error(e.to_string())),
                    }
                })
                .boxed();

            Ok(Transport::new(events, outbound))
        })
    }
}
