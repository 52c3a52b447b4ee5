//! Connection driver.
//!
//! [`RealtimeClient::spawn`] starts one actor task that owns the transport,
//! the reconnect timer and the optional heartbeat. The returned handle
//! sends commands to the actor and observes its status through `watch`
//! channels. All events are handled in a single `select!` loop, so the
//! handler sees frames one at a time and in arrival order.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, trace, warn};

use super::config::RealtimeConfig;
use super::envelope::Envelope;
use super::error::RealtimeError;
use super::messages::ClientMessage;
use super::policy::{Backoff, ReconnectPolicy};
use super::status::ConnectionStatus;
use super::transport::{Connector, Transport, TransportEvent, TungsteniteConnector};

/// Receives decoded notifications.
///
/// Called on the driver task. Implementations must not block.
pub trait EventHandler: Send + 'static {
    /// Handles one notification.
    fn on_event(&mut self, event: &Envelope);
}

impl<F> EventHandler for F
where
    F: FnMut(&Envelope) + Send + 'static,
{
    fn on_event(&mut self, event: &Envelope) {
        self(event)
    }
}

#[derive(Debug)]
enum Command {
    Open,
    Send(String),
    Close,
}

/// Handle to a running connection driver.
///
/// Clones share the same driver. When the last handle is dropped the driver
/// closes its transport, cancels any pending reconnect and exits.
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    url: String,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
    last_event: watch::Receiver<Option<Envelope>>,
    attempts: watch::Receiver<u32>,
}

impl RealtimeClient {
    /// Connects to the configured endpoint over WebSocket.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn connect<H: EventHandler>(
        config: RealtimeConfig,
        handler: H,
    ) -> Result<Self, RealtimeError> {
        Self::spawn(config, TungsteniteConnector, handler)
    }

    /// Spawns a driver using the given connector and opens the transport.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn spawn<C, H>(
        config: RealtimeConfig,
        connector: C,
        handler: H,
    ) -> Result<Self, RealtimeError>
    where
        C: Connector,
        H: EventHandler,
    {
        config.validate()?;

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(ConnectionStatus::Disconnected);
        let (last_event_tx, last_event) = watch::channel(None);
        let (attempts_tx, attempts) = watch::channel(0);

        let driver = Driver {
            url: config.url.clone(),
            policy: config.reconnect_policy(),
            heartbeat_period: config.heartbeat_interval,
            connector,
            handler,
            status: status_tx,
            last_event: last_event_tx,
            attempts: attempts_tx,
            connecting: None,
            transport: None,
            reconnect: None,
            heartbeat: None,
        };

        let _ = commands.send(Command::Open);
        tokio::spawn(driver.run(command_rx));

        Ok(Self {
            url: config.url,
            commands,
            status,
            last_event,
            attempts,
        })
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Opens the transport if none is open or being opened.
    ///
    /// Cancels a pending reconnect and connects immediately.
    pub fn open(&self) {
        let _ = self.commands.send(Command::Open);
    }

    /// Sends a JSON message. Dropped silently if not connected.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) {
        match encode(message) {
            Ok(text) => {
                let _ = self.commands.send(Command::Send(text));
            }
            Err(e) => warn!(error = %e, "dropping outbound message"),
        }
    }

    /// Sends a protocol message.
    pub fn send_message(&self, message: &ClientMessage) {
        self.send(message);
    }

    /// Closes the transport without reconnecting.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Returns the most recently decoded notification.
    #[must_use]
    pub fn last_event(&self) -> Option<Envelope> {
        self.last_event.borrow().clone()
    }

    /// Returns the number of reconnects scheduled since the last successful open.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        *self.attempts.borrow()
    }

    /// Returns a receiver that observes status changes.
    #[must_use]
    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Waits until the driver reports `target`.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Closed`] if the driver exited.
    pub async fn wait_for_status(&self, target: ConnectionStatus) -> Result<(), RealtimeError> {
        let mut status = self.status.clone();
        status
            .wait_for(|s| *s == target)
            .await
            .map(|_| ())
            .map_err(|_| RealtimeError::Closed)
    }
}

fn encode<T: Serialize + ?Sized>(message: &T) -> Result<String, RealtimeError> {
    serde_json::to_string(message).map_err(|e| RealtimeError::Serialization(e.to_string()))
}

type ConnectFuture = BoxFuture<'static, Result<Transport, RealtimeError>>;

struct Driver<C, H> {
    url: String,
    policy: ReconnectPolicy,
    heartbeat_period: Option<Duration>,
    connector: C,
    handler: H,
    status: watch::Sender<ConnectionStatus>,
    last_event: watch::Sender<Option<Envelope>>,
    attempts: watch::Sender<u32>,
    connecting: Option<ConnectFuture>,
    transport: Option<Transport>,
    reconnect: Option<Pin<Box<Sleep>>>,
    heartbeat: Option<Interval>,
}

impl<C: Connector, H: EventHandler> Driver<C, H> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!(url = %self.url, "realtime driver started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Open) => self.open(),
                    Some(Command::Send(text)) => self.send(text),
                    Some(Command::Close) => self.close(),
                    None => break,
                },
                result = next_connect(&mut self.connecting) => self.on_connect(result),
                event = next_event(&mut self.transport) => self.on_event(event),
                () = next_reconnect(&mut self.reconnect) => {
                    self.reconnect = None;
                    self.open();
                }
                () = next_heartbeat(&mut self.heartbeat) => {
                    self.send_ping();
                }
            }
        }
        self.close();
        debug!(url = %self.url, "realtime driver stopped");
    }

    fn open(&mut self) {
        if self.transport.is_some() || self.connecting.is_some() {
            trace!("open ignored, transport already active");
            return;
        }
        self.reconnect = None;
        self.set_status(ConnectionStatus::Connecting);
        self.connecting = Some(self.connector.connect(&self.url));
    }

    fn send(&mut self, text: String) {
        match &self.transport {
            Some(transport) => {
                if !transport.send_text(text) {
                    debug!("transport writer gone, message dropped");
                }
            }
            None => trace!("not connected, message dropped"),
        }
    }

    fn send_ping(&mut self) {
        match serde_json::to_string(&ClientMessage::Ping) {
            Ok(text) => self.send(text),
            Err(e) => warn!(error = %e, "failed to encode ping"),
        }
    }

    fn close(&mut self) {
        self.reconnect = None;
        self.connecting = None;
        self.heartbeat = None;
        if let Some(transport) = self.transport.take() {
            transport.close();
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    fn on_connect(&mut self, result: Result<Transport, RealtimeError>) {
        self.connecting = None;
        match result {
            Ok(transport) => {
                self.transport = Some(transport);
                self.attempts.send_replace(0);
                self.heartbeat = self.heartbeat_period.map(|period| {
                    let mut ticker = interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    ticker
                });
                self.set_status(ConnectionStatus::Connected);
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "realtime connect failed");
                self.set_status(ConnectionStatus::Error);
                self.on_closed();
            }
        }
    }

    fn on_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Text(frame) => self.dispatch(&frame),
            TransportEvent::Error(message) => {
                warn!(url = %self.url, error = %message, "realtime transport error");
                self.set_status(ConnectionStatus::Error);
            }
            TransportEvent::Closed => {
                self.transport = None;
                self.heartbeat = None;
                self.on_closed();
            }
        }
    }

    fn dispatch(&mut self, frame: &str) {
        match Envelope::decode(frame) {
            Ok(envelope) => {
                trace!(kind = %envelope.kind, "notification received");
                self.last_event.send_replace(Some(envelope.clone()));
                self.handler.on_event(&envelope);
            }
            Err(e) => warn!(error = %e, "dropping malformed frame"),
        }
    }

    fn on_closed(&mut self) {
        self.set_status(ConnectionStatus::Disconnected);
        let attempt = *self.attempts.borrow();
        match self.policy.next(attempt) {
            Backoff::Retry(delay) => {
                self.attempts.send_replace(attempt + 1);
                debug!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "reconnect scheduled"
                );
                self.reconnect = Some(Box::pin(sleep(delay)));
            }
            Backoff::GiveUp => {
                warn!(url = %self.url, attempts = attempt, "reconnect attempts exhausted");
            }
        }
    }

    fn set_status(&self, next: ConnectionStatus) {
        self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug!(from = %current, to = %next, "realtime status");
            *current = next;
            true
        });
    }
}

async fn next_connect(
    connecting: &mut Option<ConnectFuture>,
) -> Result<Transport, RealtimeError> {
    match connecting {
        Some(fut) => fut.await,
        None => pending().await,
    }
}

async fn next_event(transport: &mut Option<Transport>) -> TransportEvent {
    match transport {
        Some(transport) => transport.next_event().await,
        None => pending().await,
    }
}

async fn next_reconnect(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}

async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending().await,
    }
}
