//! Main tracker service.
//!
//! Follows one order: takes a snapshot at start, again whenever the live
//! feed reports a change to the order, and on a fixed interval while the
//! feed is down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use logiflow_sdk::realtime::{Connector, TungsteniteConnector};
use logiflow_sdk::{ConnectionStatus, Envelope, RealtimeClient, RealtimeConfig, RealtimeError};
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::config::{ConfigError, TrackerConfig};
use super::filter::SubjectFilter;
use super::metrics::TrackerMetrics;
use super::snapshot::{OrderSnapshot, OrderSource};

/// What the tracker currently knows about its order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerState {
    /// Latest snapshot. Cleared when a fetch fails.
    pub snapshot: Option<OrderSnapshot>,

    /// Error of the latest fetch, if it failed.
    pub last_error: Option<String>,

    /// Number of completed fetches.
    pub refreshes: u64,
}

impl TrackerState {
    /// Returns true if a snapshot is available.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Errors raised while building a tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Invalid tracker configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The live feed could not be set up.
    #[error("realtime: {0}")]
    Realtime(#[from] RealtimeError),
}

/// Follows one order.
pub struct OrderTracker<S> {
    /// Configuration.
    config: TrackerConfig,

    /// Where snapshots come from.
    source: Arc<S>,

    /// Decides which notifications concern the order.
    filter: SubjectFilter,

    /// Live feed.
    realtime: RealtimeClient,

    /// Refresh requests raised by the feed handler.
    refresh_rx: Mutex<mpsc::UnboundedReceiver<()>>,

    /// Published state.
    state: watch::Sender<TrackerState>,

    /// Metrics.
    metrics: Arc<TrackerMetrics>,

    /// Whether the service is running.
    running: AtomicBool,

    shutdown: Notify,
}

impl<S> std::fmt::Debug for OrderTracker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderTracker")
            .field("order_id", &self.config.order_id)
            .field("realtime", &self.realtime)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl<S: OrderSource> OrderTracker<S> {
    /// Creates a tracker that listens to the backend over WebSocket.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: TrackerConfig, source: S) -> Result<Self, TrackerError> {
        Self::with_connector(config, source, TungsteniteConnector)
    }

    /// Creates a tracker whose live feed uses the given connector.
    ///
    /// The feed starts connecting immediately; snapshots start with [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_connector<C: Connector>(
        config: TrackerConfig,
        source: S,
        connector: C,
    ) -> Result<Self, TrackerError> {
        config.validate()?;

        let filter = SubjectFilter::new(config.order_id.clone());
        let metrics = Arc::new(TrackerMetrics::new());
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();

        let handler = {
            let filter = filter.clone();
            let metrics = Arc::clone(&metrics);
            move |event: &Envelope| {
                if filter.matches(event) {
                    metrics.record_notification();
                    debug!(kind = %event.kind, order_id = filter.order_id(), "order notification");
                    let _ = refresh_tx.send(());
                }
            }
        };

        let realtime = RealtimeClient::spawn(
            RealtimeConfig::from_endpoints(&config.endpoints),
            connector,
            handler,
        )?;
        let (state, _) = watch::channel(TrackerState::default());

        Ok(Self {
            config,
            source: Arc::new(source),
            filter,
            realtime,
            refresh_rx: Mutex::new(refresh_rx),
            state,
            metrics,
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Returns the snapshot source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the subject filter.
    #[must_use]
    pub const fn filter(&self) -> &SubjectFilter {
        &self.filter
    }

    /// Returns the live feed.
    #[must_use]
    pub const fn realtime(&self) -> &RealtimeClient {
        &self.realtime
    }

    /// Returns the metrics.
    #[must_use]
    pub fn metrics(&self) -> Arc<TrackerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Returns the live feed status.
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        self.realtime.status()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TrackerState {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TrackerState> {
        self.state.subscribe()
    }

    /// Asks the live feed to connect again, skipping any pending backoff.
    pub fn reconnect(&self) {
        info!(url = self.realtime.url(), "reconnect requested");
        self.realtime.open();
    }

    /// Returns true if the service is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stops the service and closes the live feed.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.shutdown.notify_one();
        self.realtime.close();
        info!("Order tracker stop requested");
    }

    /// Runs the tracker until stopped.
    pub async fn run(&self) {
        self.running.store(true, Ordering::Relaxed);
        info!(
            order_id = self.filter.order_id(),
            url = self.realtime.url(),
            "Order tracker started"
        );

        let mut refresh_rx = self.refresh_rx.lock().await;
        let period = self.config.poll_interval();
        let mut poll = interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.poll_once().await;

        while self.is_running() {
            tokio::select! {
                () = self.shutdown.notified() => break,
                request = refresh_rx.recv() => match request {
                    Some(()) => {
                        let mut merged = 0_usize;
                        while refresh_rx.try_recv().is_ok() {
                            merged += 1;
                        }
                        if merged > 0 {
                            debug!(merged, "coalesced queued refreshes");
                        }
                        self.poll_once().await;
                    }
                    None => break,
                },
                _ = poll.tick(), if self.config.poll_fallback => {
                    if !self.realtime.status().is_connected() {
                        self.metrics.record_poll();
                        debug!(status = %self.realtime.status(), "live feed down, polling");
                        self.poll_once().await;
                    }
                }
            }
        }

        self.running.store(false, Ordering::Relaxed);
        self.realtime.close();
        info!("Order tracker stopped");
    }

    /// Fetches a snapshot now and publishes the result.
    pub async fn poll_once(&self) -> TrackerState {
        self.metrics.record_refresh();
        let order_id = self.filter.order_id();

        match OrderSnapshot::fetch(self.source.as_ref(), order_id).await {
            Ok(snapshot) => {
                debug!(
                    order_id,
                    status = %snapshot.status(),
                    custody = snapshot.custody.len(),
                    open_failures = snapshot.open_failures().count(),
                    "snapshot refreshed"
                );
                self.state.send_modify(|state| {
                    state.snapshot = Some(snapshot);
                    state.last_error = None;
                    state.refreshes += 1;
                });
            }
            Err(e) => {
                self.metrics.record_fetch_failure();
                warn!(order_id, error = %e, "order fetch failed");
                self.state.send_modify(|state| {
                    state.snapshot = None;
                    state.last_error = Some(e.to_string());
                    state.refreshes += 1;
                });
            }
        }

        self.state()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering as AtomicOrdering;
    use std::time::Duration;

    use futures_util::future::BoxFuture;
    use futures_util::stream::{self, StreamExt};
    use logiflow_sdk::realtime::transport::Outbound;
    use logiflow_sdk::realtime::{Transport, TransportEvent};
    use logiflow_sdk::OrderStatus;
    use tokio::task::JoinHandle;
    use tokio_test::assert_ok;

    use super::*;
    use crate::snapshot::fixtures::FakeSource;

    type Peer = mpsc::UnboundedSender<TransportEvent>;

    /// Hands each accepted transport's event sender to the test.
    struct FeedConnector {
        refuse: Arc<AtomicBool>,
        peers: mpsc::UnboundedSender<Peer>,
    }

    impl Connector for FeedConnector {
        fn connect(&self, _url: &str) -> BoxFuture<'static, Result<Transport, RealtimeError>> {
            if self.refuse.load(AtomicOrdering::SeqCst) {
                return Box::pin(async {
                    Err(RealtimeError::Connection("connection refused".to_string()))
                });
            }

            let (event_tx, event_rx) = mpsc::unbounded_channel();
            let (outbound, _writer) = mpsc::unbounded_channel::<Outbound>();
            let _ = self.peers.send(event_tx);
            let events = stream::unfold(event_rx, |mut rx| async move {
                rx.recv().await.map(|event| (event, rx))
            })
            .boxed();
            Box::pin(async move { Ok(Transport::new(events, outbound)) })
        }
    }

    fn tracker(
        refuse: bool,
        poll_fallback: bool,
    ) -> (Arc<OrderTracker<FakeSource>>, mpsc::UnboundedReceiver<Peer>) {
        tracker_with(Arc::new(AtomicBool::new(refuse)), poll_fallback)
    }

    fn tracker_with(
        refuse: Arc<AtomicBool>,
        poll_fallback: bool,
    ) -> (Arc<OrderTracker<FakeSource>>, mpsc::UnboundedReceiver<Peer>) {
        let (peers, peer_rx) = mpsc::unbounded_channel();
        let config = TrackerConfig::new("ORD-42")
            .with_poll_interval(1_000)
            .with_poll_fallback(poll_fallback);
        let tracker = OrderTracker::with_connector(
            config,
            FakeSource::new(),
            FeedConnector { refuse, peers },
        )
        .expect("tracker");
        (Arc::new(tracker), peer_rx)
    }

    fn start(tracker: &Arc<OrderTracker<FakeSource>>) -> JoinHandle<()> {
        let tracker = Arc::clone(tracker);
        tokio::spawn(async move { tracker.run().await })
    }

    async fn refreshed(tracker: &OrderTracker<FakeSource>, count: u64) -> TrackerState {
        let mut updates = tracker.subscribe();
        let state = updates
            .wait_for(|state| state.refreshes >= count)
            .await
            .expect("tracker state");
        state.clone()
    }

    fn status_frame(order_id: &str, status: &str) -> TransportEvent {
        TransportEvent::Text(format!(
            r#"{{"type":"order_status_changed","data":{{"order_id":"{order_id}","status":"{status}"}},"timestamp":"2024-05-01T10:00:00"}}"#
        ))
    }

    #[tokio::test]
    async fn test_tracker_rejects_invalid_config() {
        let (peers, _peer_rx) = mpsc::unbounded_channel();
        let result = OrderTracker::with_connector(
            TrackerConfig::default(),
            FakeSource::new(),
            FeedConnector {
                refuse: Arc::new(AtomicBool::new(false)),
                peers,
            },
        );
        assert!(matches!(
            result,
            Err(TrackerError::Config(ConfigError::MissingOrderId))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_publishes_initial_snapshot() {
        let (tracker, _peer_rx) = tracker(false, false);
        tracker.source().set_status(OrderStatus::InProgress);
        let handle = start(&tracker);

        let state = refreshed(&tracker, 1).await;
        assert!(state.is_loaded());
        assert!(state.last_error.is_none());
        assert_eq!(
            state.snapshot.as_ref().map(OrderSnapshot::status),
            Some(OrderStatus::InProgress)
        );
        assert!(tracker.is_running());

        tracker.stop();
        handle.await.expect("run");
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_notification_refreshes() {
        let (tracker, mut peer_rx) = tracker(false, false);
        let handle = start(&tracker);
        let peer = peer_rx.recv().await.expect("peer");
        tracker
            .realtime()
            .wait_for_status(ConnectionStatus::Connected)
            .await
            .expect("connected");
        refreshed(&tracker, 1).await;

        tracker.source().set_status(OrderStatus::Delivered);
        peer.send(status_frame("ORD-43", "delivered")).expect("send");
        peer.send(status_frame("ORD-42", "delivered")).expect("send");

        let state = refreshed(&tracker, 2).await;
        assert_eq!(
            state.snapshot.as_ref().map(OrderSnapshot::status),
            Some(OrderStatus::Delivered)
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(tracker.source().calls(), 2);
        assert_eq!(tracker.metrics().notifications_matched(), 1);
        assert_eq!(tracker.state().refreshes, 2);

        tracker.stop();
        handle.await.expect("run");
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_burst_fetches_once() {
        let (tracker, mut peer_rx) = tracker(false, false);
        let handle = start(&tracker);
        let peer = peer_rx.recv().await.expect("peer");
        tracker
            .realtime()
            .wait_for_status(ConnectionStatus::Connected)
            .await
            .expect("connected");
        refreshed(&tracker, 1).await;

        for status in ["in_progress", "in_progress", "delivered"] {
            peer.send(status_frame("ORD-42", status)).expect("send");
        }

        refreshed(&tracker, 2).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(tracker.metrics().notifications_matched(), 3);
        assert_eq!(tracker.source().calls(), 2);
        assert_eq!(tracker.state().refreshes, 2);

        tracker.stop();
        handle.await.expect("run");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_after_feed_gave_up() {
        let refuse = Arc::new(AtomicBool::new(true));
        let (tracker, mut peer_rx) = tracker_with(Arc::clone(&refuse), false);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(tracker.realtime().attempts(), 5);
        assert_eq!(tracker.connection_status(), ConnectionStatus::Disconnected);

        refuse.store(false, AtomicOrdering::SeqCst);
        tracker.reconnect();
        let _peer = peer_rx.recv().await.expect("peer");
        tracker
            .realtime()
            .wait_for_status(ConnectionStatus::Connected)
            .await
            .expect("connected");
        assert_eq!(tracker.realtime().attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_while_feed_is_down() {
        let (tracker, _peer_rx) = tracker(true, true);
        let handle = start(&tracker);
        refreshed(&tracker, 1).await;

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(tracker.metrics().poll_cycles(), 3);
        assert_eq!(tracker.source().calls(), 4);
        assert_ne!(tracker.connection_status(), ConnectionStatus::Connected);

        tracker.stop();
        handle.await.expect("run");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_polling_while_feed_is_up() {
        let (tracker, mut peer_rx) = tracker(false, true);
        let handle = start(&tracker);
        let _peer = peer_rx.recv().await.expect("peer");
        tracker
            .realtime()
            .wait_for_status(ConnectionStatus::Connected)
            .await
            .expect("connected");
        refreshed(&tracker, 1).await;

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(tracker.metrics().poll_cycles(), 0);
        assert_eq!(tracker.source().calls(), 1);

        tracker.stop();
        handle.await.expect("run");
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_disabled_stays_quiet() {
        let (tracker, _peer_rx) = tracker(true, false);
        let handle = start(&tracker);
        refreshed(&tracker, 1).await;

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(tracker.metrics().poll_cycles(), 0);
        assert_eq!(tracker.source().calls(), 1);

        tracker.stop();
        handle.await.expect("run");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_is_kept_until_next_success() {
        let (tracker, mut peer_rx) = tracker(false, false);
        tracker.source().missing.store(true, AtomicOrdering::SeqCst);
        let handle = start(&tracker);
        let peer = peer_rx.recv().await.expect("peer");

        let state = refreshed(&tracker, 1).await;
        assert!(!state.is_loaded());
        assert!(state
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("Order not found")));
        assert_eq!(tracker.metrics().fetch_failures(), 1);

        tracker.source().missing.store(false, AtomicOrdering::SeqCst);
        peer.send(status_frame("ORD-42", "in_progress")).expect("send");

        let state = refreshed(&tracker, 2).await;
        assert!(state.is_loaded());
        assert!(state.last_error.is_none());

        tracker.stop();
        handle.await.expect("run");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_run_and_closes_feed() {
        let (tracker, mut peer_rx) = tracker(false, true);
        let handle = start(&tracker);
        let _peer = peer_rx.recv().await.expect("peer");
        refreshed(&tracker, 1).await;

        tracker.stop();
        assert_ok!(handle.await);
        assert!(!tracker.is_running());

        tracker
            .realtime()
            .wait_for_status(ConnectionStatus::Disconnected)
            .await
            .expect("disconnected");
    }

    #[tokio::test]
    async fn test_poll_once_without_run() {
        let (tracker, _peer_rx) = tracker(true, false);
        let state = tracker.poll_once().await;
        assert!(state.is_loaded());
        assert_eq!(state.refreshes, 1);
        assert_eq!(tracker.metrics().refreshes(), 1);
    }
}
