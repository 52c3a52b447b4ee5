//! Order snapshots.
//!
//! A snapshot is everything the tracking view shows for one order: the
//! order with its plan, the custody chain and the recorded failures.

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use logiflow_sdk::types::{CustodyEvent, FailureEvent};
use logiflow_sdk::{ClientError, OrchestratorClient, Order, OrderStatus};
use tracing::debug;

/// Where snapshots are read from.
pub trait OrderSource: Send + Sync + 'static {
    /// Fetches an order.
    fn order<'a>(&'a self, order_id: &'a str) -> BoxFuture<'a, Result<Order, ClientError>>;

    /// Fetches the custody chain of an order.
    fn custody_events<'a>(
        &'a self,
        order_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CustodyEvent>, ClientError>>;

    /// Fetches the failures recorded against an order.
    fn failures<'a>(
        &'a self,
        order_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<FailureEvent>, ClientError>>;
}

impl OrderSource for OrchestratorClient {
    fn order<'a>(&'a self, order_id: &'a str) -> BoxFuture<'a, Result<Order, ClientError>> {
        Box::pin(OrchestratorClient::order(self, order_id))
    }

    fn custody_events<'a>(
        &'a self,
        order_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CustodyEvent>, ClientError>> {
        Box::pin(OrchestratorClient::custody_events(self, order_id))
    }

    fn failures<'a>(
        &'a self,
        order_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<FailureEvent>, ClientError>> {
        Box::pin(OrchestratorClient::failures(self, order_id))
    }
}

/// Everything known about one order at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSnapshot {
    /// The order and its plan.
    pub order: Order,

    /// Custody chain, oldest first as reported by the backend.
    pub custody: Vec<CustodyEvent>,

    /// Failures recorded against the order.
    pub failures: Vec<FailureEvent>,

    /// When the snapshot was taken.
    pub fetched_at: DateTime<Utc>,
}

impl OrderSnapshot {
    /// Fetches a snapshot.
    ///
    /// Custody and failure lookups that fail are treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the order itself cannot be fetched.
    pub async fn fetch<S: OrderSource + ?Sized>(
        source: &S,
        order_id: &str,
    ) -> Result<Self, ClientError> {
        let order = source.order(order_id).await?;
        let (custody, failures) =
            tokio::join!(source.custody_events(order_id), source.failures(order_id));

        let custody = custody.unwrap_or_else(|e| {
            debug!(order_id, error = %e, "custody chain unavailable");
            Vec::new()
        });
        let failures = failures.unwrap_or_else(|e| {
            debug!(order_id, error = %e, "failures unavailable");
            Vec::new()
        });

        Ok(Self {
            order,
            custody,
            failures,
            fetched_at: Utc::now(),
        })
    }

    /// Returns the order status.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.order.status
    }

    /// Returns the most recent custody event.
    #[must_use]
    pub fn latest_custody(&self) -> Option<&CustodyEvent> {
        self.custody.iter().max_by_key(|e| e.timestamp)
    }

    /// Returns failures that have not been resolved.
    pub fn open_failures(&self) -> impl Iterator<Item = &FailureEvent> {
        self.failures.iter().filter(|f| !f.resolved)
    }

    /// Returns the number of legs in the plan.
    #[must_use]
    pub fn hops(&self) -> usize {
        self.order.plan.hops()
    }
}
