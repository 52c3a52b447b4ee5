//! Logiflow Tracker binary.
//!
//! Follows the order named by `LOGIFLOW_ORDER_ID` until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use logiflow_sdk::{ClientConfig, OrchestratorClient};
use logiflow_tracker::{ConnectionProbe, OrderTracker, TrackerConfig, TrackerState};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,logiflow_tracker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = TrackerConfig::from_env().context("loading tracker configuration")?;

    info!("Starting Logiflow Tracker");
    info!("Order: {}", config.order_id);
    info!("API URL: {}", config.endpoints.api_url);
    info!("Realtime URL: {}", config.endpoints.realtime_url());
    info!(
        "Poll fallback: {} every {} ms",
        config.poll_fallback, config.poll_interval_ms
    );

    let client = OrchestratorClient::new(ClientConfig::from_endpoints(&config.endpoints))
        .context("building REST client")?;

    let report = ConnectionProbe::new(client.clone()).run().await;
    for check in &report.checks {
        if check.is_ok() {
            info!(
                endpoint = check.endpoint,
                latency_ms = check.latency_ms,
                "{}: {}",
                check.name,
                check.message
            );
        } else {
            warn!(endpoint = check.endpoint, "{}: {}", check.name, check.message);
        }
    }
    info!("Connection probe: {}", report.summary());

    let tracker = Arc::new(OrderTracker::new(config, client).context("starting tracker")?);

    let mut updates = tracker.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            log_state(&state);
        }
    });

    let runner = {
        let tracker = Arc::clone(&tracker);
        tokio::spawn(async move { tracker.run().await })
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down tracker");
    tracker.stop();
    runner.await.context("tracker task")?;

    let metrics = tracker.metrics().snapshot();
    info!(
        refreshes = metrics.refreshes,
        notifications = metrics.notifications_matched,
        polls = metrics.poll_cycles,
        success_rate = metrics.success_rate,
        "Final metrics"
    );

    Ok(())
}

fn log_state(state: &TrackerState) {
    match (&state.snapshot, &state.last_error) {
        (Some(snapshot), _) => {
            let holder = snapshot
                .latest_custody()
                .map(|event| event.to_entity.name.as_str())
                .unwrap_or("-");
            info!(
                status = %snapshot.status(),
                hops = snapshot.hops(),
                custody_events = snapshot.custody.len(),
                open_failures = snapshot.open_failures().count(),
                holder,
                "Order {}",
                snapshot.order.id
            );
        }
        (None, Some(error)) => warn!("Order unavailable: {}", error),
        (None, None) => {}
    }
}
