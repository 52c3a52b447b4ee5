//! Backend connection probe.
//!
//! Runs the startup checks against the REST API one after another and
//! reports latency for each.

use std::future::Future;

use logiflow_sdk::{ClientError, OrchestratorClient};
use serde::Serialize;
use tokio::time::Instant;

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// The endpoint answered as expected.
    Success,
    /// The endpoint failed or answered unexpectedly.
    Error,
}

/// Result of probing one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeCheck {
    /// Human-readable check name.
    pub name: &'static str,
    /// Path that was probed.
    pub endpoint: &'static str,
    /// Outcome.
    pub status: CheckStatus,
    /// Summary of the answer or the error.
    pub message: String,
    /// Round-trip time, when the endpoint answered.
    pub latency_ms: Option<u64>,
}

impl ProbeCheck {
    /// Returns true if the check passed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == CheckStatus::Success
    }
}

/// Results of a full probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    /// Checks in the order they ran.
    pub checks: Vec<ProbeCheck>,
}

impl ProbeReport {
    /// Returns true if every check passed.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.checks.iter().all(ProbeCheck::is_ok)
    }

    /// Returns the checks that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ProbeCheck> {
        self.checks.iter().filter(|c| !c.is_ok())
    }

    /// One-line summary, e.g. `3/4 checks passed`.
    #[must_use]
    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.is_ok()).count();
        format!("{}/{} checks passed", passed, self.checks.len())
    }
}

/// Probes the backend the tracker depends on.
#[derive(Debug, Clone)]
pub struct ConnectionProbe {
    client: OrchestratorClient,
}

impl ConnectionProbe {
    /// Creates a probe over the given client.
    #[must_use]
    pub fn new(client: OrchestratorClient) -> Self {
        Self { client }
    }

    /// Runs every check in sequence.
    pub async fn run(&self) -> ProbeReport {
        let checks = vec![
            check("Health Check", "/health", self.client.health(), |health| {
                if health.is_ok() {
                    Ok("Backend is healthy".to_string())
                } else {
                    Err(format!("backend reported {:?}", health.status))
                }
            })
            .await,
            check("Districts", "/catalog/districts", self.client.districts(), |d| {
                Ok(format!("{} districts loaded", d.len()))
            })
            .await,
            check("Warehouses", "/catalog/warehouses", self.client.warehouses(), |w| {
                Ok(format!("{} warehouses loaded", w.len()))
            })
            .await,
            check("Drivers", "/catalog/drivers", self.client.drivers(), |d| {
                Ok(format!("{} drivers loaded", d.len()))
            })
            .await,
        ];

        ProbeReport { checks }
    }
}

async fn check<T, F, D>(
    name: &'static str,
    endpoint: &'static str,
    request: F,
    describe: D,
) -> ProbeCheck
where
    F: Future<Output = Result<T, ClientError>>,
    D: FnOnce(T) -> Result<String, String>,
{
    let started = Instant::now();
    let result = request.await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (status, message, latency_ms) = match result.map_err(|e| e.to_string()) {
        Ok(value) => match describe(value) {
            Ok(message) => (CheckStatus::Success, message, Some(latency_ms)),
            Err(message) => (CheckStatus::Error, message, Some(latency_ms)),
        },
        Err(message) => (CheckStatus::Error, message, None),
    };

    ProbeCheck {
        name,
        endpoint,
        status,
        message,
        latency_ms,
    }
}
