//! HTTP client implementation.
//!
//! Provides the main HTTP client for the orchestrator REST API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

use super::config::ClientConfig;
use super::error::ClientError;
use crate::endpoints::Endpoints;
use crate::types::{
    Catalog, CustodyEvent, District, Driver, FailureEvent, Health, MapConfig, Order, OrderRequest,
    QuoteRequest, RegisterRequest, RoutePlan, StatusUpdate, Token, User, Warehouse,
};

/// Base delay before retrying a timed-out request, in milliseconds.
const TIMEOUT_BACKOFF_BASE_MS: u64 = 100;

/// Upper bound on the timeout retry delay, in milliseconds.
const MAX_TIMEOUT_BACKOFF_MS: u64 = 30_000;

/// Error body returned by the backend.
///
/// `detail` is a string for most errors and a list for validation errors.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorResponse {
    fn into_message(self) -> Option<String> {
        match self.detail {
            Some(serde_json::Value::String(detail)) => Some(detail),
            Some(serde_json::Value::Null) | None => self.message,
            Some(other) => Some(other.to_string()),
        }
    }
}

/// HTTP client for the orchestrator REST API.
///
/// Cloning is cheap; clones share the connection pool and the memoized
/// catalog.
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    config: ClientConfig,
    base: Url,
    http: reqwest::Client,
    catalog: Arc<OnceCell<Catalog>>,
}

impl OrchestratorClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let base = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidConfig(format!("base_url: {}", e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(
                "base_url cannot be used as a base".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(&config.user_agent)
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self {
            config,
            base,
            http,
            catalog: Arc::new(OnceCell::new()),
        })
    }

    /// Creates a client for the process-wide API origin
    /// (see [`Endpoints::global`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_endpoints(Endpoints::global()))
    }

    /// Creates a new client with the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(ClientConfig::new(base_url))
    }

    /// Returns a client that sends `token` as a bearer token.
    ///
    /// The new client shares the connection pool and catalog cache.
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            config: self.config.clone().with_bearer_token(token),
            base: self.base.clone(),
            http: self.http.clone(),
            catalog: Arc::clone(&self.catalog),
        }
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns true if requests carry a bearer token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.config.bearer_token.is_some()
    }

    /// Builds an endpoint URL from path segments, percent-encoding each.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidConfig("base_url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Makes a GET request to the given path.
    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let url = self.url(segments)?;
        self.request_with_retry(|| self.authorize(self.http.get(url.clone())))
            .await
    }

    /// Makes a request with retry logic.
    ///
    /// Only used for idempotent requests.
    async fn request_with_retry<T, F>(&self, request_fn: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;
        let mut retry_count = 0;

        while retry_count <= self.config.max_retries {
            match request_fn().send().await {
                Ok(resp) => {
                    if resp.status() == StatusCode::TOO_MANY_REQUESTS
                        && retry_count < self.config.max_retries
                    {
                        let wait_time = retry_after(&resp).unwrap_or(1);
                        debug!(retry_count, wait_time, "rate limited, retrying");
                        tokio::time::sleep(Duration::from_secs(wait_time)).await;
                        retry_count += 1;
                        continue;
                    }

                    return decode(resp).await;
                }
                Err(e) => {
                    if e.is_timeout() && retry_count < self.config.max_retries {
                        retry_count += 1;
                        debug!(retry_count, "request timed out, retrying");
                        tokio::time::sleep(timeout_backoff(retry_count)).await;
                        last_error = Some(ClientError::from(e));
                        continue;
                    }
                    return Err(ClientError::from(e));
                }
            }
        }

        Err(last_error.unwrap_or(ClientError::Timeout))
    }

    /// Sends a non-idempotent request exactly once.
    async fn send_once<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let resp = self.authorize(request).send().await?;
        decode(resp).await
    }

    /// Checks backend health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn health(&self) -> Result<Health, ClientError> {
        self.get(&["health"]).await
    }

    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the email is taken.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ClientError> {
        let url = self.url(&["register"])?;
        self.send_once(self.http.post(url).json(request)).await
    }

    /// Exchanges credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<Token, ClientError> {
        let url = self.url(&["login"])?;
        let form = [("username", email), ("password", password)];
        self.send_once(self.http.post(url).form(&form)).await
    }

    /// Logs in and returns a client authorized with the issued token.
    ///
    /// # Errors
    ///
    /// Returns an error if the login fails.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Self, ClientError> {
        let token = self.login(email, password).await?;
        Ok(self.with_token(token.access_token))
    }

    /// Returns the user the bearer token belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] without a valid token.
    pub async fn me(&self) -> Result<User, ClientError> {
        self.get(&["me"]).await
    }

    /// Gets all districts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn districts(&self) -> Result<Vec<District>, ClientError> {
        self.get(&["catalog", "districts"]).await
    }

    /// Gets all warehouses.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn warehouses(&self) -> Result<Vec<Warehouse>, ClientError> {
        self.get(&["catalog", "warehouses"]).await
    }

    /// Gets all drivers.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn drivers(&self) -> Result<Vec<Driver>, ClientError> {
        self.get(&["catalog", "drivers"]).await
    }

    /// Returns the full catalog, fetching it on first use.
    ///
    /// Concurrent first callers share a single fetch. A failed fetch is
    /// not cached; the next call tries again.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the catalog requests fail.
    pub async fn catalog(&self) -> Result<&Catalog, ClientError> {
        self.catalog
            .get_or_try_init(|| async {
                let (districts, warehouses, drivers) =
                    tokio::try_join!(self.districts(), self.warehouses(), self.drivers())?;
                debug!(
                    districts = districts.len(),
                    warehouses = warehouses.len(),
                    drivers = drivers.len(),
                    "catalog loaded"
                );
                Ok::<_, ClientError>(Catalog {
                    districts,
                    warehouses,
                    drivers,
                })
            })
            .await
    }

    /// Gets the map tile configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn map_config(&self) -> Result<MapConfig, ClientError> {
        self.get(&["map", "config"]).await
    }

    /// Requests a route quote.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if no route exists, or another
    /// error if the request fails.
    pub async fn quote(&self, request: &QuoteRequest) -> Result<RoutePlan, ClientError> {
        let url = self.url(&["quote"])?;
        self.send_once(self.http.post(url).json(request)).await
    }

    /// Places an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create_order(&self, request: &OrderRequest) -> Result<Order, ClientError> {
        let url = self.url(&["orders"])?;
        self.send_once(self.http.post(url).json(request)).await
    }

    /// Gets all orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn orders(&self) -> Result<Vec<Order>, ClientError> {
        self.get(&["orders"]).await
    }

    /// Gets an order by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the order does not exist.
    pub async fn order(&self, order_id: &str) -> Result<Order, ClientError> {
        self.get(&["orders", order_id]).await
    }

    /// Sets the status of an order.
    ///
    /// The backend broadcasts an `order_status_changed` event on success.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the order does not exist.
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: &str,
    ) -> Result<StatusUpdate, ClientError> {
        let url = self.url(&["orders", order_id, "status"])?;
        self.send_once(self.http.patch(url).query(&[("status", status)]))
            .await
    }

    /// Gets the custody chain of an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn custody_events(&self, order_id: &str) -> Result<Vec<CustodyEvent>, ClientError> {
        self.get(&["orders", order_id, "custody-events"]).await
    }

    /// Gets the failures recorded against an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn failures(&self, order_id: &str) -> Result<Vec<FailureEvent>, ClientError> {
        self.get(&["orders", order_id, "failures"]).await
    }
}

fn retry_after(resp: &Response) -> Option<u64> {
    resp.headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

/// Maps a response to a value or a typed error.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();

    if status.is_success() {
        let body = resp
            .text()
            .await
            .map_err(|e| ClientError::Deserialization(e.to_string()))?;
        let body = if body.trim().is_empty() { "null" } else { &body };

        return serde_json::from_str(body)
            .map_err(|e| ClientError::Deserialization(e.to_string()));
    }

    let retry_after = retry_after(&resp);
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .ok()
        .and_then(ApiErrorResponse::into_message)
        .unwrap_or_else(|| {
            if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            }
        });

    Err(match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited { retry_after },
        _ => ClientError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

/// Delay before retrying a timed-out request: 100 ms doubled per retry,
/// capped at [`MAX_TIMEOUT_BACKOFF_MS`].
fn timeout_backoff(retry_count: u32) -> Duration {
    let factor = 1_u64.checked_shl(retry_count).unwrap_or(u64::MAX);
    Duration::from_millis(
        TIMEOUT_BACKOFF_BASE_MS
            .saturating_mul(factor)
            .min(MAX_TIMEOUT_BACKOFF_MS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_backoff_doubles_and_caps() {
        assert_eq!(timeout_backoff(1), Duration::from_millis(200));
        assert_eq!(timeout_backoff(3), Duration::from_millis(800));
        assert_eq!(
            timeout_backoff(58),
            Duration::from_millis(MAX_TIMEOUT_BACKOFF_MS)
        );
        assert_eq!(
            timeout_backoff(u32::MAX),
            Duration::from_millis(MAX_TIMEOUT_BACKOFF_MS)
        );
    }

    #[test]
    fn test_client_new() {
        let config = ClientConfig::new("https://api.example.com");
        let client = OrchestratorClient::new(config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_with_defaults() {
        let client = OrchestratorClient::with_defaults();
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_invalid_config() {
        let client = OrchestratorClient::with_base_url("");
        assert!(client.is_err());
    }

    #[test]
    fn test_client_with_token() {
        let client = OrchestratorClient::with_base_url("https://api.example.com")
            .expect("client creation");
        assert!(!client.is_authenticated());

        let authed = client.with_token("jwt");
        assert!(authed.is_authenticated());
        assert_eq!(authed.config().bearer_token.as_deref(), Some("jwt"));
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_url_encodes_segments() {
        let client = OrchestratorClient::with_base_url("http://backend:8000/api")
            .expect("client creation");
        let url = client
            .url(&["orders", "ORD 42/x", "status"])
            .expect("url");
        assert_eq!(url.as_str(), "http://backend:8000/api/orders/ORD%2042%2Fx/status");
    }

    #[test]
    fn test_api_error_message() {
        let parsed: ApiErrorResponse =
            serde_json::from_str(r#"{"detail":"Order not found"}"#).expect("deserialize");
        assert_eq!(parsed.into_message().as_deref(), Some("Order not found"));

        let parsed: ApiErrorResponse =
            serde_json::from_str(r#"{"message":"bad input"}"#).expect("deserialize");
        assert_eq!(parsed.into_message().as_deref(), Some("bad input"));

        let parsed: ApiErrorResponse =
            serde_json::from_str(r#"{"detail":[{"loc":["body"],"msg":"field required"}]}"#)
                .expect("deserialize");
        assert!(parsed
            .into_message()
            .is_some_and(|m| m.contains("field required")));
    }
}
