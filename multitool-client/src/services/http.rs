//! HTTP session with a retry policy
//!
//! Server errors (500, 502, 503, 504), connection failures, and timeouts are
//! retried with exponential backoff. Every other failure is returned at once.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use super::ServiceError;

/// Per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of retries after the first attempt
pub const DEFAULT_RETRIES: u32 = 3;

/// Base delay for exponential backoff
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Statuses that are worth retrying
pub const RETRY_STATUSES: &[StatusCode] = &[
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// When and how long to wait before retrying a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    /// Delay before the first retry; doubles for each one after
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based)
    pub fn delay(&self, retry: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }

    /// Whether a response with this status should be retried
    pub fn retries_status(&self, status: StatusCode) -> bool {
        RETRY_STATUSES.contains(&status)
    }
}

/// Shared HTTP client plus retry policy
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    policy: RetryPolicy,
    timeout: Duration,
}

impl HttpSession {
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            policy,
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Build and send a request, retrying per the policy
    ///
    /// `build` is called once per attempt. Returns the first successful
    /// response, or the last failure once retries are exhausted.
    pub async fn send<F>(&self, build: F) -> Result<Response, ServiceError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut retry = 0;

        loop {
            let result = build(&self.client).timeout(self.timeout).send().await;

            let retryable = match &result {
                Ok(response) => self.policy.retries_status(response.status()),
                Err(e) => e.is_connect() || e.is_timeout(),
            };

            if retryable && retry < self.policy.retries {
                retry += 1;
                let delay = self.policy.delay(retry);
                match &result {
                    Ok(response) => {
                        warn!(status = %response.status(), retry, ?delay, "server error, retrying")
                    }
                    Err(e) => warn!(error = %e, retry, ?delay, "request failed, retrying"),
                }
                tokio::time::sleep(delay).await;
                continue;
            }

            let response = result?;
            let status = response.status();
            if !status.is_success() {
                return Err(ServiceError::Status(status));
            }

            debug!(url = %response.url(), %status, "request succeeded");
            return Ok(response);
        }
    }

    /// GET `url` with retries
    pub async fn get(&self, url: &str) -> Result<Response, ServiceError> {
        self.send(|client| client.get(url)).await
    }
}

impl Default for HttpSession {
    fn default() -> Self {
        Self::new()
    }
}
