//! A single HTTP call with exponential backoff on transient failures.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, instrument, warn};

use workmirror_core::error::{NetworkErrorKind, TransportError};

/// Per-request timeout unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("workmirror/", env!("CARGO_PKG_VERSION"));

/// Longest error body excerpt carried into a [`TransportError`].
const MAX_ERROR_MESSAGE: usize = 512;

/// How many times to try, and how long to wait in between.
///
/// Failed attempt `n` (1-indexed) is followed by a sleep of
/// `min(max_delay, base_delay * 2^(n-1) * jitter)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: RangeInclusive<f64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: 0.8..=1.2,
        }
    }
}

impl RetryPolicy {
    /// Sleep after failed attempt `attempt`, with a fresh jitter draw.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = if self.jitter.is_empty() {
            1.0
        } else {
            rand::thread_rng().gen_range(self.jitter.clone())
        };
        self.backoff(attempt, factor)
    }

    fn backoff(&self, attempt: u32, factor: f64) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as i32;
        let secs = self.base_delay.as_secs_f64() * 2f64.powi(exponent) * factor;
        Duration::from_secs_f64(secs.clamp(0.0, self.max_delay.as_secs_f64()))
    }
}

/// Executes requests, retrying 429/5xx and network failures.
///
/// Any other non-success status fails immediately. On exhaustion the error
/// of the final attempt is returned, with the attempt count.
#[derive(Debug, Clone)]
pub struct RetryingTransport {
    http: Client,
    policy: RetryPolicy,
}

impl RetryingTransport {
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Network {
                kind: NetworkErrorKind::Request,
                message: format!("failed to build HTTP client: {}", e),
                attempts: 0,
            })?;

        Ok(Self { http, policy })
    }

    /// Send the request produced by `request`, rebuilding it for every attempt.
    #[instrument(skip(self, request))]
    pub async fn send<F>(&self, request: F) -> Result<Response, TransportError>
    where
        F: Fn(&Client) -> RequestBuilder + Send,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let last_error = match request(&self.http).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(attempt, status = response.status().as_u16(), "request succeeded");
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    TransportError::Status {
                        status,
                        message: error_message(response).await,
                        attempts: attempt,
                    }
                }
                Err(e) => TransportError::Network {
                    kind: classify(&e),
                    message: e.without_url().to_string(),
                    attempts: attempt,
                },
            };

            if !last_error.is_retryable() || attempt >= max_attempts {
                return Err(last_error);
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %last_error,
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn classify(e: &reqwest::Error) -> NetworkErrorKind {
    if e.is_builder() {
        NetworkErrorKind::Request
    } else if e.is_timeout() {
        NetworkErrorKind::Timeout
    } else if e.is_connect() {
        NetworkErrorKind::Connect
    } else {
        NetworkErrorKind::Other
    }
}

/// Best-effort message from an error body: the `message` field if the body
/// is JSON, else the raw text.
async fn error_message(response: Response) -> Option<String> {
    let body = response.text().await.ok()?;
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);

    let message = message.trim();
    if message.is_empty() {
        return None;
    }
    Some(message.chars().take(MAX_ERROR_MESSAGE).collect())
}
