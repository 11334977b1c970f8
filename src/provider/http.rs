//! Blocking HTTP transport shared by the providers.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder, RequestBuilder, Response};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use super::retry::RetryPolicy;
use super::{ProviderError, ProviderResult};

/// Longest error body kept in a `Status` error.
const MAX_ERROR_BODY: usize = 500;

/// POSTs JSON to provider endpoints with retries.
///
/// Rate limits and 5xx responses are retried per the [`RetryPolicy`]. When
/// the TLS fallback is enabled, a connection failure is retried once with a
/// client that skips certificate verification.
pub struct HttpTransport {
    client: Client,
    insecure: Option<Client>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(
        timeout: Duration,
        insecure_tls_fallback: bool,
        retry: RetryPolicy,
    ) -> ProviderResult<Self> {
        let client = builder(timeout).build().map_err(build_error)?;
        let insecure = if insecure_tls_fallback {
            Some(
                builder(timeout)
                    .danger_accept_invalid_certs(true)
                    .build()
                    .map_err(build_error)?,
            )
        } else {
            None
        };

        Ok(Self {
            client,
            insecure,
            timeout,
            retry,
        })
    }

    /// POST `body` as JSON and return the response body.
    pub fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        headers: &HeaderMap,
        body: &B,
    ) -> ProviderResult<String> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let err = match self.send_once(endpoint, headers, body) {
                Ok(text) => return Ok(text),
                Err(err) => err,
            };
            let wait = if err.is_retryable() {
                self.retry.next_wait(attempts, err.retry_after())
            } else {
                None
            };
            let Some(wait) = wait else {
                return Err(err);
            };
            warn!(
                error = %err,
                attempt = attempts,
                wait_ms = wait.as_millis() as u64,
                "provider request failed, retrying"
            );
            thread::sleep(wait);
        }
    }

    fn send_once<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        headers: &HeaderMap,
        body: &B,
    ) -> ProviderResult<String> {
        let request = |client: &Client| -> RequestBuilder {
            client.post(endpoint).headers(headers.clone()).json(body)
        };

        let sent = match (request(&self.client).send(), &self.insecure) {
            (Err(err), Some(insecure)) if err.is_connect() => {
                warn!(
                    endpoint,
                    error = %err,
                    "connection failed, retrying without certificate verification"
                );
                request(insecure).send()
            }
            (sent, _) => sent,
        };
        let response = sent.map_err(|err| self.request_error(err))?;
        debug!(endpoint, status = response.status().as_u16(), "provider responded");
        read_response(response)
    }

    fn request_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::Http(err.to_string())
        }
    }
}

fn builder(timeout: Duration) -> ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("vlmweave/", env!("CARGO_PKG_VERSION")))
}

fn build_error(err: reqwest::Error) -> ProviderError {
    ProviderError::Http(format!("failed to build HTTP client: {}", err))
}

fn read_response(response: Response) -> ProviderResult<String> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(ProviderError::RateLimited { retry_after });
    }

    let body = response
        .text()
        .map_err(|err| ProviderError::Http(err.to_string()))?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            code: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        });
    }
    Ok(body)
}
