//! `reqwest` implementation of the HTTP bridge.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("narrator-core/", env!("CARGO_PKG_VERSION"));

/// Fallback deadline for requests that carry no timeout of their own.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one attempt. `Retryable` is only produced while attempts remain.
enum Attempt {
    Done(HttpResponse),
    Retryable(BridgeError),
}

/// Reqwest-based HTTP client used to reach the synthesis service.
///
/// Transport failures and 5xx/429 responses are retried under the caller's
/// [`RetryPolicy`]. Once attempts run out the last response is returned with
/// its status so the caller can report it.
pub struct ReqwestHttpClient {
    client: Client,
    default_timeout: Duration,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });

        Self {
            client,
            default_timeout: timeout,
        }
    }

    /// Wrap a preconfigured client (proxies, custom TLS roots).
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }

    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(Self::convert_method(request.method), &request.url);

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    fn classify(&self, request: &HttpRequest, err: reqwest::Error) -> BridgeError {
        if err.is_timeout() {
            BridgeError::Timeout(request.timeout.unwrap_or(self.default_timeout))
        } else if err.is_connect() {
            BridgeError::Unreachable(err.to_string())
        } else {
            BridgeError::OperationFailed(err.to_string())
        }
    }

    async fn send_once(
        &self,
        request: &HttpRequest,
        policy: &RetryPolicy,
        last_attempt: bool,
    ) -> Result<Attempt> {
        let response = match self.build_request(request).send().await {
            Ok(response) => response,
            Err(e) => {
                let err = self.classify(request, e);
                return if err.is_transient() && !last_attempt {
                    Ok(Attempt::Retryable(err))
                } else {
                    Err(err)
                };
            }
        };

        let status = response.status().as_u16();
        if policy.retries_status(status) && !last_attempt {
            return Ok(Attempt::Retryable(BridgeError::OperationFailed(format!(
                "HTTP {}",
                status
            ))));
        }

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(request, e))?;

        Ok(Attempt::Done(HttpResponse {
            status,
            headers,
            body,
        }))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_retry(request, RetryPolicy::default())
            .await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let mut attempt = 1;

        loop {
            debug!(
                attempt,
                max_attempts = policy.max_attempts,
                url = %request.url,
                "Sending HTTP request"
            );
            let last_attempt = !policy.has_attempts_after(attempt);

            match self.send_once(&request, &policy, last_attempt).await? {
                Attempt::Done(response) => return Ok(response),
                Attempt::Retryable(err) => {
                    let delay = policy.delay_after(attempt);
                    warn!(
                        error = %err,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "HTTP attempt failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_names_the_crate_version() {
        assert!(USER_AGENT.starts_with("narrator-core/"));
        assert!(USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_build_request_applies_headers_and_timeout() {
        let client = ReqwestHttpClient::new();
        let request = HttpRequest::new(HttpMethod::Post, "http://localhost:5000/speak")
            .header("Accept", "audio/mpeg")
            .timeout(Duration::from_secs(10));

        let built = client.build_request(&request).build().unwrap();
        assert_eq!(built.method(), reqwest::Method::POST);
        assert_eq!(built.headers()["Accept"], "audio/mpeg");
        assert_eq!(built.timeout(), Some(&Duration::from_secs(10)));
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Post),
            reqwest::Method::POST
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_transient_failure() {
        let client = ReqwestHttpClient::with_timeout(Duration::from_millis(500));
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            use_exponential_backoff: true,
        };
        let request = HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:9/health");

        let err = client.execute_with_retry(request, policy).await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err}");
    }
}
