//! Bounded retries with jittered exponential backoff for upstream calls.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::adapter::SourceError;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};

/// How often, and how patiently, a failed upstream call is repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Randomize each delay by +/- 50%.
    pub jitter: bool,
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            jitter: true,
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self::with_max_retries(0)
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let scale = 2_f64.powi(attempt.min(30) as i32);
        let seconds = (self.base_delay.as_secs_f64() * scale).min(self.max_delay.as_secs_f64());
        let delay = Duration::from_secs_f64(seconds);

        if !self.jitter {
            return delay;
        }

        let half_ms = (delay.as_millis() / 2) as u64;
        let offset = fastrand::u64(0..=half_ms * 2);
        let total_ms = (delay.as_millis() as u64 + offset).saturating_sub(half_ms);
        Duration::from_millis(total_ms)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's budget is spent.
pub async fn retry_with<T, F, Fut>(
    policy: &RetryPolicy,
    upstream: &str,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0_u32;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !error.retryable() || attempt >= policy.max_retries {
            return Err(error);
        }

        let delay = policy.delay(attempt);
        debug!(
            upstream,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "retrying upstream call"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Execute `request`, retrying transport errors and retryable statuses.
///
/// Non-2xx responses that are not retryable come back as
/// `SourceError::upstream_rejected`; everything else that exhausts the budget
/// is `SourceError::upstream_fetch`.
pub async fn send_with_retry(
    client: &dyn HttpClient,
    request: HttpRequest,
    policy: &RetryPolicy,
    upstream: &str,
) -> Result<HttpResponse, SourceError> {
    retry_with(policy, upstream, || send_once(client, request.clone(), policy, upstream)).await
}

/// One attempt at `request`, classified by whether a retry could help.
pub async fn send_once(
    client: &dyn HttpClient,
    request: HttpRequest,
    policy: &RetryPolicy,
    upstream: &str,
) -> Result<HttpResponse, SourceError> {
    match client.execute(request).await {
        Ok(response) if response.is_success() => Ok(response),
        Ok(response) => {
            let message = format!("{upstream} returned status {}", response.status);
            if policy.should_retry_status(response.status) {
                Err(SourceError::upstream_fetch(message))
            } else {
                Err(SourceError::upstream_rejected(message))
            }
        }
        Err(error) => {
            let message = format!("{upstream} transport error: {}", error.message());
            if error.retryable() {
                Err(SourceError::upstream_fetch(message))
            } else {
                Err(SourceError::upstream_rejected(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SourceErrorKind;
    use crate::http_client::{HttpError, HttpFuture};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct SequenceHttpClient {
        responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        calls: Mutex<u32>,
    }

    impl SequenceHttpClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().expect("call counter should not be poisoned")
        }
    }

    impl HttpClient for SequenceHttpClient {
        fn execute<'a>(&'a self, _request: HttpRequest) -> HttpFuture<'a> {
            *self.calls.lock().expect("call counter should not be poisoned") += 1;
            let next = self
                .responses
                .lock()
                .expect("response queue should not be poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::new("script exhausted")));
            Box::pin(async move { next })
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            jitter: false,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn delay_doubles_and_caps_without_jitter() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            jitter: false,
            ..RetryPolicy::default()
        };

        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(350));
    }

    #[test]
    fn jittered_delay_stays_within_half_either_side() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(200),
            ..RetryPolicy::default()
        };

        for _ in 0..20 {
            let delay = policy.delay(0).as_millis();
            assert!((100..=300).contains(&delay), "delay_ms={delay}");
        }
    }

    #[tokio::test]
    async fn retries_retryable_status_then_succeeds() {
        let client = SequenceHttpClient::new(vec![
            Ok(HttpResponse::with_status(503, "busy")),
            Ok(HttpResponse::ok_json("{}")),
        ]);

        let response = send_with_retry(&client, HttpRequest::get("https://x.test"), &fast_policy(2), "test")
            .await
            .expect("second attempt succeeds");

        assert_eq!(response.status, 200);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let client = SequenceHttpClient::new(vec![Ok(HttpResponse::with_status(400, "bad"))]);

        let error = send_with_retry(&client, HttpRequest::get("https://x.test"), &fast_policy(3), "test")
            .await
            .expect_err("400 is final");

        assert_eq!(error.kind(), SourceErrorKind::UpstreamFetch);
        assert!(!error.retryable());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn exhausted_budget_surfaces_last_transport_error() {
        let client = SequenceHttpClient::new(vec![
            Err(HttpError::new("connection reset")),
            Err(HttpError::new("connection reset")),
        ]);

        let error = send_with_retry(&client, HttpRequest::get("https://x.test"), &fast_policy(1), "test")
            .await
            .expect_err("both attempts fail");

        assert_eq!(error.kind(), SourceErrorKind::UpstreamFetch);
        assert!(error.message().contains("connection reset"));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn retry_with_repeats_only_retryable_errors() {
        let mut attempts = 0_u32;
        let error = retry_with(&fast_policy(2), "test", || {
            attempts += 1;
            async { Err::<(), _>(SourceError::upstream_fetch("indexing_error")) }
        })
        .await
        .expect_err("budget spent");
        assert!(error.retryable());
        assert_eq!(attempts, 3);

        let mut attempts = 0_u32;
        retry_with(&fast_policy(2), "test", || {
            attempts += 1;
            async { Err::<(), _>(SourceError::invalid_response("bad shape")) }
        })
        .await
        .expect_err("not retryable");
        assert_eq!(attempts, 1);
    }
}
