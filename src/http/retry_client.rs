use crate::http::error::FetchError;
use crate::http::transport::{JsonTransport, Pairs};
use bon::Builder;
use log::{error, warn};
use serde_json::Value;
use std::time::Duration;

/// How often and how patiently a request is retried.
///
/// The wait after failed attempt `n` (zero based) is `backoff_base * 2^n`, without jitter, so a
/// run against the same failing source always takes the same time.
///
/// # Examples
///
/// ```
/// use grid_weather::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder().max_retries(4).build();
/// assert_eq!(policy.backoff_base, Duration::from_secs(1));
/// assert_eq!(policy.delay(2), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    #[builder(default = 3)]
    pub max_retries: u32,
    #[builder(default = Duration::from_secs(1))]
    pub backoff_base: Duration,
    /// Per-request socket timeout.
    #[builder(default = Duration::from_secs(30))]
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RetryPolicy {
    /// Wait after the failed attempt with the given zero-based index.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }

    /// Sum of all waits a request that never succeeds goes through. Every failed
    /// attempt is followed by its wait, the last one included.
    pub fn total_backoff(&self) -> Duration {
        (0..self.attempts()).map(|i| self.delay(i)).sum()
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// GET-with-retry on top of a [`JsonTransport`].
pub struct RetryClient<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: JsonTransport> RetryClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Performs the request until it yields JSON or the attempts run out.
    ///
    /// Network failures, non-success statuses and undecodable bodies are all retried.
    /// The result is [`FetchError::Exhausted`] once every attempt has failed.
    pub async fn fetch(
        &self,
        url: &str,
        params: &Pairs,
        headers: &Pairs,
    ) -> Result<Value, FetchError> {
        let attempts = self.policy.attempts();
        let mut attempt = 0;

        loop {
            let err = match self
                .transport
                .get_json(url, params, headers, self.policy.timeout)
                .await
            {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            attempt += 1;

            let wait = self.policy.delay(attempt - 1);
            warn!(
                "Attempt {} failed: {}. Waiting {:.1}s",
                attempt,
                err,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;

            if attempt >= attempts {
                error!("Failed after {} attempts: {}", attempts, url);
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts,
                    last: Box::new(err),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::{MockTransport, Reply};
    use serde_json::json;
    use tokio::time::Instant;

    const URL: &str = "https://example.test/data";

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.backoff_base, Duration::from_secs(1));
        assert_eq!(policy.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::builder()
            .backoff_base(Duration::from_millis(500))
            .build();
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_secs(1));
        assert_eq!(policy.delay(3), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt_does_not_sleep() {
        let transport = MockTransport::new().route(URL, &[], [Reply::json(json!({"ok": true}))]);
        let client = RetryClient::new(transport, RetryPolicy::default());

        let started = Instant::now();
        let value = client.fetch(URL, &[], &[]).await.expect("fetch should succeed");

        assert_eq!(value, json!({"ok": true}));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let transport = MockTransport::new().route(
            URL,
            &[],
            [Reply::Fail, Reply::Fail, Reply::json(json!({"ok": 1}))],
        );
        let client = RetryClient::new(transport, RetryPolicy::default());

        let started = Instant::now();
        let value = client.fetch(URL, &[], &[]).await.expect("third attempt succeeds");

        assert_eq!(value, json!({"ok": 1}));
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_sleeps_exact_backoff_and_returns_error() {
        for (base_ms, max_retries) in [(1000, 3), (250, 5), (2000, 1)] {
            let policy = RetryPolicy::builder()
                .backoff_base(Duration::from_millis(base_ms))
                .max_retries(max_retries)
                .build();
            let transport = MockTransport::new();
            let client = RetryClient::new(transport, policy);

            let started = Instant::now();
            let result = client.fetch(URL, &[], &[]).await;

            let expected: Duration = (0..max_retries)
                .map(|i| Duration::from_millis(base_ms) * 2u32.pow(i))
                .sum();
            assert_eq!(started.elapsed(), expected);
            assert_eq!(policy.total_backoff(), expected);
            match result {
                Err(FetchError::Exhausted { attempts, .. }) => assert_eq!(attempts, max_retries),
                other => panic!("expected exhaustion, got {:?}", other),
            }
            assert_eq!(client.transport.calls().len(), max_retries as usize);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_policy_waits_after_every_failure() {
        let client = RetryClient::new(MockTransport::new(), RetryPolicy::default());

        let started = Instant::now();
        let result = client.fetch(URL, &[], &[]).await;

        assert!(result.is_err());
        assert_eq!(started.elapsed(), Duration::from_secs(1 + 2 + 4));
        assert_eq!(RetryPolicy::default().total_backoff(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_still_makes_one_attempt() {
        let policy = RetryPolicy::builder().max_retries(0).build();
        let client = RetryClient::new(MockTransport::new(), policy);

        let started = Instant::now();
        assert!(client.fetch(URL, &[], &[]).await.is_err());
        assert_eq!(client.transport.calls().len(), 1);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }
}
