use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::JobClientError;

/// Retry behaviour applied by a [`JobClient`](crate::api::JobClient) to every
/// request it issues. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Total attempts = 1 + max_retries.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Upper bound for a single wait between attempts, `retry-after` included.
    pub max_delay_ms: u64,
    /// Whether 5xx responses count as transient.
    pub retry_on_server_error: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 10_000,
            retry_on_server_error: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that surfaces the first failure as-is.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate the delay for a given retry attempt using exponential backoff.
    /// delay = base_delay_ms * 2^(attempt - 1), capped at max_delay_ms
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let ms = 2u64
            .checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.base_delay_ms.checked_mul(factor))
            .unwrap_or(u64::MAX)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Transient failures: no response at all, 429, and (optionally) 5xx.
    pub fn should_retry(&self, err: &JobClientError) -> bool {
        match err {
            JobClientError::Network { .. } | JobClientError::RateLimited { .. } => true,
            JobClientError::Server { .. } => self.retry_on_server_error,
            JobClientError::NotFound { .. }
            | JobClientError::Client { .. }
            | JobClientError::Timeout { .. }
            | JobClientError::Protocol { .. }
            | JobClientError::Cancelled { .. } => false,
        }
    }

    /// How long to wait before retry number `attempt`. A `retry-after` from
    /// the server wins when it is longer than the computed backoff, but the
    /// wait never exceeds `max_delay_ms`.
    pub fn wait_before_retry(&self, attempt: u32, err: &JobClientError) -> Duration {
        let backoff = self.delay_for_attempt(attempt);
        let wait = match err.retry_after() {
            Some(requested) => backoff.max(requested),
            None => backoff,
        };
        wait.min(Duration::from_millis(self.max_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error() -> JobClientError {
        JobClientError::Server {
            context: "test",
            status: 500,
        }
    }

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay_ms, 100);
        assert!(policy.retry_on_server_error);
        assert_eq!(RetryPolicy::no_retries().max_retries, 0);
    }

    #[test]
    fn exponential_backoff() {
        let policy = RetryPolicy {
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            ..Default::default()
        };
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(8000));
    }

    #[test]
    fn backoff_is_capped_and_never_overflows() {
        let policy = RetryPolicy {
            base_delay_ms: 100,
            max_delay_ms: 500,
            ..Default::default()
        };
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(200), Duration::from_millis(500));
    }

    #[test]
    fn transient_failures_are_retried() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(&JobClientError::Network {
            context: "test",
            message: "connection reset".into(),
        }));
        assert!(policy.should_retry(&JobClientError::RateLimited {
            context: "test",
            retry_after_secs: None,
        }));
        assert!(policy.should_retry(&server_error()));
    }

    #[test]
    fn server_errors_can_be_made_fatal() {
        let policy = RetryPolicy {
            retry_on_server_error: false,
            ..Default::default()
        };
        assert!(!policy.should_retry(&server_error()));
    }

    #[test]
    fn fatal_failures_are_not_retried() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(&JobClientError::NotFound {
            context: "test",
            status: 404,
        }));
        assert!(!policy.should_retry(&JobClientError::Client {
            context: "test",
            status: Some(400),
            message: "bad request".into(),
        }));
        assert!(!policy.should_retry(&JobClientError::Protocol {
            job_id: "abc".into(),
            status: "weird".into(),
        }));
    }

    #[test]
    fn retry_after_overrides_shorter_backoff() {
        let policy = RetryPolicy::default();
        let limited = JobClientError::RateLimited {
            context: "test",
            retry_after_secs: Some(2),
        };
        assert_eq!(policy.wait_before_retry(1, &limited), Duration::from_secs(2));

        let policy = RetryPolicy {
            base_delay_ms: 5000,
            ..Default::default()
        };
        assert_eq!(
            policy.wait_before_retry(1, &limited),
            Duration::from_millis(5000)
        );
        assert_eq!(
            policy.wait_before_retry(1, &server_error()),
            Duration::from_millis(5000)
        );
    }

    #[test]
    fn retry_after_is_capped_by_max_delay() {
        let policy = RetryPolicy::default();
        let limited = JobClientError::RateLimited {
            context: "test",
            retry_after_secs: Some(86_400),
        };
        assert_eq!(
            policy.wait_before_retry(1, &limited),
            Duration::from_millis(policy.max_delay_ms)
        );

        let policy = RetryPolicy {
            max_delay_ms: 1_500,
            ..Default::default()
        };
        let limited = JobClientError::RateLimited {
            context: "test",
            retry_after_secs: Some(2),
        };
        assert_eq!(
            policy.wait_before_retry(3, &limited),
            Duration::from_millis(1_500)
        );
    }
}
