//! Retry policies with exponential backoff
//!
//! Only read-only requests go through a retry policy. Toggles and other
//! mutations are sent exactly once.

use log::{debug, info, warn};
use rand::Rng;
use reqwest::Response;
use std::future::Future;
use std::time::Duration;

use crate::api::error::ApiError;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A single attempt with no delay
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

/// How a failed attempt should be treated
#[derive(Debug, Clone, PartialEq)]
pub enum RetryableError {
    /// Connection refused, DNS, reset
    Network,
    ServerError(u16),
    RateLimited,
    Timeout,
    /// 4xx other than 408 and 429
    ClientError(u16),
    AuthError,
    Unknown,
}

impl RetryableError {
    pub fn should_retry(&self) -> bool {
        match self {
            RetryableError::Network
            | RetryableError::ServerError(_)
            | RetryableError::RateLimited
            | RetryableError::Timeout => true,
            RetryableError::ClientError(_) | RetryableError::AuthError | RetryableError::Unknown => false,
        }
    }

    pub fn from_status_code(status: u16) -> Self {
        match status {
            401 | 403 => RetryableError::AuthError,
            408 => RetryableError::Timeout,
            429 => RetryableError::RateLimited,
            400..=499 => RetryableError::ClientError(status),
            500..=599 => RetryableError::ServerError(status),
            _ => RetryableError::Unknown,
        }
    }

    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            RetryableError::Timeout
        } else if error.is_connect() || error.is_request() {
            RetryableError::Network
        } else if let Some(status) = error.status() {
            Self::from_status_code(status.as_u16())
        } else {
            RetryableError::Unknown
        }
    }
}

/// Retry policy that implements exponential backoff with jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Sends a request until it yields a non-retryable outcome.
    ///
    /// Retryable status codes (408, 429, 5xx) are retried like transport
    /// failures; the last response is returned as-is when attempts run out so
    /// the caller can turn it into an [`ApiError`] with the server's message.
    pub async fn execute<F, Fut>(&self, operation: F) -> Result<Response, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Response, reqwest::Error>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("Sending request (attempt {}/{})", attempt, max_attempts);

            match operation().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retryable = !response.status().is_success()
                        && RetryableError::from_status_code(status).should_retry();

                    if !retryable || attempt >= max_attempts {
                        if attempt > 1 {
                            info!("Request finished after {} attempts with status {}", attempt, status);
                        }
                        return Ok(response);
                    }

                    warn!("Request returned {} on attempt {} (retryable)", status, attempt);
                }
                Err(error) => {
                    let should_retry = RetryableError::from_reqwest_error(&error).should_retry();

                    if !should_retry || attempt >= max_attempts {
                        warn!(
                            "Request failed permanently on attempt {} (should_retry: {}): {}",
                            attempt, should_retry, error
                        );
                        return Err(ApiError::Network(error));
                    }

                    warn!("Request failed on attempt {} (retryable): {}", attempt, error);
                }
            }

            let delay = self.calculate_delay(attempt);
            debug!("Waiting {:?} before retry", delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Exponential backoff capped at `max_delay`, optionally jittered by ±50%
    pub(crate) fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = (self.config.base_delay.as_millis() as f64)
            * self.config.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);

        let mut delay = Duration::from_millis(delay_ms as u64).min(self.config.max_delay);

        if self.config.jitter && !delay.is_zero() {
            let jitter_factor = rand::rng().random_range(0.5..=1.5);
            delay = Duration::from_millis((delay.as_millis() as f64 * jitter_factor) as u64);
        }

        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_error_classification() {
        assert!(RetryableError::Network.should_retry());
        assert!(RetryableError::ServerError(503).should_retry());
        assert!(RetryableError::RateLimited.should_retry());
        assert!(RetryableError::Timeout.should_retry());

        assert!(!RetryableError::ClientError(400).should_retry());
        assert!(!RetryableError::AuthError.should_retry());
        assert!(!RetryableError::Unknown.should_retry());
    }

    #[test]
    fn test_status_code_classification() {
        assert_eq!(RetryableError::from_status_code(401), RetryableError::AuthError);
        assert_eq!(RetryableError::from_status_code(408), RetryableError::Timeout);
        assert_eq!(RetryableError::from_status_code(429), RetryableError::RateLimited);
        assert_eq!(RetryableError::from_status_code(404), RetryableError::ClientError(404));
        assert_eq!(RetryableError::from_status_code(502), RetryableError::ServerError(502));
        assert_eq!(RetryableError::from_status_code(302), RetryableError::Unknown);
    }

    #[test]
    fn test_delay_is_exponential_and_capped() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            backoff_multiplier: 2.0,
            jitter: false,
        });

        assert_eq!(policy.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(350));
        assert_eq!(policy.calculate_delay(4), Duration::from_millis(350));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        });

        for _ in 0..50 {
            let delay = policy.calculate_delay(1);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_none_config_makes_single_attempt() {
        let config = RetryConfig::none();
        assert_eq!(config.max_attempts, 1);
        assert_eq!(RetryConfig::default().with_max_attempts(0).max_attempts, 1);
    }
}
