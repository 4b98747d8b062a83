//! Resilience configuration for the API client

use super::logging::MonitoringConfig;
use super::retry::RetryConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    /// Applied to read-only requests only
    pub retry: RetryConfig,
    pub monitoring: MonitoringConfig,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            monitoring: MonitoringConfig::default(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ResilienceConfig {
    /// Builds the client configuration from the user's settings file
    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        Self {
            retry: RetryConfig::default().with_max_attempts(settings.retry_attempts),
            monitoring: MonitoringConfig {
                correlation_ids: true,
                request_logging: settings.request_logging,
            },
            request_timeout: Duration::from_secs(settings.request_timeout_secs.max(1)),
            ..Self::default()
        }
    }

}
