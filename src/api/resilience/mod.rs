//! Retry, timeout and request logging for the BluePrint API client

pub mod config;
pub mod logging;
pub mod retry;

pub use config::ResilienceConfig;
pub use logging::{ApiLogger, MonitoringConfig, RequestContext};
pub use retry::{RetryConfig, RetryPolicy, RetryableError};
