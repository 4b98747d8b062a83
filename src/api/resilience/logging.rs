//! Structured request logging with correlation ids
//!
//! Every request gets a fresh correlation id that is sent as
//! `X-Correlation-Id` and repeated in each JSON log line for that request.

use log::{debug, warn};
use serde_json::json;
use std::time::{Duration, Instant};

/// Monitoring and logging configuration
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub correlation_ids: bool,
    pub request_logging: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            correlation_ids: true,
            request_logging: true,
        }
    }
}

/// Structured logger for API requests
#[derive(Debug, Clone, Default)]
pub struct ApiLogger {
    config: MonitoringConfig,
}

/// Tracking context for one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: String,
    pub method: String,
    pub url: String,
    pub start_time: Instant,
}

impl RequestContext {
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl ApiLogger {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    pub fn correlation_ids_enabled(&self) -> bool {
        self.config.correlation_ids
    }

    pub fn start_request(&self, method: &str, url: &str) -> RequestContext {
        let context = RequestContext {
            correlation_id: uuid::Uuid::new_v4().to_string(),
            method: method.to_string(),
            url: url.to_string(),
            start_time: Instant::now(),
        };

        if self.config.request_logging {
            let log_data = json!({
                "event": "http_request",
                "correlation_id": context.correlation_id,
                "method": context.method,
                "url": context.url,
                "authorization": "[REDACTED]",
                "timestamp": chrono::Utc::now().to_rfc3339()
            });
            debug!("HTTP Request: {}", log_data);
        }

        context
    }

    pub fn log_response(&self, context: &RequestContext, status_code: u16) {
        if !self.config.request_logging {
            return;
        }

        let log_data = json!({
            "event": "http_response",
            "correlation_id": context.correlation_id,
            "method": context.method,
            "url": context.url,
            "status_code": status_code,
            "duration_ms": context.elapsed().as_millis(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        if status_code >= 400 {
            warn!("HTTP Response (Error): {}", log_data);
        } else {
            debug!("HTTP Response: {}", log_data);
        }
    }

    pub fn log_failure(&self, context: &RequestContext, error: &str) {
        let log_data = json!({
            "event": "http_failure",
            "correlation_id": context.correlation_id,
            "method": context.method,
            "url": context.url,
            "error": error,
            "duration_ms": context.elapsed().as_millis(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        warn!("HTTP Failure: {}", log_data);
    }
}
