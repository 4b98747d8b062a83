//! Typed client for the BluePrint REST API

pub mod backend;
pub mod client;
pub mod constants;
pub mod error;
pub mod models;
pub mod resilience;

pub use backend::ProjectBackend;
pub use client::BlueprintClient;
pub use error::{ApiError, is_unauthorized, message_or};
pub use resilience::{ResilienceConfig, RetryConfig, RetryPolicy};
