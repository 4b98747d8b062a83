//! Typed failures of the BluePrint REST API
//!
//! Everything above the client works with `anyhow::Error`; callers that need to
//! react to a specific failure (the 401 handler, notices that show the server's
//! message) downcast to [`ApiError`].

use reqwest::StatusCode;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401: the stored session is no longer valid
    #[error("session expired or invalid, please log in again")]
    Unauthorized,

    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("request failed"))]
    Http {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Builds the error for a non-success response from its status and raw body
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::Unauthorized;
        }

        ApiError::Http {
            status,
            message: extract_message(body),
        }
    }

    /// The server-provided message, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            ApiError::Decode(_) => None,
        }
    }
}

/// Reads the optional `message` field of an error body.
///
/// Validation failures report a list of messages, which are joined.
pub fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        _ => None,
    }
}

/// The server message carried by an error chain, or `fallback`
pub fn message_or(error: &anyhow::Error, fallback: &str) -> String {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ApiError>())
        .and_then(ApiError::server_message)
        .unwrap_or(fallback)
        .to_string()
}

/// True when any error in the chain is a 401 from the API
pub fn is_unauthorized(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_unauthorized_status_maps_to_unauthorized() {
        let error = ApiError::from_response(StatusCode::UNAUTHORIZED, r#"{"message":"Unauthorized"}"#);
        assert!(matches!(error, ApiError::Unauthorized));
    }

    #[test]
    fn test_message_extraction() {
        assert_eq!(
            extract_message(r#"{"statusCode":400,"message":"Template inválido"}"#).as_deref(),
            Some("Template inválido")
        );
        assert_eq!(
            extract_message(r#"{"message":["name should not be empty","email must be an email"]}"#).as_deref(),
            Some("name should not be empty; email must be an email")
        );
        assert_eq!(extract_message("<html>502 Bad Gateway</html>"), None);
        assert_eq!(extract_message(r#"{"error":"x"}"#), None);
    }

    #[test]
    fn test_unauthorized_detected_through_context() {
        let error: anyhow::Error = Err::<(), _>(ApiError::Unauthorized)
            .context("Failed to load project")
            .unwrap_err();
        assert!(is_unauthorized(&error));

        let other = anyhow::anyhow!("boom");
        assert!(!is_unauthorized(&other));
    }

    #[test]
    fn test_message_or_fallback() {
        let error: anyhow::Error = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"message":"Nome duplicado"}"#).into();
        assert_eq!(message_or(&error, "Erro desconhecido"), "Nome duplicado");

        let error = anyhow::anyhow!("timeout");
        assert_eq!(message_or(&error, "Erro desconhecido"), "Erro desconhecido");
    }
}
