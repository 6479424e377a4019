//! Remote call failures.
//!
//! Every non-success HTTP response from the service becomes an [`ApiError`]
//! built from the service's JSON error envelope:
//!
//! ```json
//! { "error": { "code": 404, "message": "Corpus not found.", "status": "NOT_FOUND" } }
//! ```
//!
//! The error travels inside `anyhow::Error`; callers that need the status
//! recover it with `err.downcast_ref::<ApiError>()`.

use serde::Deserialize;

/// A failed call, as reported by the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status code of the response.
    pub http_status: u16,
    /// Canonical status name (`NOT_FOUND`, `INVALID_ARGUMENT`, ...), when given.
    pub status: Option<String>,
    pub message: String,
}

#[derive(Deserialize)]
struct Envelope {
    error: EnvelopeBody,
}

#[derive(Deserialize)]
struct EnvelopeBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl ApiError {
    /// Build from a response status and raw body. Bodies that are not a
    /// JSON error envelope are kept verbatim as the message.
    pub fn from_response(http_status: u16, body: &str) -> Self {
        match serde_json::from_str::<Envelope>(body) {
            Ok(envelope) => Self {
                http_status,
                status: envelope.error.status,
                message: envelope.error.message,
            },
            Err(_) => Self {
                http_status,
                status: None,
                message: body.trim().to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.http_status == 404 || self.status.as_deref() == Some("NOT_FOUND")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.status {
            Some(status) => write!(
                f,
                "remote call failed ({} {}): {}",
                self.http_status, status, self.message
            ),
            None => write!(f, "remote call failed ({}): {}", self.http_status, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_error_envelope() {
        let body = r#"{"error":{"code":400,"message":"Invalid answer style.","status":"INVALID_ARGUMENT"}}"#;
        let err = ApiError::from_response(400, body);
        assert_eq!(err.status.as_deref(), Some("INVALID_ARGUMENT"));
        assert_eq!(err.message, "Invalid answer style.");
        assert!(err.to_string().contains("400 INVALID_ARGUMENT"));
    }

    #[test]
    fn test_non_json_body_kept_verbatim() {
        let err = ApiError::from_response(502, "  Bad Gateway\n");
        assert_eq!(err.status, None);
        assert_eq!(err.message, "Bad Gateway");
    }

    #[test]
    fn test_not_found_detection() {
        assert!(ApiError::from_response(404, "").is_not_found());
        assert!(!ApiError::from_response(403, "").is_not_found());
    }

    #[test]
    fn test_downcast_through_context() {
        use anyhow::Context;
        let result: anyhow::Result<()> =
            Err(ApiError::from_response(404, "gone")).context("batch 2 of 3 failed");
        let err = result.unwrap_err();
        let api = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api.http_status, 404);
    }
}
