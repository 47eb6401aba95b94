//! Service error types.

use thiserror::Error;

/// Errors that can occur when talking to an analysis or question service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Authentication failed (missing or invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The service returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The response did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    /// Map a non-success HTTP status and body to an error.
    ///
    /// The analysis backend reports failures as `{"error": "..."}`; that
    /// message is used when present.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 401 || status == 403 {
            return ServiceError::AuthenticationFailed(body);
        }
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(body);
        ServiceError::ApiError { status, message }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_secs: u64) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout(timeout_secs)
        } else {
            ServiceError::NetworkError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_is_extracted() {
        let err = ServiceError::from_status(400, r#"{"error": "Theme is required."}"#.into());
        assert_eq!(err.to_string(), "API error (HTTP 400): Theme is required.");
    }

    #[test]
    fn plain_body_is_kept() {
        let err = ServiceError::from_status(500, "internal error".into());
        assert!(matches!(err, ServiceError::ApiError { status: 500, ref message } if message == "internal error"));
    }

    #[test]
    fn unauthorized_maps_to_authentication() {
        assert!(matches!(
            ServiceError::from_status(401, "bad key".into()),
            ServiceError::AuthenticationFailed(_)
        ));
    }
}
