//! Mapping of HTTP failures onto [`DeskError`].

use std::fmt;

use reqwest::StatusCode;

use crate::error::DeskError;

use super::wire::RawErrorBody;

/// A failed API call, before it is classified into a [`DeskError`].
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Server-provided message, or the canonical reason phrase
    pub message: String,
    /// Host the request went to, for context ("identity" / "service")
    pub host: &'static str,
}

impl ApiError {
    /// Build from a status and raw response body.
    ///
    /// The body is expected to carry `{message}` but anything else is
    /// tolerated; the canonical reason phrase is used as a fallback.
    pub fn from_body(status: StatusCode, body: &str, host: &'static str) -> Self {
        let message = serde_json::from_str::<RawErrorBody>(body)
            .ok()
            .and_then(RawErrorBody::message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        Self {
            status,
            message,
            host,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Convert for a request that participates in session teardown.
    pub fn into_desk_error(self) -> DeskError {
        if self.is_unauthorized() {
            return DeskError::Unauthorized;
        }
        DeskError::Api {
            status: self.status.as_u16(),
            message: self.message,
        }
    }

    /// Convert for a login attempt: rejections become auth errors.
    pub fn into_login_error(self) -> DeskError {
        match self.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::BAD_REQUEST => {
                DeskError::Auth(self.message)
            }
            _ => DeskError::Api {
                status: self.status.as_u16(),
                message: self.message,
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} host returned {}: {}",
            self.host,
            self.status.as_u16(),
            self.message
        )
    }
}

impl From<ApiError> for DeskError {
    fn from(error: ApiError) -> Self {
        error.into_desk_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_body() {
        let err = ApiError::from_body(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Subject is too long"}"#,
            "service",
        );
        assert_eq!(err.message, "Subject is too long");
    }

    #[test]
    fn test_message_falls_back_to_reason() {
        let err = ApiError::from_body(StatusCode::BAD_GATEWAY, "<html>oops</html>", "service");
        assert_eq!(err.message, "Bad Gateway");
    }

    #[test]
    fn test_unauthorized_maps_to_teardown_error() {
        let err = ApiError::from_body(StatusCode::UNAUTHORIZED, "{}", "service");
        assert!(matches!(err.into_desk_error(), DeskError::Unauthorized));
    }

    #[test]
    fn test_login_rejection_is_auth_error() {
        let err = ApiError::from_body(
            StatusCode::UNAUTHORIZED,
            r#"{"message": "Invalid credentials"}"#,
            "identity",
        );
        match err.into_login_error() {
            DeskError::Auth(msg) => assert_eq!(msg, "Invalid credentials"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display_includes_host() {
        let err = ApiError::from_body(StatusCode::NOT_FOUND, "", "identity");
        assert_eq!(err.to_string(), "identity host returned 404: Not Found");
    }
}
