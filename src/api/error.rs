//! Error types for calls made through the API gateway.
//!
//! Every failure falls into one [`ErrorClass`]. Callers are expected to turn
//! errors into a notification rather than abort; only the authorization
//! class has a global side effect (the gateway sends the console back to the
//! login route before the error is returned).

use reqwest::StatusCode;
use thiserror::Error;

/// Error classes, in the order they are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Local, field-scoped; never reaches the network
    Validation,
    /// 401 from the server
    Authorization,
    /// 5xx from the server
    Server,
    /// Any other HTTP status, transport or decoding failure
    Request,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Validation => "validation",
            ErrorClass::Authorization => "authorization",
            ErrorClass::Server => "server",
            ErrorClass::Request => "request",
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: the server rejected the session token")]
    Unauthorized,

    #[error("Server error {status}: {body}")]
    Server { status: StatusCode, body: String },

    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build the error for a non-success response.
    pub fn from_status(status: StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized
        } else if status.is_server_error() {
            ApiError::Server { status, body }
        } else {
            ApiError::Status { status, body }
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ApiError::Unauthorized => ErrorClass::Authorization,
            ApiError::Server { .. } => ErrorClass::Server,
            ApiError::Status { .. }
            | ApiError::Transport(_)
            | ApiError::InvalidUrl(_)
            | ApiError::Decode(_) => ErrorClass::Request,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::Server { status, .. } | ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            ApiError::InvalidUrl(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, "").class(),
            ErrorClass::Authorization
        );
        assert_eq!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom").class(),
            ErrorClass::Server
        );
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "").class(),
            ErrorClass::Server
        );
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "Missing password").class(),
            ErrorClass::Request
        );
        assert_eq!(
            ApiError::from_status(StatusCode::NOT_FOUND, "").class(),
            ErrorClass::Request
        );
    }

    #[test]
    fn test_status_is_preserved() {
        let err = ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, "down");
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert!(err.to_string().contains("down"));

        assert_eq!(ApiError::Unauthorized.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert_eq!(ApiError::Decode("eof".to_string()).status(), None);
    }

    #[test]
    fn test_class_names() {
        assert_eq!(ErrorClass::Validation.as_str(), "validation");
        assert_eq!(ErrorClass::Authorization.as_str(), "authorization");
        assert_eq!(ErrorClass::Server.as_str(), "server");
        assert_eq!(ErrorClass::Request.as_str(), "request");
    }
}
