//! Error taxonomy for backend calls and the user-facing error shape.

use std::fmt::{self, Display, Formatter};

use ctrlpanel_api_models::ErrorBody;
use reqwest::StatusCode;
use thiserror::Error;

/// Code reported when the backend did not send a structured error body.
pub const UNKNOWN_ERROR_CODE: &str = "Unknown Error";

/// User-visible error: the backend's `{code, message}` or a generic fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorInfo {
    /// Build an error from explicit parts.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Generic error carrying [`UNKNOWN_ERROR_CODE`].
    #[must_use]
    pub fn fallback(message: impl Into<String>) -> Self {
        Self::new(UNKNOWN_ERROR_CODE, message)
    }
}

impl From<ErrorBody> for ErrorInfo {
    fn from(body: ErrorBody) -> Self {
        Self {
            code: body.code,
            message: body.message,
        }
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "[{}] {}", self.code, self.message)
    }
}

/// Coarse failure class used by callers that only need to branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received.
    Transport,
    /// The backend rejected the request (4xx other than 404).
    Validation,
    /// The addressed entity does not exist.
    NotFound,
    /// The backend failed (5xx) or answered with something unreadable.
    Server,
}

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request URL could not be built from the base URL.
    #[error("invalid request URL")]
    InvalidUrl(#[from] url::ParseError),
    /// A header value contained characters HTTP does not allow.
    #[error("invalid header value for {name}")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client {
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The request never produced a response.
    #[error("request to {path} failed")]
    Transport {
        /// Request path relative to the API base.
        path: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The backend rejected the request.
    #[error("request rejected with status {status}")]
    Validation {
        /// HTTP status code.
        status: u16,
        /// Structured body, when the backend sent one.
        body: Option<ErrorBody>,
    },
    /// Credentials were missing or refused.
    #[error("request not authorised (status {status})")]
    Unauthorized {
        /// HTTP status code (401 or 403).
        status: u16,
        /// Structured body, when the backend sent one.
        body: Option<ErrorBody>,
    },
    /// The addressed entity does not exist.
    #[error("resource not found")]
    NotFound {
        /// Structured body, when the backend sent one.
        body: Option<ErrorBody>,
    },
    /// The backend failed to process the request.
    #[error("server failure with status {status}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Structured body, when the backend sent one.
        body: Option<ErrorBody>,
    },
    /// A successful response carried a body that could not be decoded.
    #[error("failed to decode response from {path}")]
    Decode {
        /// Request path relative to the API base.
        path: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Classify a non-success status plus its raw body.
    #[must_use]
    pub fn from_status(status: StatusCode, bytes: &[u8]) -> Self {
        let body = serde_json::from_slice::<ErrorBody>(bytes).ok();
        let code = status.as_u16();
        match status {
            StatusCode::NOT_FOUND => Self::NotFound { body },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Self::Unauthorized { status: code, body }
            }
            _ if status.is_client_error() => Self::Validation { status: code, body },
            _ => Self::Server { status: code, body },
        }
    }

    /// Structured backend body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Validation { body, .. }
            | Self::Unauthorized { body, .. }
            | Self::NotFound { body }
            | Self::Server { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } | Self::Client { .. } => ErrorKind::Transport,
            Self::Validation { .. } | Self::Unauthorized { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Server { .. }
            | Self::Decode { .. }
            | Self::InvalidUrl(_)
            | Self::InvalidHeader { .. } => ErrorKind::Server,
        }
    }

    /// Map to a user-visible error, preferring the backend's own body.
    #[must_use]
    pub fn info(&self, fallback: &str) -> ErrorInfo {
        self.body()
            .cloned()
            .map_or_else(|| ErrorInfo::fallback(fallback), ErrorInfo::from)
    }
}
