use thiserror::Error;

/// Failure of a single remote read.
///
/// The variant decides whether the Retrying Fetcher may try again: see
/// [`FetchError::is_retriable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Unauthorized - session may be expired")]
    Unauthorized,

    #[error("Request rejected {status}: {body}")]
    Client { status: u16, body: String },

    #[error("Service error: {0}")]
    Service(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request cancelled")]
    Cancelled,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Fragments that mark a service-reported error message as transient.
const TRANSIENT_MARKERS: &[&str] = &[
    "network",
    "timeout",
    "timed out",
    "unavailable",
    "connection",
    "temporarily",
    "try again",
    "failed to fetch",
];

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status {
            401 => FetchError::Unauthorized,
            429 => FetchError::RateLimited,
            500..=599 => FetchError::Server { status, body: truncated },
            _ => FetchError::Client { status, body: truncated },
        }
    }

    /// Classify an error string carried in a data service response body.
    pub fn from_service_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if TRANSIENT_MARKERS.iter().any(|m| lower.contains(m)) {
            FetchError::Network(message.to_string())
        } else {
            FetchError::Service(message.to_string())
        }
    }

    /// Network, timeout, 5xx and rate limiting are transient.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_)
                | FetchError::Timeout
                | FetchError::Server { .. }
                | FetchError::RateLimited
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::from_status(status.as_u16(), "")
        } else {
            FetchError::Network(err.to_string())
        }
    }
}
