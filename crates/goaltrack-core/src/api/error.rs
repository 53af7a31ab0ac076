use reqwest::StatusCode;
use thiserror::Error;

/// Errors that abort a call.
///
/// Expected server answers (wrong password, missing resource, expired
/// credential) are *not* errors: they come back as an [`ApiResponse`] with a
/// non-2xx status. Use [`ApiResponse::require`] to escalate one into
/// [`ApiError::Status`] when a caller wants `?` semantics.
///
/// [`ApiResponse`]: super::ApiResponse
/// [`ApiResponse::require`]: super::ApiResponse::require
#[derive(Error, Debug)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, timeout, reset).
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The call could not be constructed (bad path segment, bad base URL,
    /// unserializable body, credential not representable as a header).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A 2xx response whose body does not match the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{}", status_message(.status, .message))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

fn status_message(status: &StatusCode, message: &Option<String>) -> String {
    let summary = match status.as_u16() {
        401 => "Unauthorized - please log in".to_string(),
        403 => "Access denied".to_string(),
        404 => "Resource not found".to_string(),
        400 => "Bad request".to_string(),
        500..=599 => "Server error".to_string(),
        _ => format!("Unexpected status {}", status),
    };
    match message.as_deref() {
        Some(msg) if !msg.is_empty() => format!("{} ({}): {}", summary, status.as_u16(), msg),
        _ => format!("{} ({})", summary, status.as_u16()),
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        ApiError::Status { status, message }
    }

    /// Classify a reqwest failure. Builder errors mean the request was
    /// malformed on our side; everything else means no response arrived.
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::InvalidRequest(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}
