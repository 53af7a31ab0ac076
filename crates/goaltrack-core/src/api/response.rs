use std::fmt;

use reqwest::StatusCode;

use super::ApiError;

/// Status of the most recently completed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastStatus {
    /// No call has completed yet.
    #[default]
    Unset,
    /// A response was received with this status.
    Code(StatusCode),
    /// The last call never got a response.
    TransportFailure,
}

impl LastStatus {
    pub fn code(self) -> Option<StatusCode> {
        match self {
            LastStatus::Code(status) => Some(status),
            _ => None,
        }
    }
}

impl PartialEq<u16> for LastStatus {
    fn eq(&self, other: &u16) -> bool {
        self.code().map(|s| s.as_u16() == *other).unwrap_or(false)
    }
}

impl fmt::Display for LastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastStatus::Unset => f.write_str("-"),
            LastStatus::Code(status) => write!(f, "{}", status.as_u16()),
            LastStatus::TransportFailure => f.write_str("transport failure"),
        }
    }
}

/// Outcome of a call that received a response.
///
/// `body` is only ever populated for 2xx statuses, and is `None` when the
/// server answered with an empty body. For other statuses `message` carries
/// the server's explanation when it sent one.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub body: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub(crate) fn success(status: StatusCode, body: Option<T>) -> Self {
        Self {
            status,
            body,
            message: None,
        }
    }

    pub(crate) fn failure(status: StatusCode, message: Option<String>) -> Self {
        Self {
            status,
            body: None,
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Escalate a non-2xx status into an error, keeping an empty 2xx body as `None`.
    pub fn require(self) -> Result<Option<T>, ApiError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(ApiError::from_status(self.status, self.message))
        }
    }

    /// Like [`require`](Self::require) but an empty 2xx body is an error too.
    pub fn require_body(self) -> Result<T, ApiError> {
        let status = self.status;
        self.require()?.ok_or_else(|| {
            ApiError::InvalidResponse(format!("Status {} with an empty body", status))
        })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            body: self.body.map(f),
            message: self.message,
        }
    }
}
