//! HTTP client for the goaltrack REST API.
//!
//! Every verb funnels through [`RequestClient::execute`], which attaches the
//! session credential, records the status of the call and, on a 401 for an
//! attached credential, clears the session. Call sites never handle 401
//! themselves.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::{Authenticated, SessionState};
use crate::models::User;

use super::{ApiError, ApiResponse, LastStatus};

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Authentication endpoint, relative to the base URL
const LOGIN_PATH: &str = "/api/auth/login";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    user: User,
}

/// Result of a login attempt that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    LoggedIn(User),
    /// The server refused the credentials (usually 401).
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },
}

impl LoginOutcome {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, LoginOutcome::LoggedIn(_))
    }
}

/// Authenticated request client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling,
/// and clones share the session and last status.
#[derive(Clone)]
pub struct RequestClient {
    client: Client,
    base_url: Url,
    session: SessionState,
    last_status: Arc<watch::Sender<LastStatus>>,
}

impl RequestClient {
    /// Create a client for `base_url` with the default timeout
    pub fn new(base_url: &str, session: SessionState) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS), session)
    }

    pub fn with_timeout(
        base_url: &str,
        timeout: Duration,
        session: SessionState,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: Self::normalize_base(base_url)?,
            session,
            last_status: Arc::new(watch::channel(LastStatus::Unset).0),
        })
    }

    /// Paths are joined relative to the base, so the base must end in `/`
    /// for a prefix like `https://host/goaltrack` to survive the join.
    fn normalize_base(base_url: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "Invalid base URL '{}': cannot be a base",
                base_url
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Status of the most recently completed call, by completion order
    pub fn last_status(&self) -> LastStatus {
        *self.last_status.borrow()
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid path '{}': {}", path, e)))
    }

    fn auth_headers(token: &str) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidRequest("Credential is not a valid header value".into()))?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
        Ok(headers)
    }

    fn record(&self, status: LastStatus) {
        self.last_status.send_replace(status);
    }

    // ===== Verbs =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.execute::<T, ()>(Method::GET, path, None, self.session.credential())
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.execute(Method::POST, path, Some(body), self.session.credential())
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.execute(Method::PUT, path, Some(body), self.session.credential())
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.execute(Method::PATCH, path, Some(body), self.session.credential())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.execute::<T, ()>(Method::DELETE, path, None, self.session.credential())
            .await
    }

    /// The single choke point for every call.
    async fn execute<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        credential: Option<String>,
    ) -> Result<ApiResponse<T>, ApiError> {
        let url = self.url(path)?;

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(header::ACCEPT, "application/json");
        if let Some(ref token) = credential {
            request = request.headers(Self::auth_headers(token)?);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = ApiError::from_send(e);
                if err.is_transport() {
                    self.record(LastStatus::TransportFailure);
                    warn!(%method, path, error = %err, "Request failed without a response");
                }
                return Err(err);
            }
        };

        let status = response.status();
        self.record(LastStatus::Code(status));
        debug!(%method, path, status = status.as_u16(), authenticated = credential.is_some(), "Request completed");

        if status == StatusCode::UNAUTHORIZED {
            if let Some(ref token) = credential {
                if self.session.invalidate(token) {
                    warn!(%method, path, "Credential rejected, session cleared");
                }
            }
        }

        // Reading the body can still fail mid-stream
        let bytes = response.bytes().await.map_err(ApiError::Transport)?;

        if !status.is_success() {
            return Ok(ApiResponse::failure(status, Self::error_message(&bytes)));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ApiResponse::success(status, None));
        }

        let parsed = serde_json::from_slice(&bytes).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "{} {}: {} (body: {})",
                method,
                path,
                e,
                ApiError::truncate_body(&String::from_utf8_lossy(&bytes))
            ))
        })?;
        Ok(ApiResponse::success(status, Some(parsed)))
    }

    /// Pull a human-readable reason out of an error body.
    /// The backend sends `{"msg": "..."}`; anything else is passed through as text.
    fn error_message(bytes: &[u8]) -> Option<String> {
        #[derive(Deserialize)]
        struct ErrorBody {
            msg: String,
        }

        if let Ok(body) = serde_json::from_slice::<ErrorBody>(bytes) {
            return Some(body.msg);
        }
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(ApiError::truncate_body(text))
        }
    }

    // ===== Session lifecycle =====

    /// Authenticate and, on success, install the credential and user in the
    /// session.
    ///
    /// A refusal is reported as [`LoginOutcome::Rejected`] and leaves the
    /// session logged out, including when a previous session was active.
    /// A 2xx answer that carries no usable credential is an `Err` and also
    /// leaves the session logged out. Only a call that never got a response
    /// keeps the previous session.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        match self.authenticate(username, password).await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_transport() => Err(e),
            Err(e) => {
                self.session.logout();
                warn!(username, error = %e, "Unusable login response, session cleared");
                Err(e)
            }
        }
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        let body = LoginRequest { username, password };

        // Never attach a previous credential to a login attempt
        let response: ApiResponse<LoginResponse> =
            self.execute(Method::POST, LOGIN_PATH, Some(&body), None).await?;

        if !response.is_success() {
            self.session.logout();
            info!(username, status = response.status.as_u16(), "Login rejected");
            return Ok(LoginOutcome::Rejected {
                status: response.status,
                message: response.message,
            });
        }

        let auth = response.require_body()?;
        if auth.access_token.is_empty() {
            return Err(ApiError::InvalidResponse(
                "Login response carried an empty access token".into(),
            ));
        }

        info!(username, admin = auth.user.is_admin, "Login successful");
        let user = auth.user.clone();
        self.session
            .establish(Authenticated::new(auth.access_token, auth.user));
        Ok(LoginOutcome::LoggedIn(user))
    }

    pub fn logout(&self) {
        self.session.logout();
    }
}
