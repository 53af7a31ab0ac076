//! REST API client module for the goaltrack service.
//!
//! This module provides:
//! - `RequestClient`: verb-level client that attaches the session credential,
//!   records the last status and clears the session on a 401
//! - `GoalTrackApi`: one typed method per backend endpoint
//! - `ApiResponse` / `LastStatus`: status-carrying results
//!
//! Expected failures (wrong password, expired credential, missing resource)
//! are reported through the response status, not as errors.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod response;

pub use client::{LoginOutcome, RequestClient, DEFAULT_TIMEOUT_SECS};
pub use endpoints::GoalTrackApi;
pub use error::ApiError;
pub use response::{ApiResponse, LastStatus};
