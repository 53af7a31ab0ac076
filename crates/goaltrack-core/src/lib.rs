//! Client library for the goaltrack goal/task-tracking service.
//!
//! The center of the crate is the authenticated request layer:
//!
//! - [`auth::SessionState`] holds who is logged in and publishes changes
//! - [`api::RequestClient`] performs calls, attaches the credential, records
//!   the last status and clears the session when the server answers 401
//! - [`api::GoalTrackApi`] exposes one typed method per backend endpoint
//! - [`guard::RouteGuard`] turns session changes into navigation decisions

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;

pub use api::{ApiError, ApiResponse, GoalTrackApi, LastStatus, LoginOutcome, RequestClient};
pub use auth::{Authenticated, SessionState};
pub use config::Config;
pub use guard::{Navigation, Route, RouteGuard};
