//! Authentication module for managing the logged-in session.
//!
//! This module provides:
//! - `SessionState`: the in-process source of truth for who is logged in
//! - `SessionStore`: optional persistence of a session between runs
//! - `CredentialStore`: secure OS-level password storage via keyring
//!
//! The core client only needs `SessionState`; the stores are used by
//! front ends that want to survive a restart.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::CredentialStore;
pub use session::{Authenticated, SessionState};
pub use store::SessionStore;
