//! Route table and authentication guard.
//!
//! Views are addressed by path. A guard resolves a path against the current
//! session and either allows it or redirects to another route.

use tokio::sync::watch;

use crate::auth::{Authenticated, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Login,
    /// `/home`
    TaskList,
    /// `/goal/{id}`
    TaskDetails { goal_id: String },
}

impl Route {
    pub fn parse(path: &str) -> Option<Route> {
        // Ignore query string and fragment
        let path = path.split(['?', '#']).next().unwrap_or_default();
        if path.is_empty() {
            return Some(Route::Login);
        }
        let segments: Vec<&str> = path.strip_prefix('/')?.split('/').collect();

        // A single trailing slash is tolerated
        match segments.as_slice() {
            [""] => Some(Route::Login),
            ["home"] | ["home", ""] => Some(Route::TaskList),
            ["goal", id] | ["goal", id, ""] if !id.is_empty() => Some(Route::TaskDetails {
                goal_id: (*id).to_string(),
            }),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/".to_string(),
            Route::TaskList => "/home".to_string(),
            Route::TaskDetails { goal_id } => format!("/goal/{}", goal_id),
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow(Route),
    Redirect(Route),
    NotFound,
}

/// Watches a session and decides where navigation may go.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: watch::Receiver<Option<Authenticated>>,
}

impl RouteGuard {
    pub fn new(session: &SessionState) -> Self {
        Self {
            session: session.subscribe(),
        }
    }

    fn is_logged(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Protected routes redirect to login when logged out; the login page
    /// redirects to the task list when already logged in.
    pub fn resolve(&self, path: &str) -> Navigation {
        let Some(route) = Route::parse(path) else {
            return Navigation::NotFound;
        };
        match (route.requires_auth(), self.is_logged()) {
            (true, false) => Navigation::Redirect(Route::Login),
            (false, true) => Navigation::Redirect(Route::TaskList),
            _ => Navigation::Allow(route),
        }
    }

    /// Resolves once the session is empty, immediately if it already is.
    /// A view awaits this to leave when a 401 ends the session under it.
    pub async fn logged_out(&mut self) {
        // An error means every sender is gone, which can only happen once
        // the session itself is dropped: treat that as logged out too.
        let _ = self.session.wait_for(Option::is_none).await;
    }
}
