//! Typed endpoint methods for the goaltrack backend.
//!
//! Each method forwards to one `RequestClient` verb; all status and session
//! handling lives there.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::auth::SessionState;
use crate::models::{
    Assignment, Goal, LogEntry, ProfileUpdate, Progress, Registration, Task, User,
};

use super::{ApiError, ApiResponse, LastStatus, LoginOutcome, RequestClient};

/// Endpoint-level API for the goaltrack service.
/// Clone is cheap and clones share the session.
#[derive(Clone)]
pub struct GoalTrackApi {
    client: RequestClient,
}

impl GoalTrackApi {
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }

    /// Build a client with a fresh, logged-out session
    pub fn connect(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self::new(RequestClient::new(base_url, SessionState::new())?))
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    pub fn session(&self) -> &SessionState {
        self.client.session()
    }

    pub fn last_status(&self) -> LastStatus {
        self.client.last_status()
    }

    // ===== Session =====

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        self.client.login(username, password).await
    }

    pub fn logout(&self) {
        self.client.logout();
    }

    pub fn is_user_logged(&self) -> bool {
        self.session().is_user_logged()
    }

    pub fn user(&self) -> Option<User> {
        self.session().user()
    }

    /// Validate an identifier before interpolating it into a path.
    /// Rejects anything that would change the shape of the URL.
    fn segment(id: &str) -> Result<&str, ApiError> {
        let valid = !id.is_empty()
            && id != "."
            && id != ".."
            && id
                .chars()
                .all(|c| !c.is_whitespace() && !c.is_control() && !"/?#%\\".contains(c));
        if valid {
            Ok(id)
        } else {
            Err(ApiError::InvalidRequest(format!("Invalid identifier '{}'", id.escape_debug())))
        }
    }

    // ===== Current user =====

    /// Distinct days (ascending) on which the current user logged activity
    pub async fn get_routine_accomplishment(&self) -> Result<ApiResponse<Vec<NaiveDate>>, ApiError> {
        self.client.get("/api/frequency").await
    }

    /// Record activity for the current user at the current time
    pub async fn update_log(&self) -> Result<ApiResponse<Value>, ApiError> {
        self.update_log_at(Utc::now()).await
    }

    pub async fn update_log_at(&self, time: DateTime<Utc>) -> Result<ApiResponse<Value>, ApiError> {
        self.client.post("/api/log/update", &LogEntry::at(time)).await
    }

    pub async fn get_points(&self) -> Result<ApiResponse<i64>, ApiError> {
        self.client.get("/api/points").await
    }

    /// Today's goals for the current user
    pub async fn get_goals(&self) -> Result<ApiResponse<Vec<Goal>>, ApiError> {
        self.client.get("/api/goals").await
    }

    // ===== Users (admin) =====

    /// Users assigned to the current admin
    pub async fn get_users(&self) -> Result<ApiResponse<Vec<User>>, ApiError> {
        self.client.get("/api/users").await
    }

    pub async fn register_user(&self, data: &Registration) -> Result<ApiResponse<Value>, ApiError> {
        Self::segment(&data.id)?;
        self.client.post("/api/users", data).await
    }

    pub async fn save_user_profile(
        &self,
        user_id: &str,
        data: &ProfileUpdate,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let url = format!("/api/users/{}", Self::segment(user_id)?);
        self.client.patch(&url, data).await
    }

    pub async fn assign_user(&self, user_id: &str) -> Result<ApiResponse<Value>, ApiError> {
        let body = Assignment {
            user_id: Self::segment(user_id)?.to_string(),
        };
        self.client.post("/api/users/assign", &body).await
    }

    pub async fn unassign_user(&self, user_id: &str) -> Result<ApiResponse<Value>, ApiError> {
        let body = Assignment {
            user_id: Self::segment(user_id)?.to_string(),
        };
        self.client.post("/api/users/unassign", &body).await
    }

    pub async fn get_goals_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<ApiResponse<Vec<Goal>>, ApiError> {
        let url = format!(
            "/api/users/{}/goals/{}",
            Self::segment(user_id)?,
            date.format("%Y-%m-%d")
        );
        self.client.get(&url).await
    }

    /// Completion per goal category for an assigned user
    pub async fn get_user_progress(&self, user_id: &str) -> Result<ApiResponse<Progress>, ApiError> {
        let url = format!("/api/users/{}/progress", Self::segment(user_id)?);
        self.client.get(&url).await
    }

    // ===== Goals and tasks =====

    /// Create or replace a goal
    pub async fn save_goal(&self, goal: &Goal) -> Result<ApiResponse<Value>, ApiError> {
        let url = format!("/api/goals/{}", Self::segment(&goal.id)?);
        self.client.put(&url, goal).await
    }

    pub async fn delete_goal(&self, goal_id: &str) -> Result<ApiResponse<Value>, ApiError> {
        let url = format!("/api/goals/{}", Self::segment(goal_id)?);
        self.client.delete(&url).await
    }

    pub async fn get_tasks_by_goal_id(&self, goal_id: &str) -> Result<ApiResponse<Vec<Task>>, ApiError> {
        let url = format!("/api/goals/{}/tasks", Self::segment(goal_id)?);
        self.client.get(&url).await
    }

    /// Create or replace a task under its goal.
    ///
    /// Sent as PUT: saving carries a body and mutates, so it is a write.
    pub async fn save_task(&self, task: &Task) -> Result<ApiResponse<Value>, ApiError> {
        let url = format!(
            "/api/goals/{}/tasks/{}",
            Self::segment(&task.goal_id)?,
            Self::segment(&task.id)?
        );
        self.client.put(&url, task).await
    }

    pub async fn delete_task(&self, goal_id: &str, task_id: &str) -> Result<ApiResponse<Value>, ApiError> {
        let url = format!(
            "/api/goals/{}/tasks/{}",
            Self::segment(goal_id)?,
            Self::segment(task_id)?
        );
        self.client.delete(&url).await
    }
}
