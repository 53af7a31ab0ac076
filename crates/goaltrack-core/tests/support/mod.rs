//! In-process fake of the goaltrack backend.
//!
//! Implements just enough of the REST API for the client tests: login with
//! bearer tokens, the routine-accomplishment and points summaries, user
//! administration, goals, tasks and progress. Tokens can be revoked from the
//! test to simulate expiry.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

pub struct StoredUser {
    pub id: String,
    pub username: String,
    pub name: String,
    pub password: String,
    pub is_admin: bool,
}

impl StoredUser {
    /// `user-N` with username `user-N@example.com` and password `user-N-password`.
    fn seeded(n: u32, is_admin: bool) -> Self {
        Self {
            id: format!("user-{}", n),
            username: format!("user-{}@example.com", n),
            name: format!("User {}", n),
            password: format!("user-{}-password", n),
            is_admin,
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "name": self.name,
            "password": "stored-hash",
            "is_admin": if self.is_admin { 1 } else { 0 },
        })
    }
}

#[derive(Default)]
pub struct BackendState {
    pub users: Vec<StoredUser>,
    /// (timestamp, user_id)
    pub logs: Vec<(String, String)>,
    pub goals: Vec<Value>,
    pub tasks: Vec<Value>,
    /// (admin id, assigned user id)
    pub assignments: Vec<(String, String)>,
    /// Raw 200 body served by the login route instead of a real login
    pub login_override: Option<String>,
    /// token -> user id
    pub tokens: HashMap<String, String>,
    next_token: u32,
    /// (method, path) of every request received
    pub requests: Vec<(Method, String)>,
}

pub type Shared = Arc<Mutex<BackendState>>;

pub struct FakeBackend {
    pub base_url: String,
    pub state: Shared,
}

impl FakeBackend {
    /// One admin (`user-1`) and three regular users.
    pub async fn start() -> Self {
        let state = BackendState {
            users: vec![
                StoredUser::seeded(1, true),
                StoredUser::seeded(2, false),
                StoredUser::seeded(3, false),
                StoredUser::seeded(4, false),
            ],
            ..Default::default()
        };
        let state = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/frequency", get(frequency))
            .route("/api/points", get(points))
            .route("/api/log/update", post(update_log))
            .route("/api/users", get(users).post(register_user))
            .route("/api/users/assign", post(assign_user))
            .route("/api/users/unassign", post(unassign_user))
            .route("/api/users/{id}", patch(update_profile))
            .route("/api/users/{id}/goals/{date}", get(goals_by_date))
            .route("/api/users/{id}/progress", get(progress))
            .route("/api/goals", get(goals))
            .route("/api/goals/{id}", put(save_goal).delete(delete_goal))
            .route("/api/goals/{id}/tasks", get(tasks))
            .route("/api/goals/{goal_id}/tasks/{task_id}", put(save_task).delete(delete_task))
            .route("/api/slow", get(slow))
            .fallback(not_found)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn seed_logs(&self, entries: &[(&str, &str)]) {
        let mut state = self.state.lock().unwrap();
        for (timestamp, user_id) in entries {
            state.logs.push((timestamp.to_string(), user_id.to_string()));
        }
    }

    pub fn seed_goal(&self, goal: Value) {
        self.state.lock().unwrap().goals.push(goal);
    }

    pub fn seed_task(&self, task: Value) {
        self.state.lock().unwrap().tasks.push(task);
    }

    /// Answer every login with a 200 carrying `body` verbatim.
    pub fn override_login(&self, body: &str) {
        self.state.lock().unwrap().login_override = Some(body.to_string());
    }

    /// Invalidate every issued token, as if they had expired.
    pub fn revoke_all_tokens(&self) {
        self.state.lock().unwrap().tokens.clear();
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn logs_for(&self, user_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .logs
            .iter()
            .filter(|(_, id)| id == user_id)
            .map(|(ts, _)| ts.clone())
            .collect()
    }
}

/// Address nothing listens on, for transport failures.
pub async fn closed_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"msg": "This operation is not authorized. Please, log in."})),
    )
        .into_response()
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({"msg": "Administrator only."}))).into_response()
}

fn bad_request(field: &str) -> Response {
    let mut body = serde_json::Map::new();
    body.insert(field.to_string(), json!("REQUIRED"));
    (StatusCode::BAD_REQUEST, Json(Value::Object(body))).into_response()
}

fn is_admin(state: &BackendState, user_id: &str) -> bool {
    state.users.iter().any(|u| u.id == user_id && u.is_admin)
}

fn current_user(state: &Shared, headers: &HeaderMap, method: Method, path: &str) -> Option<String> {
    let mut state = state.lock().unwrap();
    state.requests.push((method, path.to_string()));
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    state.tokens.get(token).cloned()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push((Method::POST, "/api/auth/login".to_string()));
    if let Some(raw) = state.login_override.clone() {
        return (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], raw).into_response();
    }
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let Some(user) = state
        .users
        .iter()
        .find(|u| u.username == username && u.password == password)
    else {
        return (StatusCode::UNAUTHORIZED, Json(json!({"msg": "Bad username or password"})))
            .into_response();
    };

    let user_json = user.to_json();
    let user_id = user.id.clone();

    state.next_token += 1;
    let token = format!("token-{}", state.next_token);
    state.tokens.insert(token.clone(), user_id);

    Json(json!({"access_token": token, "user": user_json})).into_response()
}

async fn frequency(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let Some(user_id) = current_user(&state, &headers, Method::GET, "/api/frequency") else {
        return unauthorized();
    };
    let state = state.lock().unwrap();
    let days: BTreeSet<String> = state
        .logs
        .iter()
        .filter(|(_, id)| *id == user_id)
        .map(|(ts, _)| ts.chars().take(10).collect())
        .collect();
    Json(days.into_iter().collect::<Vec<_>>()).into_response()
}

async fn points(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let Some(user_id) = current_user(&state, &headers, Method::GET, "/api/points") else {
        return unauthorized();
    };
    let state = state.lock().unwrap();
    let done_goals: Vec<&str> = state
        .goals
        .iter()
        .filter(|g| g["user_id"] == user_id.as_str() && g["status"] == 1)
        .filter_map(|g| g["id"].as_str())
        .collect();
    let tasks = state
        .tasks
        .iter()
        .filter(|t| done_goals.contains(&t["goal_id"].as_str().unwrap_or_default()))
        .count();
    Json(tasks * 2).into_response()
}

async fn update_log(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let Some(user_id) = current_user(&state, &headers, Method::POST, "/api/log/update") else {
        return unauthorized();
    };
    let Some(timestamp) = body["timestamp"].as_str() else {
        return bad_request("timestamp");
    };
    state
        .lock()
        .unwrap()
        .logs
        .push((timestamp.to_string(), user_id));
    StatusCode::OK.into_response()
}

async fn goals(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let Some(user_id) = current_user(&state, &headers, Method::GET, "/api/goals") else {
        return unauthorized();
    };
    let state = state.lock().unwrap();
    let goals: Vec<Value> = state
        .goals
        .iter()
        .filter(|g| g["user_id"] == user_id.as_str())
        .cloned()
        .collect();
    Json(goals).into_response()
}

async fn save_goal(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("/api/goals/{}", id);
    if current_user(&state, &headers, Method::PUT, &path).is_none() {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.goals.retain(|g| g["id"] != id.as_str());
    state.goals.push(body);
    StatusCode::OK.into_response()
}

async fn delete_goal(State(state): State<Shared>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    let path = format!("/api/goals/{}", id);
    if current_user(&state, &headers, Method::DELETE, &path).is_none() {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    let before = state.goals.len();
    state.goals.retain(|g| g["id"] != id.as_str());
    if state.goals.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"msg": format!("Goal with id '{}' not found.", id)})),
        )
            .into_response();
    }
    StatusCode::OK.into_response()
}

async fn tasks(State(state): State<Shared>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    let path = format!("/api/goals/{}/tasks", id);
    if current_user(&state, &headers, Method::GET, &path).is_none() {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    let tasks: Vec<Value> = state
        .tasks
        .iter()
        .filter(|t| t["goal_id"] == id.as_str())
        .cloned()
        .collect();
    Json(tasks).into_response()
}

async fn save_task(
    State(state): State<Shared>,
    Path((goal_id, task_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("/api/goals/{}/tasks/{}", goal_id, task_id);
    if current_user(&state, &headers, Method::PUT, &path).is_none() {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.tasks.retain(|t| t["id"] != task_id.as_str());
    state.tasks.push(body);
    StatusCode::OK.into_response()
}

async fn users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let Some(admin_id) = current_user(&state, &headers, Method::GET, "/api/users") else {
        return unauthorized();
    };
    let state = state.lock().unwrap();
    if !is_admin(&state, &admin_id) {
        return forbidden();
    }
    let users: Vec<Value> = state
        .users
        .iter()
        .filter(|u| state.assignments.contains(&(admin_id.clone(), u.id.clone())))
        .map(StoredUser::to_json)
        .collect();
    Json(users).into_response()
}

async fn register_user(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let Some(admin_id) = current_user(&state, &headers, Method::POST, "/api/users") else {
        return unauthorized();
    };
    let mut state = state.lock().unwrap();
    if !is_admin(&state, &admin_id) {
        return forbidden();
    }
    let mut fields = Vec::new();
    for field in ["id", "username", "name", "password"] {
        match body[field].as_str() {
            Some(value) => fields.push(value.to_string()),
            None => return bad_request(field),
        }
    }
    if state.users.iter().any(|u| u.id == fields[0] || u.username == fields[1]) {
        return (StatusCode::CONFLICT, Json(json!({"msg": "User already exists."}))).into_response();
    }
    let [id, username, name, password]: [String; 4] = fields.try_into().unwrap();
    state.users.push(StoredUser {
        id,
        username,
        name,
        password,
        is_admin: false,
    });
    StatusCode::CREATED.into_response()
}

/// Users may edit themselves; admins may edit anyone.
async fn update_profile(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("/api/users/{}", id);
    let Some(caller) = current_user(&state, &headers, Method::PATCH, &path) else {
        return unauthorized();
    };
    let mut state = state.lock().unwrap();
    if caller != id && !is_admin(&state, &caller) {
        return forbidden();
    }
    let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
        return (StatusCode::NOT_FOUND, Json(json!({"msg": format!("User '{}' not found.", id)}))).into_response();
    };
    if let Some(username) = body["username"].as_str() {
        user.username = username.to_string();
    }
    if let Some(name) = body["name"].as_str() {
        user.name = name.to_string();
    }
    if let Some(password) = body["password"].as_str() {
        user.password = password.to_string();
    }
    StatusCode::OK.into_response()
}

async fn assign_user(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    change_assignment(state, headers, body, "/api/users/assign", true)
}

async fn unassign_user(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    change_assignment(state, headers, body, "/api/users/unassign", false)
}

fn change_assignment(state: Shared, headers: HeaderMap, body: Value, path: &str, assign: bool) -> Response {
    let Some(admin_id) = current_user(&state, &headers, Method::POST, path) else {
        return unauthorized();
    };
    let mut state = state.lock().unwrap();
    if !is_admin(&state, &admin_id) {
        return forbidden();
    }
    let Some(user_id) = body["user_id"].as_str() else {
        return bad_request("user_id");
    };
    if !state.users.iter().any(|u| u.id == user_id) {
        return (StatusCode::NOT_FOUND, Json(json!({"msg": format!("User '{}' not found.", user_id)}))).into_response();
    }
    let pair = (admin_id, user_id.to_string());
    state.assignments.retain(|a| *a != pair);
    if assign {
        state.assignments.push(pair);
    }
    StatusCode::OK.into_response()
}

async fn goals_by_date(
    State(state): State<Shared>,
    Path((id, date)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/api/users/{}/goals/{}", id, date);
    if current_user(&state, &headers, Method::GET, &path).is_none() {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    let goals: Vec<Value> = state
        .goals
        .iter()
        .filter(|g| g["user_id"] == id.as_str() && g["date"] == date.as_str())
        .cloned()
        .collect();
    Json(goals).into_response()
}

/// category -> [completed, total]
async fn progress(State(state): State<Shared>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    let path = format!("/api/users/{}/progress", id);
    if current_user(&state, &headers, Method::GET, &path).is_none() {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    let mut report: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for goal in state.goals.iter().filter(|g| g["user_id"] == id.as_str()) {
        let category = goal["category"].as_str().unwrap_or_default().to_string();
        let entry = report.entry(category).or_default();
        if goal["status"] == 1 {
            entry.0 += 1;
        }
        entry.1 += 1;
    }
    Json(report).into_response()
}

async fn delete_task(
    State(state): State<Shared>,
    Path((goal_id, task_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/api/goals/{}/tasks/{}", goal_id, task_id);
    if current_user(&state, &headers, Method::DELETE, &path).is_none() {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    let before = state.tasks.len();
    state
        .tasks
        .retain(|t| !(t["id"] == task_id.as_str() && t["goal_id"] == goal_id.as_str()));
    if state.tasks.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"msg": format!("Task with id '{}' not found.", task_id)})),
        )
            .into_response();
    }
    StatusCode::OK.into_response()
}

/// Waits, then checks the credential, so a token revoked meanwhile is refused.
async fn slow(State(state): State<Shared>, headers: HeaderMap) -> Response {
    tokio::time::sleep(Duration::from_millis(200)).await;
    match current_user(&state, &headers, Method::GET, "/api/slow") {
        Some(_) => Json(json!({"ok": true})).into_response(),
        None => unauthorized(),
    }
}

async fn not_found(method: Method, uri: axum::http::Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"msg": format!("No route for {} {}", method, uri.path())})),
    )
        .into_response()
}
