// SPDX-License-Identifier: MIT

//! Shared test harness: an in-process mock of the remote finance API.
//!
//! The mock records every request (path + bearer header) and exposes
//! scripted failure flags so tests can drive the error and reconciliation
//! paths deterministically.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use fintrack_client::config::Config;
use fintrack_client::AppCore;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Shared = Arc<Mutex<MockState>>;

/// Scripted server state. Tests mutate it directly through `MockApi::state`.
pub struct MockState {
    /// The one token the server considers issued.
    pub token: String,
    /// Whether that token is currently accepted.
    pub token_valid: bool,
    pub user: Value,
    pub login_fails: bool,
    pub register_fails: bool,
    pub fail_delete_account: bool,

    pub unread_count: u64,
    pub notifications: Vec<Value>,
    pub fail_unread: bool,
    pub fail_list: bool,
    pub fail_mark_all: bool,
    /// Server-side truth applied when a mark-all fails (simulates concurrent
    /// change while the client was optimistic).
    pub unread_after_failed_mark: Option<u64>,
    /// Delay applied to the next notification-list response, with the data
    /// snapshotted before the delay.
    pub slow_next_list: Option<Duration>,

    pub settings: Value,
    pub fail_settings_get: bool,
    pub fail_settings_put: bool,

    /// Every request seen: (path, bearer token if any).
    pub requests: Vec<(String, Option<String>)>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            token: "tok-abc".to_string(),
            token_valid: false,
            user: json!({
                "id": 1,
                "username": "xuan",
                "email": "xuan@example.test",
                "displayName": "Xuan",
                "avatarUrl": null,
                "isVerified": true,
                "phone": null,
            }),
            login_fails: false,
            register_fails: false,
            fail_delete_account: false,
            unread_count: 0,
            notifications: Vec::new(),
            fail_unread: false,
            fail_list: false,
            fail_mark_all: false,
            unread_after_failed_mark: None,
            slow_next_list: None,
            settings: json!({
                "currencyFormat": "dot_separator",
                "dateFormat": "dd/mm/yyyy",
                "usdToVndRate": 24000.0,
                "updatedAt": null,
            }),
            fail_settings_get: false,
            fail_settings_put: false,
            requests: Vec::new(),
        }
    }
}

impl MockState {
    /// Number of requests seen for a path.
    #[allow(dead_code)]
    pub fn hits(&self, path: &str) -> usize {
        self.requests.iter().filter(|(p, _)| p == path).count()
    }

    /// Bearer token of the most recent request to a path (None = anonymous).
    #[allow(dead_code)]
    pub fn last_bearer(&self, path: &str) -> Option<Option<String>> {
        self.requests
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, b)| b.clone())
    }

    fn accepts(&self, headers: &HeaderMap) -> bool {
        self.token_valid && bearer_of(headers).as_deref() == Some(self.token.as_str())
    }
}

/// Handle to a running mock API server.
pub struct MockApi {
    pub state: Shared,
    pub base_url: String,
}

/// Bind an ephemeral port and serve the mock API on it.
pub async fn spawn_mock_api() -> MockApi {
    let state: Shared = Arc::new(Mutex::new(MockState::default()));

    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/register", post(register))
        .route("/auth/activate", get(ok_anonymous))
        .route("/auth/forgot-password", post(ok_anonymous_post))
        .route("/auth/validate-reset-token", get(ok_anonymous))
        .route("/auth/reset-password", post(ok_anonymous_post))
        .route("/user/profile", get(get_profile).put(put_profile))
        .route("/user/avatar", post(post_avatar))
        .route("/user/change-password", post(change_password))
        .route("/user/account", delete(delete_account))
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/mark-as-read", post(mark_all_read))
        .route("/settings", get(get_settings).put(put_settings))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });

    MockApi {
        state,
        base_url: format!("http://{}", addr),
    }
}

/// Build an `AppCore` pointed at the mock, with a fast poll interval and a
/// scratch state directory. The `TempDir` must outlive the core.
#[allow(dead_code)]
pub fn test_core(base_url: &str) -> (AppCore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config {
        api_base_url: base_url.to_string(),
        state_dir: dir.path().to_path_buf(),
        poll_interval: Duration::from_millis(50),
    };
    let core = AppCore::new(config).expect("core should build");
    (core, dir)
}

fn bearer_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(String::from)
}

fn record(state: &mut MockState, path: &str, headers: &HeaderMap) {
    state.requests.push((path.to_string(), bearer_of(headers)));
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "session expired" })),
    )
}

async fn login(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/auth/login", &headers);

    if st.login_fails {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        );
    }

    st.token_valid = true;
    (
        StatusCode::OK,
        Json(json!({ "token": st.token, "user": st.user })),
    )
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/auth/logout", &headers);

    if !st.accepts(&headers) {
        return unauthorized();
    }
    st.token_valid = false;
    (StatusCode::OK, Json(json!({})))
}

async fn register(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/auth/register", &headers);

    if st.register_fails {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": { "email": ["email is taken"] } })),
        );
    }
    (StatusCode::OK, Json(json!({ "message": "registered" })))
}

async fn ok_anonymous(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/auth/anonymous", &headers);
    (StatusCode::OK, Json(json!({})))
}

async fn ok_anonymous_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/auth/anonymous", &headers);
    (StatusCode::OK, Json(json!({})))
}

async fn get_profile(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/user/profile", &headers);

    if !st.accepts(&headers) {
        return unauthorized();
    }
    (StatusCode::OK, Json(st.user.clone()))
}

async fn put_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/user/profile", &headers);

    if !st.accepts(&headers) {
        return unauthorized();
    }

    if let (Value::Object(user), Value::Object(changes)) = (&mut st.user, &body) {
        for (key, value) in changes {
            user.insert(key.clone(), value.clone());
        }
    }
    (StatusCode::OK, Json(st.user.clone()))
}

async fn post_avatar(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/user/avatar", &headers);

    if !st.accepts(&headers) {
        return unauthorized();
    }

    if let Value::Object(user) = &mut st.user {
        user.insert(
            "avatarUrl".to_string(),
            json!("https://cdn.example.test/avatar.png"),
        );
    }
    (StatusCode::OK, Json(st.user.clone()))
}

async fn change_password(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/user/change-password", &headers);

    if !st.accepts(&headers) {
        return unauthorized();
    }
    (StatusCode::OK, Json(json!({})))
}

async fn delete_account(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/user/account", &headers);

    if !st.accepts(&headers) {
        return unauthorized();
    }
    if st.fail_delete_account {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "boom" })),
        );
    }
    st.token_valid = false;
    (StatusCode::OK, Json(json!({})))
}

async fn list_notifications(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    // Snapshot inside the lock, sleep outside it, so a scripted slow
    // response carries the data as it was when the request arrived.
    let (response, delay) = {
        let mut st = state.lock().unwrap();
        record(&mut st, "/notifications", &headers);

        if !st.accepts(&headers) {
            return unauthorized();
        }
        if st.fail_list {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "boom" })),
            );
        }
        (Value::Array(st.notifications.clone()), st.slow_next_list.take())
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    (StatusCode::OK, Json(response))
}

async fn unread_count(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/notifications/unread-count", &headers);

    if !st.accepts(&headers) {
        return unauthorized();
    }
    if st.fail_unread {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "boom" })),
        );
    }
    (StatusCode::OK, Json(json!({ "count": st.unread_count })))
}

async fn mark_all_read(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/notifications/mark-as-read", &headers);

    if !st.accepts(&headers) {
        return unauthorized();
    }
    if st.fail_mark_all {
        // Apply the scripted concurrent change so count and entries agree.
        if let Some(count) = st.unread_after_failed_mark.take() {
            st.unread_count = count;
            let mut remaining = count;
            for entry in &mut st.notifications {
                if let Value::Object(entry) = entry {
                    let read = if remaining > 0 {
                        remaining -= 1;
                        false
                    } else {
                        true
                    };
                    entry.insert("read".to_string(), json!(read));
                }
            }
        }
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "boom" })),
        );
    }

    st.unread_count = 0;
    for entry in &mut st.notifications {
        if let Value::Object(entry) = entry {
            entry.insert("read".to_string(), json!(true));
        }
    }
    (StatusCode::OK, Json(json!({})))
}

async fn get_settings(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/settings", &headers);

    if !st.accepts(&headers) {
        return unauthorized();
    }
    if st.fail_settings_get {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "boom" })),
        );
    }
    (StatusCode::OK, Json(st.settings.clone()))
}

async fn put_settings(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    record(&mut st, "/settings", &headers);

    if !st.accepts(&headers) {
        return unauthorized();
    }
    if st.fail_settings_put {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "boom" })),
        );
    }

    // The server derives updatedAt itself; only known fields are merged.
    if let (Value::Object(settings), Value::Object(changes)) = (&mut st.settings, &body) {
        for (key, value) in changes {
            if matches!(key.as_str(), "currencyFormat" | "dateFormat" | "usdToVndRate") {
                settings.insert(key.clone(), value.clone());
            }
        }
        settings.insert("updatedAt".to_string(), json!("2024-01-01T00:00:00Z"));
    }
    (StatusCode::OK, Json(st.settings.clone()))
}
