//! In-process mock of the remote user API.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use userdesk::config::Config;
use userdesk::session::MemorySessionStore;
use userdesk::Console;

pub const VALID_PASSWORD: &str = "cityslicka";
pub const TOKEN: &str = "QpwL5tke4Pnpja7X4";
pub const TOTAL_USERS: u64 = 12;

#[derive(Default)]
pub struct MockApi {
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub requested_pages: Mutex<Vec<u32>>,
    pub seen_auth: Mutex<Vec<Option<String>>>,
    pub seen_api_keys: Mutex<Vec<Option<String>>>,
    pub reject_token: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_logout: AtomicBool,
    pub omit_token: AtomicBool,
}

impl MockApi {
    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn rejects(&self) -> bool {
        self.reject_token.load(Ordering::SeqCst)
    }

    fn record_headers(&self, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.seen_auth.lock().push(header("authorization"));
        self.seen_api_keys.lock().push(header("x-api-key"));
    }
}

fn user_json(id: u64) -> Value {
    json!({
        "id": id,
        "email": format!("user{}@reqres.in", id),
        "first_name": format!("First{}", id),
        "last_name": format!("Last{}", id),
        "avatar": format!("https://reqres.in/img/faces/{}-image.jpg", id),
    })
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid token"}))).into_response()
}

async fn login(State(api): State<Arc<MockApi>>, Json(body): Json<Value>) -> Response {
    api.login_calls.fetch_add(1, Ordering::SeqCst);

    if body["password"] != VALID_PASSWORD {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "user not found"}))).into_response();
    }
    if api.omit_token.load(Ordering::SeqCst) {
        // 200 with an empty body
        return StatusCode::OK.into_response();
    }
    (StatusCode::OK, Json(json!({"token": TOKEN}))).into_response()
}

async fn logout(State(api): State<Arc<MockApi>>) -> Response {
    api.logout_calls.fetch_add(1, Ordering::SeqCst);
    if api.rejects() {
        return unauthorized();
    }
    if api.fail_logout.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    (StatusCode::OK, Json(json!({}))).into_response()
}

async fn list_users(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    api.list_calls.fetch_add(1, Ordering::SeqCst);
    api.record_headers(&headers);

    if api.rejects() {
        return unauthorized();
    }

    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    api.requested_pages.lock().push(page);

    let start = (u64::from(page) - 1) * 6 + 1;
    let data: Vec<Value> = (start..start + 6)
        .filter(|id| *id <= TOTAL_USERS)
        .map(user_json)
        .collect();

    Json(json!({
        "page": page,
        "per_page": 6,
        "total": TOTAL_USERS,
        "total_pages": 2,
        "data": data,
    }))
    .into_response()
}

async fn create_user(State(api): State<Arc<MockApi>>, Json(mut body): Json<Value>) -> Response {
    api.create_calls.fetch_add(1, Ordering::SeqCst);
    if api.rejects() {
        return unauthorized();
    }
    if api.fail_writes.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    body["id"] = json!("731");
    body["createdAt"] = json!("2024-01-01T00:00:00.000Z");
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_user(
    State(api): State<Arc<MockApi>>,
    Path(_id): Path<u64>,
    Json(mut body): Json<Value>,
) -> Response {
    api.update_calls.fetch_add(1, Ordering::SeqCst);
    if api.rejects() {
        return unauthorized();
    }
    if api.fail_writes.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    body["updatedAt"] = json!("2024-01-01T00:00:00.000Z");
    Json(body).into_response()
}

async fn delete_user(State(api): State<Arc<MockApi>>, Path(_id): Path<u64>) -> Response {
    api.delete_calls.fetch_add(1, Ordering::SeqCst);
    if api.rejects() {
        return unauthorized();
    }
    if api.fail_writes.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Start the mock on an ephemeral port and return its API base URL.
pub async fn spawn(api: Arc<MockApi>) -> String {
    let app = Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/users", axum::routing::get(list_users).post(create_user))
        .route("/api/users/:id", put(update_user))
        .route("/api/delete/:id", delete(delete_user))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api/", addr)
}

pub struct Harness {
    pub api: Arc<MockApi>,
    pub session: Arc<MemorySessionStore>,
    pub console: Console,
}

pub async fn harness() -> Harness {
    harness_with(|_| {}).await
}

pub async fn harness_with(tweak: impl FnOnce(&mut Config)) -> Harness {
    let api = Arc::new(MockApi::default());
    let base_url = spawn(Arc::clone(&api)).await;

    let mut config = Config::default();
    config.api.base_url = base_url;
    config.api.timeout_secs = 5;
    tweak(&mut config);

    let session = Arc::new(MemorySessionStore::new());
    let console = Console::new(config, session.clone()).unwrap();

    Harness {
        api,
        session,
        console,
    }
}

/// A harness that is already logged in.
pub async fn logged_in() -> Harness {
    let h = harness().await;
    h.console
        .auth()
        .login(&userdesk::models::Credentials::new("eve.holt@reqres.in", VALID_PASSWORD))
        .await
        .unwrap();
    h
}
