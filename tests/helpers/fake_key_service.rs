use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use keydash::domain::entities::ListKind;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Canned response for one path, bypassing the fake's own logic
#[derive(Clone)]
pub struct Scripted {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub delay: Duration,
}

impl Scripted {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
pub struct FakeState {
    /// (key, status, failure count) in server order
    keys: Mutex<Vec<(String, ListKind, u64)>>,
    requests: Mutex<Vec<String>>,
    overrides: Mutex<HashMap<String, Scripted>>,
    required_token: Mutex<Option<String>>,
}

/// In-process stand-in for the Remote Key Service
pub struct FakeKeyService {
    pub base_url: String,
    state: Arc<FakeState>,
    server: JoinHandle<()>,
}

impl Drop for FakeKeyService {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl FakeKeyService {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/api/keys", get(list_keys))
            .route("/api/stats/details", get(stats_details))
            .route("/api/stats/attention-keys", get(attention_keys))
            .route("/gemini/v1beta/verify-key/:key", post(verify_key))
            .route("/api/config/keys/delete-selected", post(delete_selected))
            .route("/api/config/keys/:key", delete(delete_key))
            .layer(middleware::from_fn_with_state(state.clone(), intercept))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            server,
        }
    }

    pub fn seed(&self, kind: ListKind, keys: &[(&str, u64)]) {
        let mut stored = self.state.keys.lock().unwrap();
        stored.extend(keys.iter().map(|(key, count)| (key.to_string(), kind, *count)));
    }

    pub fn seed_many(&self, kind: ListKind, prefix: &str, count: usize) {
        let mut stored = self.state.keys.lock().unwrap();
        stored.extend((1..=count).map(|i| (format!("{}{:02}", prefix, i), kind, 0)));
    }

    pub fn keys(&self, kind: ListKind) -> Vec<String> {
        self.state
            .keys
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(key, _, _)| key.clone())
            .collect()
    }

    pub fn script(&self, path: &str, response: Scripted) {
        self.state
            .overrides
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    pub fn require_token(&self, token: &str) {
        *self.state.required_token.lock().unwrap() = Some(token.to_string());
    }

    /// `"METHOD /path?query"` of every request received
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.starts_with(prefix))
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.requests.lock().unwrap().clear();
    }
}

async fn intercept(State(state): State<Arc<FakeState>>, request: Request, next: Next) -> Response {
    state
        .requests
        .lock()
        .unwrap()
        .push(format!("{} {}", request.method(), request.uri()));

    let required = state.required_token.lock().unwrap().clone();
    if let Some(token) = required {
        let expected = format!("auth_token={}", token);
        let cookie = request
            .headers()
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !cookie.split(';').any(|c| c.trim() == expected) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Not authenticated" }))).into_response();
        }
    }

    let scripted = state.overrides.lock().unwrap().get(request.uri().path()).cloned();
    if let Some(scripted) = scripted {
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, scripted.content_type.parse().unwrap());
        let status = StatusCode::from_u16(scripted.status).unwrap();
        return (status, headers, scripted.body).into_response();
    }

    next.run(request).await
}

#[derive(Deserialize)]
struct ListQuery {
    status: String,
    page: u32,
    limit: u32,
    #[serde(default)]
    search: String,
}

async fn list_keys(State(state): State<Arc<FakeState>>, Query(query): Query<ListQuery>) -> Response {
    let kind: ListKind = match query.status.parse() {
        Ok(kind) => kind,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(json!({ "detail": e }))).into_response(),
    };
    let matching: Vec<(String, u64)> = state
        .keys
        .lock()
        .unwrap()
        .iter()
        .filter(|(key, k, _)| *k == kind && key.contains(&query.search))
        .map(|(key, _, count)| (key.clone(), *count))
        .collect();

    let limit = query.limit.max(1) as usize;
    let total_pages = (matching.len() + limit - 1) / limit;
    let start = (query.page.max(1) as usize - 1) * limit;

    // Written by hand so the object keeps server order
    let entries: Vec<String> = matching
        .iter()
        .skip(start)
        .take(limit)
        .map(|(key, count)| format!("{}:{}", serde_json::to_string(key).unwrap(), count))
        .collect();
    let body = format!("{{\"keys\":{{{}}},\"total_pages\":{}}}", entries.join(","), total_pages);

    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn stats_details(Query(query): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    let period = query.get("period").cloned().unwrap_or_default();
    let timeline = match period.as_str() {
        "1h" => json!([
            { "time": "10:00", "success": 4, "failure": 1 },
            { "time": "10:05", "success": 2, "failure": 0 }
        ]),
        "8h" => json!([]),
        _ => json!([{ "time": "00:00", "success": 40, "failure": 3 }]),
    };
    Json(json!({
        "calls_1m": { "total": 1, "success": 1, "failure": 0 },
        "calls_1h": { "total": 12 },
        "calls_24h": { "total": 240 },
        "calls_month": { "total": 5000 },
        "timeline": timeline
    }))
}

async fn attention_keys(Query(query): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    let code: u16 = query.get("status_code").and_then(|c| c.parse().ok()).unwrap_or(429);
    Json(json!([
        { "key": format!("hot-{}", code), "status": "valid", "error_code": code, "count": 7 }
    ]))
}

async fn verify_key(State(state): State<Arc<FakeState>>, Path(key): Path<String>) -> Response {
    let known = state.keys.lock().unwrap().iter().any(|(k, _, _)| *k == key);
    if known {
        (StatusCode::OK, Json(json!({ "success": true, "status": "valid" }))).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "detail": "Key not found" }))).into_response()
    }
}

async fn delete_key(State(state): State<Arc<FakeState>>, Path(key): Path<String>) -> Response {
    let mut keys = state.keys.lock().unwrap();
    let before = keys.len();
    keys.retain(|(k, _, _)| *k != key);
    if keys.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": format!("Key {} not found", key) }))).into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Deserialize)]
struct DeleteSelected {
    keys: Vec<String>,
}

async fn delete_selected(State(state): State<Arc<FakeState>>, Json(body): Json<DeleteSelected>) -> Response {
    let mut keys = state.keys.lock().unwrap();
    let before = keys.len();
    keys.retain(|(k, _, _)| !body.keys.contains(k));
    let deleted = before - keys.len();
    Json(json!({ "success": true, "deleted_count": deleted })).into_response()
}
