#![allow(dead_code)]

use axum::{
    Json, Router,
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use cinkbert::config::Config;
use cinkbert::db::DbActorHandle;
use cinkbert::server::router::{CinkbertState, cinkbert_router};
use serde_json::{Value, json};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

pub const GOOD_TOKEN: &str = "good-token";
pub const OTHER_TOKEN: &str = "other-token";
pub const USER_ID: &str = "user-1";
pub const OTHER_USER_ID: &str = "user-2";
pub const PASSWORD: &str = "secret";
pub const SIGNED_URL_TTL_SECS: u64 = 900;

#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Captured {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("captured body was not JSON")
    }
}

/// How the fake fal queue answers once a job is submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobMode {
    /// Queued once, then completed with a good result.
    #[default]
    Succeed,
    /// Stays `IN_PROGRESS` forever.
    NeverComplete,
    /// `COMPLETED` with an `error` field set.
    CompleteWithError,
    /// Completes, but the result fetch answers 500.
    ResultFails,
}

/// One in-process stand-in for fal, OpenAI and Supabase.
#[derive(Clone)]
pub struct MockUpstream {
    pub base: Url,
    reqs: Arc<Mutex<Vec<Captured>>>,
    revoked: Arc<Mutex<HashSet<String>>>,
    status_polls: Arc<Mutex<HashMap<String, u32>>>,
    jobs: Arc<Mutex<HashMap<String, String>>>,
    job_mode: Arc<Mutex<JobMode>>,
}

impl MockUpstream {
    pub fn set_job_mode(&self, mode: JobMode) {
        *self.job_mode.lock().unwrap() = mode;
    }

    fn job_mode(&self) -> JobMode {
        *self.job_mode.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.reqs.lock().unwrap().clone()
    }

    /// Everything except session verification.
    pub fn non_auth_requests(&self) -> Vec<Captured> {
        self.requests()
            .into_iter()
            .filter(|r| !r.path.starts_with("/auth/"))
            .collect()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Captured> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn requests_under(&self, method: Method, prefix: &str) -> Vec<Captured> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path.starts_with(prefix))
            .collect()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }
}

pub async fn spawn_mock_upstream() -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let base = Url::parse(&format!("http://{addr}")).expect("valid base url");

    let mock = MockUpstream {
        base,
        reqs: Arc::default(),
        revoked: Arc::default(),
        status_polls: Arc::default(),
        jobs: Arc::default(),
        job_mode: Arc::default(),
    };

    let app = Router::new().fallback(dispatch).with_state(mock.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    mock
}

async fn dispatch(State(mock): State<MockUpstream>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let body = to_bytes(body, usize::MAX).await.expect("read mock body");
    let path = parts.uri.path().to_string();
    let captured = Captured {
        method: parts.method.clone(),
        path: path.clone(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers.clone(),
        body,
    };
    mock.reqs.lock().unwrap().push(captured.clone());

    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    match (parts.method.clone(), path.as_str()) {
        (Method::GET, "/auth/v1/user") => auth_user(&mock, bearer.as_deref()),
        (Method::POST, "/auth/v1/token") => password_grant(&captured),
        (Method::POST, "/auth/v1/logout") => {
            if let Some(token) = bearer {
                mock.revoked.lock().unwrap().insert(token);
            }
            StatusCode::NO_CONTENT.into_response()
        }
        (Method::POST, p) if p.starts_with("/storage/v1/object/list/") => storage_list(),
        (Method::POST, p) if p.starts_with("/storage/v1/object/sign/") => storage_sign(&captured),
        (Method::POST, p) if p.starts_with("/storage/v1/object/") => {
            Json(json!({ "Key": p.trim_start_matches("/storage/v1/object/") })).into_response()
        }
        (Method::POST, "/storage/upload/initiate") => {
            let file_name = captured.json()["file_name"]
                .as_str()
                .unwrap_or("upload.bin")
                .to_string();
            Json(json!({
                "upload_url": mock.url(&format!("/cdn-upload/{file_name}")),
                "file_url": mock.url(&format!("/files/{file_name}")),
            }))
            .into_response()
        }
        (Method::PUT, p) if p.starts_with("/cdn-upload/") => StatusCode::OK.into_response(),
        (Method::GET, p) if p.starts_with("/files/") => (
            [(header::CONTENT_TYPE, "image/png")],
            Bytes::from_static(b"\x89PNG fake image"),
        )
            .into_response(),
        (Method::POST, "/v1/chat/completions") => chat_completion(&captured),
        (Method::GET, p) if p.starts_with("/requests/") && p.ends_with("/status") => {
            queue_status(&mock, p)
        }
        (Method::GET, p) if p.starts_with("/requests/") => queue_result(&mock, p),
        (Method::POST, _) => queue_submit(&mock, &path),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

fn auth_user(mock: &MockUpstream, bearer: Option<&str>) -> Response {
    let Some(token) = bearer else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if mock.revoked.lock().unwrap().contains(token) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "invalid JWT" })),
        )
            .into_response();
    }
    match token {
        GOOD_TOKEN => Json(json!({ "id": USER_ID, "email": "anna@example.com", "role": "authenticated" }))
            .into_response(),
        OTHER_TOKEN => Json(json!({ "id": OTHER_USER_ID, "email": "jan@example.com" }))
            .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "invalid JWT" })),
        )
            .into_response(),
    }
}

fn password_grant(captured: &Captured) -> Response {
    let body = captured.json();
    if body["password"] != PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })),
        )
            .into_response();
    }
    Json(json!({
        "access_token": GOOD_TOKEN,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh",
        "user": { "id": USER_ID, "email": body["email"] }
    }))
    .into_response()
}

fn storage_list() -> Response {
    Json(json!([
        {
            "name": "1700000000000_0.png",
            "id": "obj-1",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
            "metadata": { "size": 2048, "mimetype": "image/png" }
        },
        {
            "name": ".emptyFolderPlaceholder",
            "id": "obj-2",
            "metadata": { "size": 0 }
        },
        { "name": "nested", "id": null, "metadata": null }
    ]))
    .into_response()
}

fn storage_sign(captured: &Captured) -> Response {
    let body = captured.json();
    let bucket = captured.path.trim_start_matches("/storage/v1/object/sign/");
    let entries: Vec<Value> = body["paths"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|path| {
            let path = path.as_str().unwrap_or_default().to_string();
            json!({
                "path": path,
                "signedURL": format!("/object/sign/{bucket}/{path}?token=signed"),
                "error": null
            })
        })
        .collect();
    Json(Value::Array(entries)).into_response()
}

fn chat_completion(captured: &Captured) -> Response {
    let body = captured.json();
    let system = body["messages"][0]["content"].as_str().unwrap_or_default();
    let user = body["messages"][1]["content"].as_str().unwrap_or_default();

    let answer = if system.contains("true or false") {
        // Anything with non-ASCII letters counts as the source language here.
        if user.is_ascii() { "false" } else { "true" }
    } else {
        "A red cat sleeps on the roof"
    };
    Json(json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": answer } }]
    }))
    .into_response()
}

fn queue_submit(mock: &MockUpstream, endpoint: &str) -> Response {
    let mut jobs = mock.jobs.lock().unwrap();
    let request_id = format!("req-{}", jobs.len() + 1);
    jobs.insert(request_id.clone(), endpoint.to_string());
    Json(json!({
        "request_id": request_id,
        "status_url": mock.url(&format!("/requests/{request_id}/status")),
        "response_url": mock.url(&format!("/requests/{request_id}")),
        "queue_position": 0
    }))
    .into_response()
}

/// First check reports the job queued, the next one settles per [`JobMode`].
fn queue_status(mock: &MockUpstream, path: &str) -> Response {
    let request_id = path
        .trim_start_matches("/requests/")
        .trim_end_matches("/status")
        .to_string();
    let mode = mock.job_mode();
    let mut polls = mock.status_polls.lock().unwrap();
    let count = polls.entry(request_id).or_insert(0);
    *count += 1;
    if *count == 1 {
        return Json(json!({ "status": "IN_QUEUE", "queue_position": 1 })).into_response();
    }
    match mode {
        JobMode::NeverComplete => Json(json!({
            "status": "IN_PROGRESS",
            "logs": [{ "message": "step 1/1000", "level": "INFO" }]
        }))
        .into_response(),
        JobMode::CompleteWithError => Json(json!({
            "status": "COMPLETED",
            "error": "CUDA out of memory"
        }))
        .into_response(),
        JobMode::Succeed | JobMode::ResultFails => Json(json!({
            "status": "COMPLETED",
            "logs": [{ "message": "done", "level": "INFO" }]
        }))
        .into_response(),
    }
}

pub fn status_polls(mock: &MockUpstream) -> u32 {
    mock.status_polls.lock().unwrap().values().sum()
}

fn queue_result(mock: &MockUpstream, path: &str) -> Response {
    if mock.job_mode() == JobMode::ResultFails {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "worker crashed" })),
        )
            .into_response();
    }
    let request_id = path.trim_start_matches("/requests/");
    let endpoint = mock
        .jobs
        .lock()
        .unwrap()
        .get(request_id)
        .cloned()
        .unwrap_or_default();

    if endpoint.contains("training") {
        return Json(json!({
            "diffusers_lora_file": {
                "url": mock.url("/files/pytorch_lora_weights.safetensors"),
                "content_type": "application/octet-stream"
            },
            "config_file": { "url": mock.url("/files/config.json") }
        }))
        .into_response();
    }
    Json(json!({
        "images": [{
            "url": mock.url("/files/out.png"),
            "width": 1024,
            "height": 768,
            "content_type": "image/png"
        }],
        "seed": 42,
        "has_nsfw_concepts": [false]
    }))
    .into_response()
}

pub fn unique_sqlite_path(prefix: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "cinkbert-{prefix}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    temp_path
}

/// Defaults with every provider pointed at the mock and fast polling.
pub fn test_config(mock: &MockUpstream, prefix: &str) -> Config {
    let mut cfg = Config::default();
    cfg.basic.database_url = format!("sqlite:{}", unique_sqlite_path(prefix).display());
    cfg.basic.insecure_cookie = true;

    cfg.providers.fal.api_key = "fal-key".to_string();
    cfg.providers.fal.queue_url = mock.base.clone();
    cfg.providers.fal.storage_url = mock.base.clone();
    cfg.providers.fal.poll_interval_ms = 10;
    cfg.providers.fal.training_poll_interval_ms = 10;
    cfg.providers.fal.generation_timeout_secs = 5;
    cfg.providers.fal.training_timeout_secs = 5;

    cfg.providers.openai.api_key = "openai-key".to_string();
    cfg.providers.openai.api_url = mock.base.clone();

    cfg.providers.supabase.url = Some(mock.base.clone());
    cfg.providers.supabase.anon_key = "anon-key".to_string();
    cfg.providers.supabase.service_role_key = "service-key".to_string();
    cfg.providers.supabase.signed_url_ttl_secs = SIGNED_URL_TTL_SECS;
    cfg
}

pub struct TestApp {
    pub app: Router,
    pub mock: MockUpstream,
    pub db: DbActorHandle,
    pub cfg: Config,
}

pub async fn spawn_app(prefix: &str) -> TestApp {
    let mock = spawn_mock_upstream().await;
    spawn_app_with(mock, prefix, |_| {}).await
}

pub async fn spawn_app_with(
    mock: MockUpstream,
    prefix: &str,
    tweak: impl FnOnce(&mut Config),
) -> TestApp {
    let mut cfg = test_config(&mock, prefix);
    tweak(&mut cfg);

    let db = cinkbert::db::spawn(&cfg.basic.database_url)
        .await
        .expect("spawn db actor");
    let providers = cinkbert::providers::Providers::new(&cfg).expect("build providers");
    let state = CinkbertState::new(providers, db.clone(), &cfg.basic, cfg.limits.clone())
        .expect("build state");

    TestApp {
        app: cinkbert_router(state),
        mock,
        db,
        cfg,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "response body was not JSON ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &Router, req: axum::http::Request<Body>) -> TestResponse {
    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> axum::http::Request<Body> {
    let mut builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn get_request(uri: &str, token: Option<&str>) -> axum::http::Request<Body> {
    let mut builder = axum::http::Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("failed to build request")
}

/// A `multipart/form-data` body assembled by hand.
pub struct MultipartBody {
    boundary: String,
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "cinkbert-test-boundary".to_string(),
            buf: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str, token: Option<&str>) -> axum::http::Request<Body> {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        let mut builder = axum::http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", self.boundary),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
            .body(Body::from(self.buf))
            .expect("failed to build request")
    }
}
