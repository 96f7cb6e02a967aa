use crate::config::{BasicConfig, LimitsConfig};
use crate::db::DbActorHandle;
use crate::error::CinkbertError;
use crate::providers::Providers;
use crate::server::guards::auth::SessionCache;
use crate::server::routes::{auth, catalog, gallery, predictions, train, translate};

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, Request},
    http::{HeaderName, StatusCode, Version, header::USER_AGENT},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use base64::Engine as _;
use rand::RngCore;
use reqwest::header::HeaderValue;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

#[derive(Clone)]
pub struct CinkbertState {
    pub providers: Providers,
    pub db: DbActorHandle,
    pub limits: Arc<LimitsConfig>,
    pub sessions: SessionCache,
    pub cookie_key: Key,
    pub insecure_cookie: bool,
}

impl CinkbertState {
    pub fn new(
        providers: Providers,
        db: DbActorHandle,
        basic: &BasicConfig,
        limits: LimitsConfig,
    ) -> Result<Self, CinkbertError> {
        Ok(Self {
            providers,
            db,
            limits: Arc::new(limits),
            sessions: SessionCache::new(Duration::from_secs(basic.session_cache_ttl_secs)),
            cookie_key: cookie_key_from_secret(&basic.cookie_secret)?,
            insecure_cookie: basic.insecure_cookie,
        })
    }
}

/// An empty secret yields a per-process key, so sessions do not survive restarts.
fn cookie_key_from_secret(secret: &str) -> Result<Key, CinkbertError> {
    let secret = secret.trim();
    if secret.is_empty() {
        warn!("basic.cookie_secret is empty; generated a per-process cookie key");
        return Ok(Key::generate());
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(secret)
        .map_err(|e| CinkbertError::UnexpectedError(format!("cookie_secret is not base64: {e}")))?;
    Key::try_from(bytes.as_slice()).map_err(|e| {
        CinkbertError::UnexpectedError(format!("cookie_secret must decode to at least 64 bytes: {e}"))
    })
}

impl FromRef<CinkbertState> for Key {
    fn from_ref(state: &CinkbertState) -> Self {
        state.cookie_key.clone()
    }
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn access_log(req: Request, next: Next) -> Response {
    // Capture request metadata before moving `req` into the handler stack.
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = start.elapsed().as_millis() as u64;
    let path = uri.path();
    let protocol = format_http_version(version);

    // Long jobs (training) show up here with their full polling time.
    if status.is_server_error() {
        error!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else if status.is_client_error() {
        warn!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else {
        info!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    }

    resp
}

pub fn cinkbert_router(state: CinkbertState) -> Router {
    let public = Router::new()
        .route(crate::server::guards::auth::SIGNIN_PATH, get(auth::signin_page))
        .route("/auth/signin", post(auth::signin))
        .route("/auth/signout", post(auth::signout));

    // Page routes redirect anonymous visitors; the guard lives in each handler's `PageUser`.
    let pages = Router::new()
        .route("/models", get(catalog::list_models))
        .route("/models/{model}", get(catalog::get_model))
        .route("/train", get(train::train_page))
        .route("/gallery", get(gallery::gallery));

    let training = Router::new()
        .route("/api/train-model", post(train::train_model))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.limits.training_body_limit()));

    let generation = Router::new()
        .route("/api/predictions", post(predictions::create_prediction))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.limits.prediction_body_limit()));

    let api = Router::new().route("/api/translate", post(translate::translate));

    Router::new()
        .merge(public)
        .merge(pages)
        .merge(training)
        .merge(generation)
        .merge(api)
        .fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_secret_must_be_long_enough() {
        let short = base64::engine::general_purpose::STANDARD.encode([1u8; 16]);
        assert!(cookie_key_from_secret(&short).is_err());

        let long = base64::engine::general_purpose::STANDARD.encode([1u8; 64]);
        assert!(cookie_key_from_secret(&long).is_ok());

        assert!(cookie_key_from_secret("").is_ok());
        assert!(cookie_key_from_secret("not base64 !!").is_err());
    }
}
