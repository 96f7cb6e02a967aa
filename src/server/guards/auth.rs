use crate::error::CinkbertError;
use crate::providers::supabase::SupabaseClient;
use crate::server::router::CinkbertState;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use moka::sync::Cache;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const SESSION_COOKIE: &str = "cinkbert_session";
pub const SIGNIN_PATH: &str = "/signin";

/// The signed-in caller, as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip)]
    pub access_token: String,
}

/// Verified tokens, kept for a short TTL to spare the auth provider a call per request.
#[derive(Clone)]
pub struct SessionCache {
    inner: Cache<String, AuthUser>,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn invalidate(&self, access_token: &str) {
        self.inner.invalidate(access_token);
    }

    pub fn insert(&self, user: AuthUser) {
        self.inner.insert(user.access_token.clone(), user);
    }

    /// Cache first, then the provider. `Ok(None)` means the token was rejected.
    pub async fn verify(
        &self,
        supabase: &SupabaseClient,
        access_token: &str,
    ) -> Result<Option<AuthUser>, CinkbertError> {
        if let Some(user) = self.inner.get(access_token) {
            return Ok(Some(user));
        }

        let Some(user) = supabase.get_user(access_token).await? else {
            return Ok(None);
        };
        let user = AuthUser {
            id: user.id,
            email: user.email,
            access_token: access_token.to_string(),
        };
        debug!(user_id = %user.id, "session verified");
        self.insert(user.clone());
        Ok(Some(user))
    }
}

/// Bearer header first, then the encrypted session cookie.
pub(crate) fn extract_token(headers: &HeaderMap, state: &CinkbertState) -> Option<String> {
    if let Some(auth) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(auth.token().to_string());
    }
    let jar = PrivateCookieJar::from_headers(headers, state.cookie_key.clone());
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

async fn authenticate(parts: &Parts, state: &CinkbertState) -> Result<AuthUser, AuthError> {
    let token = extract_token(&parts.headers, state).ok_or(AuthError::MissingSession)?;
    match state.sessions.verify(&state.providers.supabase, &token).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AuthError::InvalidSession),
        Err(err) => {
            warn!(error = %err, "session verification failed");
            Err(AuthError::Upstream(err))
        }
    }
}

impl FromRequestParts<CinkbertState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &CinkbertState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingSession,
    InvalidSession,
    Upstream(CinkbertError),
}

impl From<AuthError> for CinkbertError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingSession => CinkbertError::Unauthorized("Missing session"),
            AuthError::InvalidSession => CinkbertError::Unauthorized("Invalid or expired session"),
            AuthError::Upstream(err) => err,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        CinkbertError::from(self).into_response()
    }
}

/// Like [`AuthUser`], but anonymous visitors are sent to the sign-in page.
#[derive(Debug, Clone)]
pub struct PageUser(pub AuthUser);

impl FromRequestParts<CinkbertState> for PageUser {
    type Rejection = PageAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &CinkbertState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state).await {
            Ok(user) => Ok(PageUser(user)),
            Err(AuthError::Upstream(err)) => Err(PageAuthRejection::Failed(err)),
            Err(_) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(PageAuthRejection::SignIn(signin_location(next)))
            }
        }
    }
}

#[derive(Debug)]
pub enum PageAuthRejection {
    SignIn(String),
    Failed(CinkbertError),
}

impl IntoResponse for PageAuthRejection {
    fn into_response(self) -> Response {
        match self {
            PageAuthRejection::SignIn(location) => Redirect::to(&location).into_response(),
            PageAuthRejection::Failed(err) => err.into_response(),
        }
    }
}

pub(crate) fn signin_location(next: &str) -> String {
    let next: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{SIGNIN_PATH}?next={next}")
}
