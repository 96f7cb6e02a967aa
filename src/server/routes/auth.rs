use crate::error::CinkbertError;
use crate::server::extract::ApiJson;
use crate::server::guards::auth::{AuthUser, SESSION_COOKIE, extract_token};
use crate::server::router::CinkbertState;
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct SigninQuery {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub access_token: String,
    pub expires_in: i64,
}

/// GET /signin
///
/// Describes how to obtain a session. `next` is echoed back so a client can
/// return the visitor to the page that bounced them.
pub async fn signin_page(Query(query): Query<SigninQuery>) -> Json<Value> {
    let next = query
        .next
        .filter(|next| next.starts_with('/') && !next.starts_with("//"))
        .unwrap_or_else(|| "/models".to_string());
    Json(json!({
        "action": "/auth/signin",
        "method": "POST",
        "fields": ["email", "password"],
        "next": next,
    }))
}

/// POST /auth/signin
pub async fn signin(
    State(state): State<CinkbertState>,
    jar: PrivateCookieJar,
    ApiJson(req): ApiJson<SigninRequest>,
) -> Result<impl IntoResponse, CinkbertError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(CinkbertError::invalid_request(
            "email and password are required.",
        ));
    }

    let session = state
        .providers
        .supabase
        .sign_in_with_password(email, &req.password)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, session.access_token.clone()))
        .path("/")
        .http_only(true)
        .secure(!state.insecure_cookie)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(session.expires_in.max(0)))
        .build();

    state.sessions.insert(AuthUser {
        id: session.user.id.clone(),
        email: session.user.email.clone(),
        access_token: session.access_token.clone(),
    });
    info!(user_id = %session.user.id, "Signed in");

    let body = SigninResponse {
        user_id: session.user.id,
        email: session.user.email,
        access_token: session.access_token,
        expires_in: session.expires_in,
    };
    Ok((jar.add(cookie), Json(body)))
}

/// POST /auth/signout
///
/// Always clears the cookie; upstream revocation failures are only logged.
pub async fn signout(
    State(state): State<CinkbertState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(token) = extract_token(&headers, &state) {
        state.sessions.invalidate(&token);
        if let Err(err) = state.providers.supabase.sign_out(&token).await {
            warn!(error = %err, "Token revocation failed");
        }
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}
