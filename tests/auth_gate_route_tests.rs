mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::{GOOD_TOKEN, PASSWORD, USER_ID, get_request, json_request, send, spawn_app};
use serde_json::json;

fn session_cookie(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .expect("set-cookie had no pair")
        .to_string()
}

#[tokio::test]
async fn anonymous_page_requests_redirect_to_signin() {
    let t = spawn_app("auth-redirect").await;

    for (uri, location) in [
        ("/models", "/signin?next=%2Fmodels"),
        ("/train", "/signin?next=%2Ftrain"),
        ("/gallery?limit=5", "/signin?next=%2Fgallery%3Flimit%3D5"),
    ] {
        let resp = send(&t.app, get_request(uri, None)).await;
        assert_eq!(resp.status, StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(resp.header(header::LOCATION), Some(location), "{uri}");
    }

    // A rejected token behaves like no token at all.
    let resp = send(&t.app, get_request("/models", Some("forged"))).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);

    assert!(t.mock.non_auth_requests().is_empty());
}

#[tokio::test]
async fn anonymous_api_requests_get_401_json() {
    let t = spawn_app("auth-api-401").await;

    let resp = send(
        &t.app,
        json_request(
            Method::POST,
            "/api/predictions",
            None,
            json!({ "prompt": "a cat", "model": "flux-dev" }),
        ),
    )
    .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json()["error"]["code"], "UNAUTHORIZED");
    assert_eq!(resp.json()["error"]["message"], "Missing session");

    let resp = send(
        &t.app,
        json_request(Method::POST, "/api/translate", Some("forged"), json!({ "text": "kot" })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json()["error"]["code"], "UNAUTHORIZED");
    assert_eq!(resp.json()["error"]["message"], "Invalid or expired session");

    assert!(t.mock.non_auth_requests().is_empty());
}

#[tokio::test]
async fn bearer_token_is_verified_once_and_cached() {
    let t = spawn_app("auth-cache").await;

    for _ in 0..3 {
        let resp = send(&t.app, get_request("/models", Some(GOOD_TOKEN))).await;
        assert_eq!(resp.status, StatusCode::OK);
    }

    let lookups = t.mock.requests_to(Method::GET, "/auth/v1/user");
    assert_eq!(lookups.len(), 1);
    assert_eq!(
        lookups[0].headers.get("apikey").and_then(|v| v.to_str().ok()),
        Some("anon-key")
    );
}

#[tokio::test]
async fn signin_sets_a_cookie_that_opens_pages_and_signout_revokes_it() {
    let t = spawn_app("auth-cookie").await;

    let resp = send(
        &t.app,
        json_request(
            Method::POST,
            "/auth/signin",
            None,
            json!({ "email": "anna@example.com", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json()["error"]["code"], "INVALID_CREDENTIALS");
    assert!(resp.header(header::SET_COOKIE).is_none());

    let resp = send(
        &t.app,
        json_request(
            Method::POST,
            "/auth/signin",
            None,
            json!({ "email": "anna@example.com", "password": PASSWORD }),
        ),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["user_id"], USER_ID);
    assert_eq!(body["access_token"], GOOD_TOKEN);
    assert_eq!(body["expires_in"], 3600);

    let set_cookie = resp
        .header(header::SET_COOKIE)
        .expect("signin did not set a cookie")
        .to_string();
    assert!(set_cookie.starts_with("cinkbert_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=3600"));
    // The cookie value is encrypted, never the raw token.
    assert!(!set_cookie.contains(GOOD_TOKEN));
    let cookie = session_cookie(&set_cookie);

    let with_cookie = |uri: &str| {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::COOKIE, cookie.clone())
            .body(Body::empty())
            .expect("failed to build request")
    };

    let resp = send(&t.app, with_cookie("/train")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["min_images"], 4);
    // Signin primed the cache, so no lookup was needed.
    assert!(t.mock.requests_to(Method::GET, "/auth/v1/user").is_empty());

    let resp = send(
        &t.app,
        Request::builder()
            .method(Method::POST)
            .uri("/auth/signout")
            .header(header::COOKIE, cookie.clone())
            .body(Body::empty())
            .expect("failed to build request"),
    )
    .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    let cleared = resp
        .header(header::SET_COOKIE)
        .expect("signout did not clear the cookie");
    assert!(cleared.starts_with("cinkbert_session="));
    assert_eq!(t.mock.requests_to(Method::POST, "/auth/v1/logout").len(), 1);

    // The old cookie now fails verification upstream.
    let resp = send(&t.app, with_cookie("/train")).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn signin_page_is_public_and_sanitizes_next() {
    let t = spawn_app("auth-signin-page").await;

    let resp = send(&t.app, get_request("/signin?next=%2Fgallery", None)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["next"], "/gallery");
    assert_eq!(resp.json()["action"], "/auth/signin");

    let resp = send(&t.app, get_request("/signin?next=https%3A%2F%2Fevil.example", None)).await;
    assert_eq!(resp.json()["next"], "/models");
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let t = spawn_app("auth-404").await;
    let resp = send(&t.app, get_request("/nope", Some(GOOD_TOKEN))).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
