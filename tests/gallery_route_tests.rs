mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use common::{GOOD_TOKEN, SIGNED_URL_TTL_SECS, USER_ID, get_request, send, spawn_app};
use serde_json::json;

#[tokio::test]
async fn gallery_signs_with_the_configured_expiry() {
    let t = spawn_app("gallery-ttl").await;
    let before = Utc::now();

    let resp = send(&t.app, get_request("/gallery?limit=500&offset=10", Some(GOOD_TOKEN))).await;
    assert_eq!(resp.status, StatusCode::OK, "{}", String::from_utf8_lossy(&resp.body));
    let body = resp.json();

    assert_eq!(body["expires_in"], SIGNED_URL_TTL_SECS);
    let images = body["images"].as_array().expect("images");
    // Folder entries and placeholders are skipped.
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["name"], "1700000000000_0.png");
    assert_eq!(images[0]["size"], 2048);
    assert_eq!(
        images[0]["url"],
        format!(
            "{}storage/v1/object/sign/bucket/generated/{USER_ID}/1700000000000_0.png?token=signed",
            t.mock.base
        )
    );

    let expires_at: DateTime<Utc> = images[0]["expires_at"]
        .as_str()
        .expect("expires_at")
        .parse()
        .expect("rfc3339 expires_at");
    let window = (expires_at - before).num_seconds();
    assert!(
        (SIGNED_URL_TTL_SECS as i64 - 5..=SIGNED_URL_TTL_SECS as i64 + 5).contains(&window),
        "expires_at is {window}s away"
    );

    let listings = t.mock.requests_to(Method::POST, "/storage/v1/object/list/bucket");
    assert_eq!(listings.len(), 1);
    assert_eq!(
        listings[0].json(),
        json!({
            "prefix": format!("generated/{USER_ID}"),
            "limit": 100,
            "offset": 10,
            "sortBy": { "column": "created_at", "order": "desc" }
        })
    );
    assert_eq!(
        listings[0]
            .headers
            .get("apikey")
            .and_then(|v| v.to_str().ok()),
        Some("service-key")
    );

    let signs = t.mock.requests_to(Method::POST, "/storage/v1/object/sign/bucket");
    assert_eq!(signs.len(), 1);
    assert_eq!(
        signs[0].json(),
        json!({
            "expiresIn": SIGNED_URL_TTL_SECS,
            "paths": [format!("generated/{USER_ID}/1700000000000_0.png")]
        })
    );
}

#[tokio::test]
async fn gallery_requires_a_session() {
    let t = spawn_app("gallery-anon").await;
    let resp = send(&t.app, get_request("/gallery", None)).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert!(t.mock.non_auth_requests().is_empty());
}

#[tokio::test]
async fn zero_page_limit_still_lists_one_entry() {
    let t = common::spawn_app_with(common::spawn_mock_upstream().await, "gallery-zero", |cfg| {
        cfg.providers.supabase.gallery_page_limit = 0;
    })
    .await;

    for uri in ["/gallery", "/gallery?limit=0", "/gallery?limit=50"] {
        let resp = send(&t.app, get_request(uri, Some(GOOD_TOKEN))).await;
        assert_eq!(resp.status, StatusCode::OK, "{uri}");
    }

    let listings = t.mock.requests_to(Method::POST, "/storage/v1/object/list/bucket");
    assert_eq!(listings.len(), 3);
    for listing in listings {
        assert_eq!(listing.json()["limit"], 1);
    }
}
