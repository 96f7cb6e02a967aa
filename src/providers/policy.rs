use crate::error::CinkbertError;
use serde::de::DeserializeOwned;
use tracing::debug;

pub const UPSTREAM_BODY_PREVIEW_CHARS: usize = 300;

pub(crate) fn body_preview(body: &str) -> String {
    format!("{:.len$}", body, len = UPSTREAM_BODY_PREVIEW_CHARS)
}

/// Passes 2xx responses through and turns anything else into `UpstreamStatus`.
pub(crate) async fn ensure_success(
    provider: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, CinkbertError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    Err(upstream_error(provider, resp).await)
}

pub(crate) async fn upstream_error(provider: &'static str, resp: reqwest::Response) -> CinkbertError {
    let status = resp.status();
    let bytes = resp.bytes().await.unwrap_or_default();
    let body = body_preview(&String::from_utf8_lossy(&bytes));

    debug!(provider, %status, body = %body, "Upstream error response");

    CinkbertError::UpstreamStatus {
        provider,
        status,
        body,
    }
}

/// `ensure_success` followed by a JSON decode; parse failures log a body preview.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &'static str,
    resp: reqwest::Response,
) -> Result<T, CinkbertError> {
    let resp = ensure_success(provider, resp).await?;
    let bytes = resp.bytes().await?;
    serde_json::from_slice::<T>(&bytes).map_err(|error| {
        debug!(
            provider,
            %error,
            body = %body_preview(&String::from_utf8_lossy(&bytes)),
            "Upstream payload did not match the expected shape"
        );
        CinkbertError::JsonError(error)
    })
}
