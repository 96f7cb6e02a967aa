use crate::config::HttpClientSettings;
use crate::error::CinkbertError;
use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};
use std::time::Duration;

pub const CINKBERT_USER_AGENT: &str = concat!("cinkbert/", env!("CARGO_PKG_VERSION"));

/// One reqwest client per provider so proxy and HTTP/2 settings stay independent.
pub(crate) fn build_client(
    user_agent: &str,
    settings: &HttpClientSettings,
) -> Result<reqwest::Client, CinkbertError> {
    let mut headers = HeaderMap::new();

    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(5))
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout);

    if let Some(proxy_url) = settings.proxy.as_ref() {
        let proxy = reqwest::Proxy::all(proxy_url.as_str())?;
        builder = builder.proxy(proxy);
    }

    if !settings.enable_multiplexing {
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        builder = builder
            .http1_only()
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Duration::from_secs(0));
    } else {
        builder = builder.http2_adaptive_window(true);
    }

    Ok(builder.default_headers(headers).build()?)
}
