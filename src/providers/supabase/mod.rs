//! Supabase Auth (GoTrue) and Storage REST client.

mod auth;
mod storage;

use crate::config::SupabaseResolvedConfig;
use crate::error::CinkbertError;
use std::sync::Arc;
use url::Url;

pub const SUPABASE_PROVIDER: &str = "supabase";

#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    cfg: Arc<SupabaseResolvedConfig>,
}

impl SupabaseClient {
    pub fn new(cfg: Arc<SupabaseResolvedConfig>, client: reqwest::Client) -> Self {
        Self { client, cfg }
    }

    pub fn config(&self) -> &SupabaseResolvedConfig {
        &self.cfg
    }

    /// `{project_url}/{path}` where `path` is relative to the project root.
    fn api_url(&self, path: &str) -> Result<Url, CinkbertError> {
        let mut base = self.cfg.url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client_for(url: &str) -> SupabaseClient {
        let mut cfg = Config::default();
        cfg.providers.supabase.url = Some(Url::parse(url).unwrap());
        SupabaseClient::new(Arc::new(cfg.supabase()), reqwest::Client::new())
    }

    #[test]
    fn api_urls_keep_the_project_prefix() {
        let root = client_for("https://abc.supabase.co");
        assert_eq!(
            root.api_url("/auth/v1/user").unwrap().as_str(),
            "https://abc.supabase.co/auth/v1/user"
        );

        let proxied = client_for("http://127.0.0.1:8000/supabase");
        assert_eq!(
            proxied.api_url("storage/v1/object/list/bucket").unwrap().as_str(),
            "http://127.0.0.1:8000/supabase/storage/v1/object/list/bucket"
        );
    }
}
