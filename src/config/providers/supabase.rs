use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{HttpClientSettings, ProviderDefaults};

/// Supabase (auth + storage) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://<ref>.supabase.co`.
    /// TOML: `providers.supabase.url`. Required.
    #[serde(default)]
    pub url: Option<Url>,

    /// Public anon key, sent as `apikey` on auth calls.
    /// TOML: `providers.supabase.anon_key`. Required.
    #[serde(default)]
    pub anon_key: String,

    /// Service role key used for storage calls on behalf of users.
    /// TOML: `providers.supabase.service_role_key`. Required.
    #[serde(default)]
    pub service_role_key: String,

    /// TOML: `providers.supabase.bucket`. Default: `bucket`.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Lifetime of gallery signed URLs.
    /// TOML: `providers.supabase.signed_url_ttl_secs`. Default: `3600`.
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,

    /// Maximum number of gallery entries returned per request.
    /// TOML: `providers.supabase.gallery_page_limit`. Default: `100`.
    #[serde(default = "default_gallery_page_limit")]
    pub gallery_page_limit: u32,

    /// Copy generated images into `generated/<user_id>/`.
    /// TOML: `providers.supabase.archive_generated`. Default: `true`.
    #[serde(default = "default_true")]
    pub archive_generated: bool,

    /// Copy training archives into `uploads/<user_id>/`.
    /// TOML: `providers.supabase.archive_uploads`. Default: `true`.
    #[serde(default = "default_true")]
    pub archive_uploads: bool,

    /// Falls back to `providers.defaults.proxy` when unset.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Falls back to `providers.defaults.enable_multiplexing` when unset.
    #[serde(default)]
    pub enable_multiplexing: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct SupabaseResolvedConfig {
    pub url: Url,
    pub anon_key: String,
    pub service_role_key: String,
    pub bucket: String,
    pub signed_url_ttl: Duration,
    pub gallery_page_limit: u32,
    pub archive_generated: bool,
    pub archive_uploads: bool,
    pub http: HttpClientSettings,
}

impl SupabaseConfig {
    pub fn resolve(&self, defaults: &ProviderDefaults) -> SupabaseResolvedConfig {
        SupabaseResolvedConfig {
            url: self.url.clone().unwrap_or_else(local_supabase_url),
            anon_key: self.anon_key.clone(),
            service_role_key: self.service_role_key.clone(),
            bucket: self.bucket.clone(),
            signed_url_ttl: Duration::from_secs(self.signed_url_ttl_secs),
            gallery_page_limit: self.gallery_page_limit.max(1),
            archive_generated: self.archive_generated,
            archive_uploads: self.archive_uploads,
            http: defaults.http_settings(self.proxy.as_ref(), self.enable_multiplexing),
        }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: String::new(),
            service_role_key: String::new(),
            bucket: default_bucket(),
            signed_url_ttl_secs: default_signed_url_ttl_secs(),
            gallery_page_limit: default_gallery_page_limit(),
            archive_generated: true,
            archive_uploads: true,
            proxy: None,
            enable_multiplexing: None,
        }
    }
}

/// `supabase start` listens here.
fn local_supabase_url() -> Url {
    Url::parse("http://127.0.0.1:54321").expect("valid local supabase url")
}

fn default_bucket() -> String {
    "bucket".to_string()
}

fn default_signed_url_ttl_secs() -> u64 {
    3600
}

fn default_gallery_page_limit() -> u32 {
    100
}

fn default_true() -> bool {
    true
}
