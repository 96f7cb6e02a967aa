use crate::error::CinkbertError;
use crate::providers::policy::{ensure_success, read_json};
use axum::body::Bytes;
use cinkbert_schema::{
    SignedUrlEntry, SignedUrlsRequest, StorageListRequest, StorageObject, StorageSortBy,
};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{SUPABASE_PROVIDER, SupabaseClient};

impl SupabaseClient {
    fn storage_request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.cfg.service_role_key)
            .bearer_auth(&self.cfg.service_role_key)
    }

    /// Lists objects directly under `prefix`, newest first.
    pub async fn list(
        &self,
        prefix: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<StorageObject>, CinkbertError> {
        let url = self.api_url(&format!("storage/v1/object/list/{}", self.cfg.bucket))?;
        let body = StorageListRequest {
            prefix: prefix.to_string(),
            limit,
            offset,
            sort_by: StorageSortBy::newest_first(),
        };

        let resp = self
            .storage_request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        let objects: Vec<StorageObject> = read_json(SUPABASE_PROVIDER, resp).await?;
        debug!(prefix, count = objects.len(), "[Supabase] storage listing");
        Ok(objects)
    }

    /// One batch call for all `paths`; entries come back in request order.
    pub async fn create_signed_urls(
        &self,
        paths: Vec<String>,
        expires_in: Duration,
    ) -> Result<Vec<SignedUrlEntry>, CinkbertError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.api_url(&format!("storage/v1/object/sign/{}", self.cfg.bucket))?;
        let body = SignedUrlsRequest {
            expires_in: expires_in.as_secs(),
            paths,
        };

        let resp = self
            .storage_request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        read_json(SUPABASE_PROVIDER, resp).await
    }

    /// Storage returns signed URLs relative to `/storage/v1`.
    pub fn absolute_signed_url(&self, signed_url: &str) -> Result<Url, CinkbertError> {
        if signed_url.starts_with("http://") || signed_url.starts_with("https://") {
            return Ok(Url::parse(signed_url)?);
        }
        self.api_url(&format!(
            "storage/v1/{}",
            signed_url.trim_start_matches('/')
        ))
    }

    /// Writes `data` to `path` inside the configured bucket, replacing any existing object.
    pub async fn upload(
        &self,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<(), CinkbertError> {
        let url = self.api_url(&format!("storage/v1/object/{}/{}", self.cfg.bucket, path))?;
        let size = data.len();

        let resp = self
            .storage_request(reqwest::Method::POST, url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await?;
        ensure_success(SUPABASE_PROVIDER, resp).await?;

        info!(path, size, "[Supabase] object stored");
        Ok(())
    }
}
