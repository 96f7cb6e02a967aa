use crate::error::CinkbertError;
use crate::providers::policy::{ensure_success, read_json};
use axum::body::Bytes;
use cinkbert_schema::{FalUploadInitiateRequest, FalUploadInitiateResponse};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::info;

use super::{FAL_PROVIDER, FalClient};

impl FalClient {
    /// Uploads bytes to fal storage and returns the public `file_url`.
    pub async fn upload_file(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, CinkbertError> {
        let mut initiate_url = self.cfg.storage_url.join("storage/upload/initiate")?;
        initiate_url
            .query_pairs_mut()
            .append_pair("storage_type", "fal-cdn-v3");

        let resp = self
            .client
            .post(initiate_url)
            .header(AUTHORIZATION, self.auth_header()?)
            .json(&FalUploadInitiateRequest {
                file_name: file_name.to_string(),
                content_type: content_type.to_string(),
            })
            .send()
            .await?;
        let target: FalUploadInitiateResponse = read_json(FAL_PROVIDER, resp).await?;

        let size = data.len();
        let resp = self
            .client
            .put(&target.upload_url)
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;
        ensure_success(FAL_PROVIDER, resp).await?;

        info!(file_name, size, file_url = %target.file_url, "[fal] file uploaded");
        Ok(target.file_url)
    }
}
