use serde::{Deserialize, Serialize};

/// Body of `POST {storage_url}/storage/upload/initiate`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FalUploadInitiateRequest {
    pub file_name: String,
    pub content_type: String,
}

/// `upload_url` receives the bytes via `PUT`; `file_url` is what model inputs reference.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FalUploadInitiateResponse {
    pub upload_url: String,
    pub file_url: String,
}
