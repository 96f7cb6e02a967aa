use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /storage/v1/object/list/{bucket}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StorageListRequest {
    pub prefix: String,
    pub limit: u32,
    pub offset: u32,
    #[serde(rename = "sortBy")]
    pub sort_by: StorageSortBy,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StorageSortBy {
    pub column: String,
    pub order: String,
}

impl StorageSortBy {
    pub fn newest_first() -> Self {
        Self {
            column: "created_at".to_string(),
            order: "desc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StorageObject {
    pub name: String,
    /// `null` for folder entries.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<StorageObjectMetadata>,
}

impl StorageObject {
    pub fn is_file(&self) -> bool {
        self.id.is_some() && !self.name.starts_with('.')
    }

    pub fn size(&self) -> Option<u64> {
        self.metadata.as_ref().and_then(|m| m.size)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StorageObjectMetadata {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// Body of `POST /storage/v1/object/sign/{bucket}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SignedUrlsRequest {
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SignedUrlEntry {
    #[serde(default)]
    pub path: Option<String>,
    /// Relative to `/storage/v1`.
    #[serde(default, rename = "signedURL")]
    pub signed_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
