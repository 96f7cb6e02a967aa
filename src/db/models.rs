use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbUserModel {
    pub id: String,
    pub user_id: String,
    /// Catalog-wide unique slug used in `/models/{model}` and generation requests.
    pub url_id: String,
    pub name: String,
    pub provider_model_id: String,
    pub subject_type: String,
    pub supports_file_upload: bool,
    pub is_custom: bool,
    pub lora_path: Option<String>,
    pub trigger_word: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a freshly trained model.
///
/// `url_id` is the preferred slug; the actor suffixes it when it is taken.
#[derive(Debug, Clone)]
pub struct UserModelCreate {
    pub user_id: String,
    pub url_id: String,
    pub name: String,
    pub provider_model_id: String,
    pub subject_type: String,
    pub supports_file_upload: bool,
    pub lora_path: Option<String>,
    pub trigger_word: Option<String>,
}
