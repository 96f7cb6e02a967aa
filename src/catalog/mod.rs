//! Model catalog: built-in fal models plus each user's trained LoRAs.

pub mod capabilities;
pub mod naming;
pub mod registry;
pub mod subject;

pub use capabilities::{ModelCapabilities, OutputKind, SizeControl};
pub use naming::{derive_trigger_word, derive_url_id, ensure_trigger_word};
pub use registry::{STATIC_MODELS, StaticModel, find_static, is_static_model_id};
pub use subject::{SubjectType, UnknownSubjectType};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{DbActorHandle, DbUserModel};
use crate::error::CinkbertError;

/// Capabilities of every user-trained model.
const CUSTOM_CAPABILITIES: ModelCapabilities = ModelCapabilities::text_to_image();

/// A generation target, resolved before any upstream call.
#[derive(Debug, Clone)]
pub enum ResolvedModel {
    Static(&'static StaticModel),
    Custom(DbUserModel),
}

impl ResolvedModel {
    pub fn id(&self) -> &str {
        match self {
            ResolvedModel::Static(model) => model.id,
            ResolvedModel::Custom(model) => &model.url_id,
        }
    }

    pub fn capabilities(&self) -> ModelCapabilities {
        match self {
            ResolvedModel::Static(model) => model.capabilities,
            ResolvedModel::Custom(model) => custom_capabilities(model),
        }
    }

    pub fn trigger_word(&self) -> Option<&str> {
        match self {
            ResolvedModel::Static(_) => None,
            ResolvedModel::Custom(model) => model.trigger_word.as_deref(),
        }
    }

    /// LoRA weights URL; present only for trained models.
    pub fn lora_path(&self) -> Option<&str> {
        match self {
            ResolvedModel::Static(_) => None,
            ResolvedModel::Custom(model) => model.lora_path.as_deref(),
        }
    }

    pub fn to_entry(&self) -> CatalogEntry {
        match self {
            ResolvedModel::Static(model) => CatalogEntry::from(*model),
            ResolvedModel::Custom(model) => CatalogEntry::from(model),
        }
    }
}

fn custom_capabilities(model: &DbUserModel) -> ModelCapabilities {
    ModelCapabilities {
        supports_image_input: model.supports_file_upload,
        ..CUSTOM_CAPABILITIES
    }
}

/// Static models win over user models with the same id; user models are only visible
/// to their owner.
pub async fn resolve(
    db: &DbActorHandle,
    user_id: &str,
    model_id: &str,
) -> Result<ResolvedModel, CinkbertError> {
    if let Some(model) = find_static(model_id) {
        return Ok(ResolvedModel::Static(model));
    }
    db.get_user_model(user_id, model_id)
        .await?
        .map(ResolvedModel::Custom)
        .ok_or_else(|| CinkbertError::ModelNotFound(model_id.to_string()))
}

/// JSON view of one catalog entry, shared by static and trained models.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub provider_model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub is_custom: bool,
    pub capabilities: ModelCapabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lora_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&StaticModel> for CatalogEntry {
    fn from(model: &StaticModel) -> Self {
        Self {
            id: model.id.to_string(),
            name: model.name.to_string(),
            description: Some(model.description.to_string()),
            provider_model_id: model.provider_model_id.to_string(),
            image: Some(model.image.to_string()),
            is_custom: false,
            capabilities: model.capabilities,
            subject_type: None,
            trigger_word: None,
            lora_path: None,
            created_at: None,
        }
    }
}

impl From<&DbUserModel> for CatalogEntry {
    fn from(model: &DbUserModel) -> Self {
        Self {
            id: model.url_id.clone(),
            name: model.name.clone(),
            description: None,
            provider_model_id: model.provider_model_id.clone(),
            image: None,
            is_custom: model.is_custom,
            capabilities: custom_capabilities(model),
            subject_type: Some(model.subject_type.clone()),
            trigger_word: model.trigger_word.clone(),
            lora_path: model.lora_path.clone(),
            created_at: Some(model.created_at),
        }
    }
}
