use crate::error::CinkbertError;
use crate::providers::supabase::SupabaseClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryQuery {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryImage {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryResponse {
    /// Lifetime of every returned URL, in seconds.
    pub expires_in: u64,
    pub images: Vec<GalleryImage>,
}

pub fn generated_prefix(user_id: &str) -> String {
    format!("generated/{user_id}")
}

/// Lists the caller's generated images, newest first, with signed URLs.
pub async fn list_gallery(
    supabase: &SupabaseClient,
    user_id: &str,
    query: GalleryQuery,
) -> Result<GalleryResponse, CinkbertError> {
    let cfg = supabase.config();
    let ttl = cfg.signed_url_ttl;
    let limit = query
        .limit
        .unwrap_or(cfg.gallery_page_limit)
        .min(cfg.gallery_page_limit)
        .max(1);
    let prefix = generated_prefix(user_id);

    let objects = supabase
        .list(&prefix, limit, query.offset.unwrap_or(0))
        .await?;
    let files: Vec<_> = objects.into_iter().filter(|o| o.is_file()).collect();

    let paths: Vec<String> = files
        .iter()
        .map(|o| format!("{prefix}/{}", o.name))
        .collect();
    let signed = supabase.create_signed_urls(paths.clone(), ttl).await?;
    let expires_at = Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64);

    let mut by_path: HashMap<String, String> = HashMap::with_capacity(signed.len());
    for (requested, entry) in paths.iter().zip(signed) {
        match (entry.signed_url, entry.error) {
            (Some(url), _) => {
                let path = entry.path.unwrap_or_else(|| requested.clone());
                by_path.insert(path, url);
            }
            (None, error) => warn!(path = %requested, error = ?error, "No signed URL for object"),
        }
    }

    let mut images = Vec::with_capacity(files.len());
    for (object, path) in files.iter().zip(&paths) {
        let Some(signed_url) = by_path.get(path) else {
            continue;
        };
        images.push(GalleryImage {
            name: object.name.clone(),
            url: supabase.absolute_signed_url(signed_url)?.to_string(),
            created_at: object.created_at,
            size: object.size(),
            expires_at,
        });
    }

    debug!(user_id, count = images.len(), "Gallery listed");
    Ok(GalleryResponse {
        expires_in: ttl.as_secs(),
        images,
    })
}
