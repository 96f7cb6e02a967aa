//! Supabase Auth (GoTrue) and Storage REST payloads.

mod auth;
mod storage;

pub use auth::{PasswordGrantRequest, SupabaseErrorBody, SupabaseSession, SupabaseUser};
pub use storage::{
    SignedUrlEntry, SignedUrlsRequest, StorageListRequest, StorageObject, StorageObjectMetadata,
    StorageSortBy,
};
