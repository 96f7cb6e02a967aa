//! SQL DDL for initializing the database schema.

/// SQLite schema includes:
/// - `user_models` table (one trained LoRA per row, addressed by a catalog-wide `url_id`)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- User-trained models
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS user_models (
    id TEXT PRIMARY KEY NOT NULL, -- uuid v4
    user_id TEXT NOT NULL,
    url_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    provider_model_id TEXT NOT NULL,
    subject_type TEXT NOT NULL,
    supports_file_upload INTEGER NOT NULL DEFAULT 0,
    is_custom INTEGER NOT NULL DEFAULT 1,
    lora_path TEXT NULL,
    trigger_word TEXT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_user_models_user_id ON user_models(user_id);
"#;
