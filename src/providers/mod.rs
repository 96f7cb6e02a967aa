pub mod fal;
pub mod openai;
pub mod supabase;

mod bootstrap;
mod http;
mod policy;

pub use bootstrap::Providers;
pub use http::CINKBERT_USER_AGENT;
pub use policy::UPSTREAM_BODY_PREVIEW_CHARS;
