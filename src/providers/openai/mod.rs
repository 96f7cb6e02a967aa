mod client;

pub use client::OpenaiClient;

pub const OPENAI_PROVIDER: &str = "openai";
