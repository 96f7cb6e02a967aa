//! Request-level workflows. Each one validates its input, calls upstream services
//! in order and returns a response body; none of them retries.

pub mod gallery;
pub mod generation;
pub mod training;
pub mod translation;
