//! fal.ai queue and storage client.
//!
//! Every model call goes through the queue: submit, poll the status URL at a fixed
//! interval, then fetch the response URL. Storage uploads use the two-step
//! initiate/PUT protocol and return a public file URL usable as model input.

mod client;
mod storage;

pub use client::{FalClient, FalJob};

pub const FAL_PROVIDER: &str = "fal";
