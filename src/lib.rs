pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod providers;
pub mod server;
pub mod service;
pub(crate) mod utils;

pub use error::CinkbertError;
