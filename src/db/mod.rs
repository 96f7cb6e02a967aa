//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `actor.rs`: the single owner of the connection pool

pub mod actor;
pub mod models;
pub mod schema;

pub use models::{DbUserModel, UserModelCreate};
pub use schema::SQLITE_INIT;

pub use actor::{DbActorHandle, spawn};
