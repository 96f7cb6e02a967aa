pub mod auth;
pub mod catalog;
pub mod gallery;
pub mod predictions;
pub mod train;
pub mod translate;
