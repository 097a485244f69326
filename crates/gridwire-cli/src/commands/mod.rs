//! CLI command implementations.

pub mod catalog;
pub mod common;
pub mod import;
pub mod validate;
pub mod version;
