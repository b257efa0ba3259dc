//! Document Module
//!
//! JSON documents kept next to a store by its callers.
//!
//! `JsonDocument<T>` handles loading, saving and remembering where a
//! document came from; the concrete fields live in plain structs such as
//! `DbConfig`. The core storage layer does not read these documents.

mod db_config;
mod json;
mod permission;

pub use db_config::DbConfig;
pub use json::JsonDocument;
pub use permission::AccessPermission;
