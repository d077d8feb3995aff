//! Database module: models, schema and queries for the registration store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows plus write-side inputs
//! - `schema.rs`: SQL DDL and the column backfill list (SQLite)
//! - `sqlite.rs`: pool setup and schema initialization
//! - `users.rs`, `visitors.rs`, `media.rs`: queries per table group
//!
//! Reads always filter on `deleted_at IS NULL`; deletes only set it.

pub mod media;
pub mod models;
pub mod schema;
pub mod sqlite;
pub mod users;
pub mod visitors;

pub use models::{Role, Scope, User, Visitor};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, Storage, connect};
