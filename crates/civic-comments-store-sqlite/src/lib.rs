// crates/civic-comments-store-sqlite/src/lib.rs
// ============================================================================
// Module: Civic Comments SQLite Store
// Description: Durable comments backend for production deployments.
// Purpose: Expose the SQLite store and its configuration types.
// Dependencies: civic-comments-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate persists organizations, spaces, users, sessions, and comments in
//! a single `SQLite` database and implements every store interface of
//! `civic-comments-core`.

mod store;

pub use store::MAX_BODY_BYTES;
pub use store::SqliteCommentsStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
