// crates/civic-comments-config/src/lib.rs
// ============================================================================
// Module: Civic Comments Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for civic-comments.toml semantics.
// Dependencies: civic-comments-core, civic-comments-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `civic-comments-config` defines the configuration model shared by the HTTP
//! server and the CLI. Loading is strict and fail-closed: oversized files,
//! unknown backends, and inconsistent store settings are rejected.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
