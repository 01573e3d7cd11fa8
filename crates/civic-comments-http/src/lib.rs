// crates/civic-comments-http/src/lib.rs
// ============================================================================
// Module: Civic Comments HTTP Library
// Description: HTTP surface for the comments controller.
// Purpose: Route comment actions, authenticate viewers, and render outcomes.
// Dependencies: civic-comments-core, civic-comments-config, axum, tokio
// ============================================================================

//! ## Overview
//! The HTTP crate turns [`civic_comments_core::CommentsController`] outcomes
//! into responses: JSON views with an `x-rendered-template` header, redirects
//! carrying a flash cookie, and plain error statuses for unauthenticated
//! posts and unresolvable commentables.
//! Security posture: request headers and bodies are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod flash;
pub mod server;
pub mod views;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use flash::FlashMessage;
pub use server::CommentsServer;
pub use server::ServerError;
pub use server::build_signer;
pub use server::build_store;
