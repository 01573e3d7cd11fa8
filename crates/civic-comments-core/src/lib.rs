// crates/civic-comments-core/src/lib.rs
// ============================================================================
// Module: Civic Comments Core Library
// Description: Public API surface for the comments core.
// Purpose: Expose domain types, store interfaces, and the comments controller.
// Dependencies: crate::{core, i18n, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Civic comments core lets participants read and post comments on resources
//! living inside components of participatory processes. It is
//! transport-agnostic: the HTTP server and the CLI both drive the same
//! [`CommentsController`] over any backend implementing the store interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod i18n;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use i18n::Locale;
pub use interfaces::CommentStore;
pub use interfaces::CommentsBackend;
pub use interfaces::FixtureWriter;
pub use interfaces::SessionStore;
pub use interfaces::SpaceDirectory;
pub use interfaces::StoreError;
pub use runtime::CommentsController;
pub use runtime::ControllerError;
pub use runtime::CreateOutcome;
pub use runtime::CreateRequest;
pub use runtime::FixtureSet;
pub use runtime::InMemoryCommentsStore;
pub use runtime::IndexOutcome;
pub use runtime::IndexRequest;
pub use runtime::SharedCommentsStore;
