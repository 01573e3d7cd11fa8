// crates/civic-comments-core/src/runtime/mod.rs
// ============================================================================
// Module: Civic Comments Runtime
// Description: Controller, guards, form validation, and in-memory backend.
// Purpose: Provide the request-handling logic shared by every transport.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime turns untrusted requests into store reads and writes. It holds
//! no transport code; the HTTP crate maps its outcomes onto responses.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod controller;
pub mod fixtures;
pub mod form;
pub mod permissions;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use controller::CommentEntry;
pub use controller::CommentsController;
pub use controller::CommentsPage;
pub use controller::ControllerError;
pub use controller::CreateOutcome;
pub use controller::CreateRequest;
pub use controller::CreatedComment;
pub use controller::FieldError;
pub use controller::IndexOutcome;
pub use controller::IndexRequest;
pub use controller::InvalidComment;
pub use controller::Redirect;
pub use controller::Template;
pub use fixtures::FixtureSet;
pub use fixtures::FixtureSummary;
pub use form::AlignmentInput;
pub use form::CommentForm;
pub use form::FormError;
pub use form::FormLimits;
pub use permissions::CommentAction;
pub use permissions::CommentableContext;
pub use permissions::DenialReason;
pub use store::InMemoryCommentsStore;
pub use store::SharedCommentsStore;
