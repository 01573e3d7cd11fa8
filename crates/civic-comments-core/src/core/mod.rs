// crates/civic-comments-core/src/core/mod.rs
// ============================================================================
// Module: Civic Comments Core Types
// Description: Canonical comment, space, and identifier types.
// Purpose: Provide stable, serializable types shared by every surface.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types are the single source of truth for the HTTP surface, the CLI,
//! and every store backend.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod alignment;
pub mod global_id;
pub mod hashing;
pub mod identifiers;
pub mod model;
pub mod session;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use alignment::Alignment;
pub use alignment::AlignmentError;
pub use global_id::GlobalId;
pub use global_id::GlobalIdError;
pub use global_id::GlobalIdSigner;
pub use global_id::GlobalModel;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use identifiers::CommentId;
pub use identifiers::ComponentId;
pub use identifiers::OrganizationId;
pub use identifiers::ProcessId;
pub use identifiers::ResourceId;
pub use identifiers::UserId;
pub use model::Comment;
pub use model::CommentOrder;
pub use model::CommentableRef;
pub use model::Component;
pub use model::ComponentSettings;
pub use model::DEFAULT_COMMENTS_MAX_LENGTH;
pub use model::ListQuery;
pub use model::LocalizedText;
pub use model::MAX_COMMENT_DEPTH;
pub use model::NewComment;
pub use model::Organization;
pub use model::ParticipatoryProcess;
pub use model::ProcessVisibility;
pub use model::Resource;
pub use model::User;
