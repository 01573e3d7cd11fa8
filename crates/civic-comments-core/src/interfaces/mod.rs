// crates/civic-comments-core/src/interfaces/mod.rs
// ============================================================================
// Module: Civic Comments Interfaces
// Description: Backend-agnostic store interfaces for spaces, comments, sessions.
// Purpose: Define the contract surfaces used by the comments controller.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The controller never talks to a database directly. It reads participatory
//! spaces through [`SpaceDirectory`], persists and lists comments through
//! [`CommentStore`], and resolves signed-in users through [`SessionStore`].
//! Fixtures are written through [`FixtureWriter`]. Implementations must fail
//! closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::Comment;
use crate::core::CommentId;
use crate::core::Component;
use crate::core::ComponentId;
use crate::core::ListQuery;
use crate::core::NewComment;
use crate::core::Organization;
use crate::core::OrganizationId;
use crate::core::ParticipatoryProcess;
use crate::core::ProcessId;
use crate::core::Resource;
use crate::core::ResourceId;
use crate::core::User;
use crate::core::UserId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Store errors shared by every backend.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("comments store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("comments store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("comments store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("comments store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("comments store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Space Directory
// ============================================================================

/// Read access to organizations, spaces, commentables, and users.
pub trait SpaceDirectory {
    /// Loads an organization.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError>;

    /// Loads a participatory process.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn process(&self, id: ProcessId) -> Result<Option<ParticipatoryProcess>, StoreError>;

    /// Loads a component.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn component(&self, id: ComponentId) -> Result<Option<Component>, StoreError>;

    /// Loads a commentable resource.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn resource(&self, id: ResourceId) -> Result<Option<Resource>, StoreError>;

    /// Loads a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;
}

// ============================================================================
// SECTION: Comment Store
// ============================================================================

/// Persistence for comments.
pub trait CommentStore {
    /// Persists a new comment and returns it with its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    /// Loads a comment by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails or the row is corrupt.
    fn comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError>;

    /// Lists the comments of a thread rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails or a row is corrupt.
    fn list_comments(&self, root: ResourceId, query: &ListQuery)
    -> Result<Vec<Comment>, StoreError>;

    /// Counts the comments of a thread rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting fails.
    fn count_comments(&self, root: ResourceId) -> Result<u64, StoreError>;
}

// ============================================================================
// SECTION: Session Store
// ============================================================================

/// Session issuance and resolution.
pub trait SessionStore {
    /// Issues a new session token for the user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the user is unknown or the write fails.
    fn issue_session(&self, user_id: UserId, now_ms: u64) -> Result<String, StoreError>;

    /// Resolves a session token to its user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn resolve_session(&self, token: &str) -> Result<Option<UserId>, StoreError>;
}

// ============================================================================
// SECTION: Fixture Writer
// ============================================================================

/// Upserts pre-existing records (seeding and tests).
pub trait FixtureWriter {
    /// Upserts an organization.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn put_organization(&self, organization: &Organization) -> Result<(), StoreError>;

    /// Upserts a participatory process and its participants.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails or the organization is unknown.
    fn put_process(&self, process: &ParticipatoryProcess) -> Result<(), StoreError>;

    /// Upserts a component.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails or the process is unknown.
    fn put_component(&self, component: &Component) -> Result<(), StoreError>;

    /// Upserts a commentable resource.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails or the component is unknown.
    fn put_resource(&self, resource: &Resource) -> Result<(), StoreError>;

    /// Upserts a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails or the organization is unknown.
    fn put_user(&self, user: &User) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Combined Backend
// ============================================================================

/// Every store interface a comments backend provides.
pub trait CommentsBackend:
    SpaceDirectory + CommentStore + SessionStore + FixtureWriter + Send + Sync
{
    /// Reports backend readiness for the health endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
