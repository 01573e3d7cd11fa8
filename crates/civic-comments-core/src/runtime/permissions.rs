// crates/civic-comments-core/src/runtime/permissions.rs
// ============================================================================
// Module: Comment Permissions
// Description: Ordered guards deciding whether a viewer may read or comment.
// Purpose: Provide deterministic, fail-closed permission decisions.
// Dependencies: crate::core, crate::i18n, serde
// ============================================================================

//! ## Overview
//! Permission checks run against a fully resolved [`CommentableContext`]
//! (organization, process, component, root resource, and the parent comment
//! for replies). Guards run in a fixed order and the first failing guard wins:
//!
//! 1. comments disabled on the component
//! 2. private process and the viewer is not a participant
//! 3. (create) comments blocked on the component
//! 4. (create) viewer account not confirmed
//! 5. (create) viewer belongs to another organization
//!
//! ## Invariants
//! - Decisions are pure functions of their inputs.
//! - Create without a viewer is always denied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::Comment;
use crate::core::Component;
use crate::core::Organization;
use crate::core::ParticipatoryProcess;
use crate::core::Resource;
use crate::core::User;
use crate::i18n::Locale;
use crate::t;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Action being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    /// List comments.
    Read,
    /// Post a comment.
    Create,
}

impl CommentAction {
    /// Returns the audit label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
        }
    }
}

/// Reason a permission guard denied the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Comments are disabled on the component.
    CommentsDisabled,
    /// Private process and the viewer is not a participant.
    PrivateSpace,
    /// New comments are blocked on the component.
    CommentsBlocked,
    /// Viewer account is not confirmed.
    UnconfirmedUser,
    /// Viewer belongs to another organization.
    ForeignOrganization,
    /// Create attempted without a signed-in viewer.
    SignInRequired,
}

impl DenialReason {
    /// Returns the stable reason label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CommentsDisabled => "comments_disabled",
            Self::PrivateSpace => "private_space",
            Self::CommentsBlocked => "comments_blocked",
            Self::UnconfirmedUser => "unconfirmed_user",
            Self::ForeignOrganization => "foreign_organization",
            Self::SignInRequired => "sign_in_required",
        }
    }

    /// Returns the localized flash alert for the reason.
    #[must_use]
    pub fn alert(self, locale: Locale) -> String {
        match self {
            Self::CommentsDisabled => t!(locale, "comments.alert.comments_disabled"),
            Self::PrivateSpace => t!(locale, "comments.alert.private_space"),
            Self::CommentsBlocked => t!(locale, "comments.alert.comments_blocked"),
            Self::UnconfirmedUser => t!(locale, "comments.alert.unconfirmed_user"),
            Self::ForeignOrganization => t!(locale, "comments.alert.foreign_organization"),
            Self::SignInRequired => t!(locale, "comments.error.unauthorized"),
        }
    }
}

/// Resolved scope of a commentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentableContext {
    /// Organization hosting the process.
    pub organization: Organization,
    /// Participatory process.
    pub process: ParticipatoryProcess,
    /// Component owning the root resource.
    pub component: Component,
    /// Resource at the root of the thread.
    pub resource: Resource,
    /// Parent comment when the commentable is a comment.
    pub parent: Option<Comment>,
}

impl CommentableContext {
    /// Returns the effective comment body limit.
    #[must_use]
    pub fn max_length(&self) -> u32 {
        self.component
            .settings
            .comments_max_length
            .filter(|limit| *limit > 0)
            .unwrap_or(self.organization.comments_max_length)
    }
}

// ============================================================================
// SECTION: Guards
// ============================================================================

/// Runs the ordered permission guards.
///
/// # Errors
///
/// Returns the [`DenialReason`] of the first failing guard.
pub fn authorize(
    action: CommentAction,
    context: &CommentableContext,
    viewer: Option<&User>,
) -> Result<(), DenialReason> {
    let settings = context.component.settings;
    if !settings.comments_enabled {
        return Err(DenialReason::CommentsDisabled);
    }
    if context.process.is_private()
        && !viewer.is_some_and(|user| context.process.has_participant(user.id))
    {
        return Err(DenialReason::PrivateSpace);
    }
    if action == CommentAction::Read {
        return Ok(());
    }
    let Some(user) = viewer else {
        return Err(DenialReason::SignInRequired);
    };
    if settings.comments_blocked {
        return Err(DenialReason::CommentsBlocked);
    }
    if !user.confirmed {
        return Err(DenialReason::UnconfirmedUser);
    }
    if user.organization_id != context.organization.id {
        return Err(DenialReason::ForeignOrganization);
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
