// crates/civic-comments-core/src/core/identifiers.rs
// ============================================================================
// Module: Civic Comments Identifiers
// Description: Canonical numeric identifiers for spaces, resources, and comments.
// Purpose: Provide strongly typed, serializable IDs with stable integer forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every persisted record is addressed by a positive integer identifier.
//! Identifiers serialize as plain integers and are never mixed across record
//! kinds: a [`ResourceId`] cannot be passed where a [`CommentId`] is expected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares a transparent `u64` identifier newtype.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from its raw value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

numeric_id!(
    /// Organization identifier (the tenant hosting participatory spaces).
    OrganizationId
);

numeric_id!(
    /// Participatory process identifier.
    ProcessId
);

numeric_id!(
    /// Component identifier within a participatory process.
    ComponentId
);

numeric_id!(
    /// Commentable resource identifier within a component.
    ResourceId
);

numeric_id!(
    /// Registered user identifier.
    UserId
);

numeric_id!(
    /// Comment identifier.
    CommentId
);
