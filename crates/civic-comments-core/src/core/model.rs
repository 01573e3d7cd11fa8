// crates/civic-comments-core/src/core/model.rs
// ============================================================================
// Module: Civic Comments Domain Model
// Description: Organizations, participatory spaces, commentables, and comments.
// Purpose: Define the records the comments controller reads and writes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Organizations host participatory processes; processes contain components;
//! components own commentable resources. Comments attach either to a resource
//! or to another comment (a reply), and always remember the resource at the
//! root of their thread.
//!
//! Everything except [`Comment`] is a pre-existing fixture from the point of
//! view of this service.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::alignment::Alignment;
use crate::core::identifiers::CommentId;
use crate::core::identifiers::ComponentId;
use crate::core::identifiers::OrganizationId;
use crate::core::identifiers::ProcessId;
use crate::core::identifiers::ResourceId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum comment body length (characters) for an organization.
pub const DEFAULT_COMMENTS_MAX_LENGTH: u32 = 1_000;
/// Maximum reply depth below the root commentable.
pub const MAX_COMMENT_DEPTH: u32 = 3;

// ============================================================================
// SECTION: Spaces
// ============================================================================

/// Organization hosting participatory processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization identifier.
    pub id: OrganizationId,
    /// Display name.
    pub name: String,
    /// Locale used when the viewer has no locale of their own.
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Organization-wide comment body limit.
    #[serde(default = "default_comments_max_length")]
    pub comments_max_length: u32,
}

/// Visibility of a participatory process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessVisibility {
    /// Anyone can read; any confirmed member of the organization can comment.
    #[default]
    Public,
    /// Only assigned participants can read and comment.
    Private,
}

impl ProcessVisibility {
    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    /// Parses a canonical label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// Participatory process inside an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipatoryProcess {
    /// Process identifier.
    pub id: ProcessId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// URL slug.
    pub slug: String,
    /// Process visibility.
    #[serde(default)]
    pub visibility: ProcessVisibility,
    /// Users assigned to the process (meaningful for private processes).
    #[serde(default)]
    pub participants: BTreeSet<UserId>,
}

impl ParticipatoryProcess {
    /// Returns true when the process is private.
    #[must_use]
    pub const fn is_private(&self) -> bool {
        matches!(self.visibility, ProcessVisibility::Private)
    }

    /// Returns true when the user is assigned to the process.
    #[must_use]
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participants.contains(&user_id)
    }
}

/// Comment-related settings of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSettings {
    /// Whether comments are shown and accepted at all.
    #[serde(default = "default_true")]
    pub comments_enabled: bool,
    /// Whether new comments are temporarily refused (existing ones stay visible).
    #[serde(default)]
    pub comments_blocked: bool,
    /// Optional override of the organization comment body limit.
    #[serde(default)]
    pub comments_max_length: Option<u32>,
}

impl Default for ComponentSettings {
    fn default() -> Self {
        Self {
            comments_enabled: true,
            comments_blocked: false,
            comments_max_length: None,
        }
    }
}

/// Feature module attached to a participatory process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Component identifier.
    pub id: ComponentId,
    /// Owning participatory process.
    pub process_id: ProcessId,
    /// Component name.
    pub name: String,
    /// Comment settings.
    #[serde(default)]
    pub settings: ComponentSettings,
}

/// Commentable resource owned by a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier.
    pub id: ResourceId,
    /// Owning component.
    pub component_id: ComponentId,
    /// Resource title.
    pub title: String,
}

/// Registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Organization the account belongs to.
    pub organization_id: OrganizationId,
    /// Public display name.
    pub name: String,
    /// Preferred locale.
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Whether the account email is confirmed.
    #[serde(default)]
    pub confirmed: bool,
}

// ============================================================================
// SECTION: Comments
// ============================================================================

/// Text keyed by locale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    /// Creates a localized text holding a single translation.
    #[must_use]
    pub fn new(locale: impl Into<String>, text: impl Into<String>) -> Self {
        let mut values = BTreeMap::new();
        values.insert(locale.into(), text.into());
        Self(values)
    }

    /// Returns the translation for the locale, if present.
    #[must_use]
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    /// Returns the translation for the locale, falling back to any translation.
    #[must_use]
    pub fn translated(&self, locale: &str) -> Option<&str> {
        self.get(locale).or_else(|| self.first())
    }

    /// Returns the first translation in locale order.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }

    /// Returns true when no translation is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Polymorphic reference to something that can receive comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum CommentableRef {
    /// A component resource.
    Resource(ResourceId),
    /// Another comment (reply).
    Comment(CommentId),
}

impl CommentableRef {
    /// Returns the stored type label.
    #[must_use]
    pub const fn type_label(self) -> &'static str {
        match self {
            Self::Resource(_) => "resource",
            Self::Comment(_) => "comment",
        }
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn raw_id(self) -> u64 {
        match self {
            Self::Resource(id) => id.get(),
            Self::Comment(id) => id.get(),
        }
    }

    /// Rebuilds a reference from its stored type label and identifier.
    #[must_use]
    pub fn from_parts(type_label: &str, id: u64) -> Option<Self> {
        match type_label {
            "resource" => Some(Self::Resource(ResourceId::new(id))),
            "comment" => Some(Self::Comment(CommentId::new(id))),
            _ => None,
        }
    }
}

/// Persisted comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier.
    pub id: CommentId,
    /// Direct commentable (resource or parent comment).
    pub commentable: CommentableRef,
    /// Resource at the root of the thread.
    pub root_commentable: ResourceId,
    /// Parent comment for replies.
    pub parent_id: Option<CommentId>,
    /// Depth below the root commentable (0 for top-level comments).
    pub depth: u32,
    /// Author of the comment.
    pub author_id: UserId,
    /// Localized comment body.
    pub body: LocalizedText,
    /// Author stance.
    pub alignment: Alignment,
    /// Creation time in milliseconds since the unix epoch.
    pub created_at_ms: u64,
}

/// Comment payload before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    /// Direct commentable (resource or parent comment).
    pub commentable: CommentableRef,
    /// Resource at the root of the thread.
    pub root_commentable: ResourceId,
    /// Parent comment for replies.
    pub parent_id: Option<CommentId>,
    /// Depth below the root commentable.
    pub depth: u32,
    /// Author of the comment.
    pub author_id: UserId,
    /// Localized comment body.
    pub body: LocalizedText,
    /// Author stance.
    pub alignment: Alignment,
    /// Creation time in milliseconds since the unix epoch.
    pub created_at_ms: u64,
}

impl NewComment {
    /// Attaches the store-assigned identifier.
    #[must_use]
    pub fn into_comment(self, id: CommentId) -> Comment {
        Comment {
            id,
            commentable: self.commentable,
            root_commentable: self.root_commentable,
            parent_id: self.parent_id,
            depth: self.depth,
            author_id: self.author_id,
            body: self.body,
            alignment: self.alignment,
            created_at_ms: self.created_at_ms,
        }
    }
}

// ============================================================================
// SECTION: Listing
// ============================================================================

/// Ordering of comment listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentOrder {
    /// Oldest first.
    #[default]
    Older,
    /// Newest first.
    Recent,
}

impl CommentOrder {
    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Older => "older",
            Self::Recent => "recent",
        }
    }

    /// Parses an order label, falling back to [`CommentOrder::Older`].
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("recent") => Self::Recent,
            _ => Self::Older,
        }
    }
}

/// Listing query for the comments of a root commentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListQuery {
    /// Result ordering.
    pub order: CommentOrder,
    /// Only return comments with an identifier greater than this one.
    pub after: Option<CommentId>,
    /// Optional cap on returned comments.
    pub limit: Option<usize>,
}

// ============================================================================
// SECTION: Serde Defaults
// ============================================================================

/// Default locale for fixtures that omit one.
fn default_locale() -> String {
    "en".to_string()
}

/// Default organization comment length limit.
const fn default_comments_max_length() -> u32 {
    DEFAULT_COMMENTS_MAX_LENGTH
}

/// Serde helper for flags that default to true.
const fn default_true() -> bool {
    true
}
