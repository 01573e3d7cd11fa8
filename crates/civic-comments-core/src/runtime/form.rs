// crates/civic-comments-core/src/runtime/form.rs
// ============================================================================
// Module: Comment Form
// Description: Submitted comment payload and its validation rules.
// Purpose: Turn untrusted form input into a body, alignment, and depth.
// Dependencies: crate::core, crate::i18n, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The create action receives `{ commentable_gid, body, alignment }`. The form
//! accepts alignments as integers or numeric strings (a missing alignment is
//! neutral) and collects every validation failure instead of stopping at the
//! first one, so the error view can show them all.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::Alignment;
use crate::core::MAX_COMMENT_DEPTH;
use crate::i18n::Locale;
use crate::t;

// ============================================================================
// SECTION: Input
// ============================================================================

/// Raw alignment as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlignmentInput {
    /// JSON integer.
    Integer(i64),
    /// String value (HTML forms submit strings).
    Text(String),
    /// Any other JSON value (always invalid).
    Other(Value),
}

impl AlignmentInput {
    /// Resolves the input to an alignment.
    ///
    /// # Errors
    ///
    /// Returns the submitted value rendered as text when it is not -1, 0, or 1.
    pub fn resolve(&self) -> Result<Alignment, String> {
        match self {
            Self::Integer(value) => Alignment::from_value(*value).ok_or_else(|| value.to_string()),
            Self::Text(text) => Alignment::parse(text).ok_or_else(|| text.clone()),
            Self::Other(value) => Err(value.to_string()),
        }
    }
}

impl From<i64> for AlignmentInput {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Comment form as posted under the `comment` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentForm {
    /// Signed global id of the commentable.
    #[serde(default)]
    pub commentable_gid: String,
    /// Comment body.
    #[serde(default)]
    pub body: Option<String>,
    /// Author alignment.
    #[serde(default)]
    pub alignment: Option<AlignmentInput>,
}

/// Limits the form is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormLimits {
    /// Effective maximum body length in characters.
    pub max_length: u32,
    /// Depth of the parent comment when replying.
    pub parent_depth: Option<u32>,
}

/// Validated form values ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedComment {
    /// Comment body.
    pub body: String,
    /// Author alignment.
    pub alignment: Alignment,
    /// Depth of the new comment.
    pub depth: u32,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Comment form validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Body missing or blank.
    #[error("body is missing")]
    BodyMissing,
    /// Body longer than the effective limit.
    #[error("body is too long ({actual} > {max})")]
    BodyTooLong {
        /// Effective limit in characters.
        max: u32,
        /// Submitted length in characters.
        actual: usize,
    },
    /// Alignment outside `{-1, 0, 1}`.
    #[error("alignment is invalid: {value}")]
    AlignmentInvalid {
        /// Submitted value rendered as text.
        value: String,
    },
    /// Reply nested deeper than allowed.
    #[error("reply depth exceeds {max}")]
    DepthExceeded {
        /// Maximum depth.
        max: u32,
    },
}

impl FormError {
    /// Returns the stable field the error belongs to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::BodyMissing | Self::BodyTooLong { .. } => "body",
            Self::AlignmentInvalid { .. } => "alignment",
            Self::DepthExceeded { .. } => "commentable_gid",
        }
    }

    /// Returns the stable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BodyMissing => "body_missing",
            Self::BodyTooLong { .. } => "body_too_long",
            Self::AlignmentInvalid { .. } => "alignment_invalid",
            Self::DepthExceeded { .. } => "depth_exceeded",
        }
    }

    /// Returns the localized message.
    #[must_use]
    pub fn message(&self, locale: Locale) -> String {
        match self {
            Self::BodyMissing => t!(locale, "comments.error.body_missing"),
            Self::BodyTooLong { max, .. } => t!(locale, "comments.error.body_too_long", max = max),
            Self::AlignmentInvalid { value } => {
                t!(locale, "comments.error.alignment_invalid", value = value)
            }
            Self::DepthExceeded { max } => t!(locale, "comments.error.depth_exceeded", max = max),
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

impl CommentForm {
    /// Validates the form, collecting every failure.
    ///
    /// # Errors
    ///
    /// Returns all [`FormError`]s found when the form is invalid.
    pub fn validate(&self, limits: FormLimits) -> Result<ValidatedComment, Vec<FormError>> {
        let mut errors = Vec::new();

        let body = self.body.as_deref().unwrap_or_default();
        if body.trim().is_empty() {
            errors.push(FormError::BodyMissing);
        } else {
            let actual = body.chars().count();
            if actual > usize::try_from(limits.max_length).unwrap_or(usize::MAX) {
                errors.push(FormError::BodyTooLong {
                    max: limits.max_length,
                    actual,
                });
            }
        }

        let alignment = match &self.alignment {
            None => Alignment::Neutral,
            Some(input) => input.resolve().unwrap_or_else(|value| {
                errors.push(FormError::AlignmentInvalid {
                    value,
                });
                Alignment::Neutral
            }),
        };

        let depth = limits.parent_depth.map_or(0, |parent| parent.saturating_add(1));
        if depth > MAX_COMMENT_DEPTH {
            errors.push(FormError::DepthExceeded {
                max: MAX_COMMENT_DEPTH,
            });
        }

        if errors.is_empty() {
            Ok(ValidatedComment {
                body: body.to_string(),
                alignment,
                depth,
            })
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
