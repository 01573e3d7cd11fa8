// crates/civic-comments-core/src/core/alignment.rs
// ============================================================================
// Module: Comment Alignment
// Description: Three-valued stance indicator attached to every comment.
// Purpose: Restrict stored alignments to against (-1), neutral (0), favor (1).
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A comment author declares a stance towards the commentable: against,
//! neutral, or in favor. The stance serializes as the integers `-1`, `0`, and
//! `1`; any other integer is rejected at the type boundary so an invalid
//! alignment can never reach a store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Alignment
// ============================================================================

/// Stance of a comment towards its commentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Alignment {
    /// Against the commentable (`-1`).
    Against,
    /// Neutral stance (`0`).
    #[default]
    Neutral,
    /// In favor of the commentable (`1`).
    InFavor,
}

impl Alignment {
    /// All alignments in ascending numeric order.
    pub const ALL: [Self; 3] = [Self::Against, Self::Neutral, Self::InFavor];

    /// Returns the stored integer value.
    #[must_use]
    pub const fn value(self) -> i64 {
        match self {
            Self::Against => -1,
            Self::Neutral => 0,
            Self::InFavor => 1,
        }
    }

    /// Returns the alignment for a stored integer value.
    #[must_use]
    pub const fn from_value(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Self::Against),
            0 => Some(Self::Neutral),
            1 => Some(Self::InFavor),
            _ => None,
        }
    }

    /// Parses a textual alignment such as a form or query parameter.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        text.trim().parse::<i64>().ok().and_then(Self::from_value)
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value().fmt(f)
    }
}

impl TryFrom<i64> for Alignment {
    type Error = AlignmentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or(AlignmentError::OutOfRange(value))
    }
}

impl From<Alignment> for i64 {
    fn from(value: Alignment) -> Self {
        value.value()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Alignment conversion errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    /// Value outside the allowed `{-1, 0, 1}` range.
    #[error("alignment must be -1, 0 or 1 (got {0})")]
    OutOfRange(i64),
}
