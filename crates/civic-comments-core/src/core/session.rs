// crates/civic-comments-core/src/core/session.rs
// ============================================================================
// Module: Session Tokens
// Description: Opaque bearer tokens identifying signed-in users.
// Purpose: Issue unguessable tokens and derive the fingerprint stores keep.
// Dependencies: base64, rand, sha2
// ============================================================================

//! ## Overview
//! A session token is 32 random bytes encoded as unpadded base64url. Stores
//! only persist the SHA-256 fingerprint, so a leaked database cannot be used
//! to impersonate users.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::hash_bytes;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Random bytes per session token.
const SESSION_TOKEN_BYTES: usize = 32;
/// Maximum accepted session token length.
pub const MAX_SESSION_TOKEN_LENGTH: usize = 256;

// ============================================================================
// SECTION: Tokens
// ============================================================================

/// Generates a fresh session token.
#[must_use]
pub fn new_session_token() -> String {
    let mut bytes = [0_u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Returns the stored fingerprint for a session token.
#[must_use]
pub fn session_fingerprint(token: &str) -> String {
    hash_bytes(DEFAULT_HASH_ALGORITHM, token.as_bytes()).value
}

/// Returns true when the token is structurally acceptable for lookup.
#[must_use]
pub fn is_plausible_session_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_SESSION_TOKEN_LENGTH
        && token.bytes().all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_'))
}
