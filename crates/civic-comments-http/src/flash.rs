// crates/civic-comments-http/src/flash.rs
// ============================================================================
// Module: Flash Messages
// Description: One-shot alert messages carried in a cookie across a redirect.
// Purpose: Surface guard rejections to the page the viewer returns to.
// Dependencies: base64, serde, serde_json
// ============================================================================

//! ## Overview
//! A flash is a `{ "alert": "..." }` JSON object, base64url encoded into the
//! `flash` cookie on the redirect response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde::Serialize;

use crate::auth::cookie_value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Flash cookie name.
pub const FLASH_COOKIE: &str = "flash";
/// Maximum encoded flash size accepted when decoding.
const MAX_FLASH_BYTES: usize = 4 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Flash payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    /// Alert shown to the viewer.
    pub alert: String,
}

impl FlashMessage {
    /// Creates an alert flash.
    #[must_use]
    pub fn alert(alert: impl Into<String>) -> Self {
        Self {
            alert: alert.into(),
        }
    }

    /// Encodes the flash as a cookie value.
    #[must_use]
    pub fn encode(&self) -> String {
        let payload = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(payload)
    }

    /// Returns the `Set-Cookie` header value for the flash.
    #[must_use]
    pub fn set_cookie(&self) -> String {
        format!("{FLASH_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.encode())
    }

    /// Decodes a cookie value.
    #[must_use]
    pub fn decode(value: &str) -> Option<Self> {
        if value.len() > MAX_FLASH_BYTES {
            return None;
        }
        let bytes = URL_SAFE_NO_PAD.decode(value.as_bytes()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Reads the flash from a `Set-Cookie` or `Cookie` header value.
    #[must_use]
    pub fn from_cookie_header(header: &str) -> Option<Self> {
        cookie_value(header, FLASH_COOKIE).and_then(Self::decode)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cookie_carries_decodable_alert() {
        let flash = FlashMessage::alert("Comments are disabled for this component.");
        let header = flash.set_cookie();
        assert!(header.starts_with("flash="));
        assert_eq!(FlashMessage::from_cookie_header(&header), Some(flash));
    }

    #[test]
    fn garbage_is_ignored() {
        assert_eq!(FlashMessage::decode("%%%"), None);
        assert_eq!(FlashMessage::decode(&"a".repeat(MAX_FLASH_BYTES + 1)), None);
    }
}
