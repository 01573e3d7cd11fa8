// crates/civic-comments-core/src/core/global_id.rs
// ============================================================================
// Module: Signed Global Identifiers
// Description: `gid://` URIs for commentables and their ed25519-signed form.
// Purpose: Reference persisted records from clients without exposing raw IDs.
// Dependencies: base64, ed25519-dalek, rand, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`GlobalId`] names a record as `gid://<app>/<Model>/<id>`. Clients never
//! see bare global ids: the server hands out signed tokens of the form
//! `base64url(payload) "." base64url(signature)` where the payload carries the
//! gid, a purpose, and an optional expiry. [`GlobalIdSigner::locate_signed`]
//! reverses the process and fails closed on any tampering, expiry, purpose or
//! application mismatch, and unknown model.
//!
//! Security posture: signed tokens arrive from untrusted clients. Verification
//! uses strict ed25519 checks and bounds token size before decoding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::Signature;
use ed25519_dalek::Signer;
use ed25519_dalek::SigningKey;
use ed25519_dalek::VerifyingKey;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::CommentId;
use crate::core::identifiers::ResourceId;
use crate::core::model::CommentableRef;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default application segment of global ids.
pub const DEFAULT_APP: &str = "civic-comments";
/// Purpose embedded in tokens handed out for commentables.
pub const DEFAULT_PURPOSE: &str = "default";
/// Maximum accepted signed token length in bytes.
pub const MAX_SIGNED_GID_BYTES: usize = 4 * 1024;
/// URI scheme prefix.
const GID_SCHEME: &str = "gid://";
/// Separator between the payload and signature segments.
const TOKEN_SEPARATOR: char = '.';
/// Length of an ed25519 secret key in bytes.
const SIGNING_KEY_LEN: usize = 32;

// ============================================================================
// SECTION: Global Id
// ============================================================================

/// Record kinds addressable through a global id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalModel {
    /// Commentable resource.
    DummyResource,
    /// Comment (replies are attached to comments).
    Comment,
}

impl GlobalModel {
    /// Returns the model segment used in URIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DummyResource => "DummyResource",
            Self::Comment => "Comment",
        }
    }

    /// Parses a model segment.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DummyResource" => Some(Self::DummyResource),
            "Comment" => Some(Self::Comment),
            _ => None,
        }
    }
}

impl fmt::Display for GlobalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unsigned global identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalId {
    /// Application segment.
    pub app: String,
    /// Record kind.
    pub model: GlobalModel,
    /// Record identifier.
    pub id: u64,
}

impl GlobalId {
    /// Creates a global id.
    #[must_use]
    pub fn new(app: impl Into<String>, model: GlobalModel, id: u64) -> Self {
        Self {
            app: app.into(),
            model,
            id,
        }
    }

    /// Creates the global id addressing a commentable.
    #[must_use]
    pub fn for_commentable(app: impl Into<String>, commentable: CommentableRef) -> Self {
        match commentable {
            CommentableRef::Resource(id) => Self::new(app, GlobalModel::DummyResource, id.get()),
            CommentableRef::Comment(id) => Self::new(app, GlobalModel::Comment, id.get()),
        }
    }

    /// Returns the commentable this id addresses.
    #[must_use]
    pub const fn commentable(&self) -> CommentableRef {
        match self.model {
            GlobalModel::DummyResource => CommentableRef::Resource(ResourceId::new(self.id)),
            GlobalModel::Comment => CommentableRef::Comment(CommentId::new(self.id)),
        }
    }

    /// Formats the id as a `gid://` URI.
    #[must_use]
    pub fn to_uri(&self) -> String {
        format!("{GID_SCHEME}{}/{}/{}", self.app, self.model, self.id)
    }

    /// Parses a `gid://<app>/<Model>/<id>` URI.
    ///
    /// # Errors
    ///
    /// Returns [`GlobalIdError`] when the URI is malformed or names an unknown
    /// model.
    pub fn parse(uri: &str) -> Result<Self, GlobalIdError> {
        let rest = uri
            .strip_prefix(GID_SCHEME)
            .ok_or_else(|| GlobalIdError::Malformed("missing gid:// scheme".to_string()))?;
        let mut segments = rest.split('/');
        let (Some(app), Some(model), Some(id), None) =
            (segments.next(), segments.next(), segments.next(), segments.next())
        else {
            return Err(GlobalIdError::Malformed("expected app/model/id segments".to_string()));
        };
        if app.is_empty() {
            return Err(GlobalIdError::Malformed("empty app segment".to_string()));
        }
        let model =
            GlobalModel::parse(model).ok_or_else(|| GlobalIdError::UnknownModel(model.to_string()))?;
        let id = id
            .parse::<u64>()
            .map_err(|_| GlobalIdError::Malformed(format!("invalid id segment: {id}")))?;
        Ok(Self::new(app, model, id))
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Global id parsing and verification errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlobalIdError {
    /// Token or URI structure is invalid.
    #[error("malformed global id: {0}")]
    Malformed(String),
    /// Signature verification failed.
    #[error("global id signature verification failed")]
    InvalidSignature,
    /// Token was issued for another purpose.
    #[error("global id purpose mismatch: {0}")]
    PurposeMismatch(String),
    /// Token expiry has passed.
    #[error("global id expired at {0}")]
    Expired(u64),
    /// Global id belongs to another application.
    #[error("global id app mismatch: {0}")]
    AppMismatch(String),
    /// Model segment is not addressable.
    #[error("unknown global id model: {0}")]
    UnknownModel(String),
    /// Signing key could not be loaded.
    #[error("invalid signing key: {0}")]
    Key(String),
    /// Payload could not be encoded.
    #[error("global id encoding failed: {0}")]
    Encoding(String),
}

// ============================================================================
// SECTION: Signer
// ============================================================================

/// Signed token payload.
#[derive(Debug, Serialize, Deserialize)]
struct SignedPayload {
    /// Global id URI.
    gid: String,
    /// Token purpose.
    purpose: String,
    /// Optional expiry in unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at_ms: Option<u64>,
}

/// Issues and verifies signed global id tokens.
///
/// # Invariants
/// - Tokens are only located when signed by this signer's key.
/// - Located ids always carry this signer's application segment.
#[derive(Clone)]
pub struct GlobalIdSigner {
    /// Application segment used for issued ids.
    app: String,
    /// Secret key used for signing.
    signing_key: SigningKey,
    /// Optional token lifetime in milliseconds.
    expires_in_ms: Option<u64>,
}

impl fmt::Debug for GlobalIdSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalIdSigner")
            .field("app", &self.app)
            .field("expires_in_ms", &self.expires_in_ms)
            .finish_non_exhaustive()
    }
}

impl GlobalIdSigner {
    /// Creates a signer for the application with the provided key.
    #[must_use]
    pub fn new(app: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            app: app.into(),
            signing_key,
            expires_in_ms: None,
        }
    }

    /// Creates a signer with a freshly generated key.
    #[must_use]
    pub fn ephemeral(app: impl Into<String>) -> Self {
        let mut secret = [0_u8; SIGNING_KEY_LEN];
        OsRng.fill_bytes(&mut secret);
        Self::new(app, SigningKey::from_bytes(&secret))
    }

    /// Sets the lifetime of issued tokens.
    #[must_use]
    pub const fn with_expiry(mut self, expires_in_ms: Option<u64>) -> Self {
        self.expires_in_ms = expires_in_ms;
        self
    }

    /// Returns the application segment.
    #[must_use]
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Returns the public verification key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Builds a global id in this signer's application.
    #[must_use]
    pub fn global_id(&self, model: GlobalModel, id: u64) -> GlobalId {
        GlobalId::new(self.app.clone(), model, id)
    }

    /// Signs a global id for the default purpose.
    ///
    /// # Errors
    ///
    /// Returns [`GlobalIdError::Encoding`] when the payload cannot be serialized.
    pub fn sign(&self, gid: &GlobalId, now_ms: u64) -> Result<String, GlobalIdError> {
        self.sign_for(gid, DEFAULT_PURPOSE, now_ms)
    }

    /// Signs a global id for an explicit purpose.
    ///
    /// # Errors
    ///
    /// Returns [`GlobalIdError::Encoding`] when the payload cannot be serialized.
    fn sign_for(
        &self,
        gid: &GlobalId,
        purpose: &str,
        now_ms: u64,
    ) -> Result<String, GlobalIdError> {
        let payload = SignedPayload {
            gid: gid.to_uri(),
            purpose: purpose.to_string(),
            expires_at_ms: self.expires_in_ms.map(|ttl| now_ms.saturating_add(ttl)),
        };
        let json =
            serde_json::to_vec(&payload).map_err(|err| GlobalIdError::Encoding(err.to_string()))?;
        let encoded = URL_SAFE_NO_PAD.encode(json);
        let signature = self.signing_key.sign(encoded.as_bytes());
        Ok(format!(
            "{encoded}{TOKEN_SEPARATOR}{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    /// Verifies a signed token for the default purpose and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`GlobalIdError`] when the token is malformed, tampered with,
    /// expired, issued for another purpose or application, or names an unknown
    /// model.
    pub fn locate_signed(&self, token: &str, now_ms: u64) -> Result<GlobalId, GlobalIdError> {
        self.locate_signed_for(token, DEFAULT_PURPOSE, now_ms)
    }

    /// Verifies a signed token for an explicit purpose and returns its id.
    ///
    /// # Errors
    ///
    /// See [`GlobalIdSigner::locate_signed`].
    fn locate_signed_for(
        &self,
        token: &str,
        purpose: &str,
        now_ms: u64,
    ) -> Result<GlobalId, GlobalIdError> {
        if token.len() > MAX_SIGNED_GID_BYTES {
            return Err(GlobalIdError::Malformed("token exceeds size limit".to_string()));
        }
        let (encoded, signature) = token
            .trim()
            .split_once(TOKEN_SEPARATOR)
            .ok_or_else(|| GlobalIdError::Malformed("missing signature segment".to_string()))?;
        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| GlobalIdError::Malformed("signature is not base64url".to_string()))?;
        let signature = Signature::from_slice(&signature_bytes)
            .map_err(|_| GlobalIdError::InvalidSignature)?;
        self.verifying_key()
            .verify_strict(encoded.as_bytes(), &signature)
            .map_err(|_| GlobalIdError::InvalidSignature)?;
        let json = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| GlobalIdError::Malformed("payload is not base64url".to_string()))?;
        let payload: SignedPayload = serde_json::from_slice(&json)
            .map_err(|err| GlobalIdError::Malformed(err.to_string()))?;
        if payload.purpose != purpose {
            return Err(GlobalIdError::PurposeMismatch(payload.purpose));
        }
        if let Some(expires_at_ms) = payload.expires_at_ms
            && now_ms >= expires_at_ms
        {
            return Err(GlobalIdError::Expired(expires_at_ms));
        }
        let gid = GlobalId::parse(&payload.gid)?;
        if gid.app != self.app {
            return Err(GlobalIdError::AppMismatch(gid.app));
        }
        Ok(gid)
    }
}

// ============================================================================
// SECTION: Key Loading
// ============================================================================

/// Parses an ed25519 signing key from 32 raw bytes or base64 text.
///
/// # Errors
///
/// Returns [`GlobalIdError::Key`] when the bytes are neither form.
pub fn parse_signing_key(bytes: &[u8]) -> Result<SigningKey, GlobalIdError> {
    if let Ok(key) = <[u8; SIGNING_KEY_LEN]>::try_from(bytes) {
        return Ok(SigningKey::from_bytes(&key));
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|_| GlobalIdError::Key("key is neither raw bytes nor text".to_string()))?;
    let decoded = STANDARD
        .decode(text.trim().as_bytes())
        .map_err(|_| GlobalIdError::Key("key text is not base64".to_string()))?;
    let key = <[u8; SIGNING_KEY_LEN]>::try_from(decoded.as_slice())
        .map_err(|_| GlobalIdError::Key(format!("decoded key must be {SIGNING_KEY_LEN} bytes")))?;
    Ok(SigningKey::from_bytes(&key))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    fn signer() -> GlobalIdSigner {
        GlobalIdSigner::new(DEFAULT_APP, SigningKey::from_bytes(&[7_u8; 32]))
    }

    #[test]
    fn uri_round_trips_through_parse() {
        let gid = GlobalId::new(DEFAULT_APP, GlobalModel::DummyResource, 42);
        assert_eq!(gid.to_uri(), "gid://civic-comments/DummyResource/42");
        assert_eq!(GlobalId::parse(&gid.to_uri()).unwrap(), gid);
    }

    #[test]
    fn parse_rejects_extra_segments() {
        let err = GlobalId::parse("gid://civic-comments/Comment/1/2").unwrap_err();
        assert!(matches!(err, GlobalIdError::Malformed(_)));
    }

    #[test]
    fn parse_rejects_unknown_model() {
        let err = GlobalId::parse("gid://civic-comments/Proposal/1").unwrap_err();
        assert_eq!(err, GlobalIdError::UnknownModel("Proposal".to_string()));
    }

    #[test]
    fn signed_token_locates_original_id() {
        let signer = signer();
        let gid = signer.global_id(GlobalModel::Comment, 9);
        let token = signer.sign(&gid, 0).unwrap();
        assert_eq!(signer.locate_signed(&token, 0).unwrap(), gid);
    }

    #[test]
    fn token_from_other_key_is_rejected() {
        let other = GlobalIdSigner::new(DEFAULT_APP, SigningKey::from_bytes(&[8_u8; 32]));
        let token = other.sign(&other.global_id(GlobalModel::DummyResource, 1), 0).unwrap();
        assert_eq!(signer().locate_signed(&token, 0).unwrap_err(), GlobalIdError::InvalidSignature);
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = signer().with_expiry(Some(1_000));
        let token = signer.sign(&signer.global_id(GlobalModel::DummyResource, 1), 5_000).unwrap();
        assert!(signer.locate_signed(&token, 5_999).is_ok());
        assert_eq!(signer.locate_signed(&token, 6_000).unwrap_err(), GlobalIdError::Expired(6_000));
    }

    #[test]
    fn purpose_mismatch_is_rejected() {
        let signer = signer();
        let token =
            signer.sign_for(&signer.global_id(GlobalModel::DummyResource, 1), "share", 0).unwrap();
        assert!(matches!(
            signer.locate_signed(&token, 0).unwrap_err(),
            GlobalIdError::PurposeMismatch(_)
        ));
    }

    #[test]
    fn signing_key_accepts_raw_and_base64() {
        let raw = [3_u8; 32];
        let from_raw = parse_signing_key(&raw).unwrap();
        let from_text = parse_signing_key(STANDARD.encode(raw).as_bytes()).unwrap();
        assert_eq!(from_raw.to_bytes(), from_text.to_bytes());
        assert!(parse_signing_key(b"short").is_err());
    }
}
