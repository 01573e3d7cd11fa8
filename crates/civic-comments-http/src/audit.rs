// crates/civic-comments-http/src/audit.rs
// ============================================================================
// Module: Comments Audit Logging
// Description: Structured audit events for comment request handling.
// Purpose: Emit JSON lines describing requests and guard denials.
// Dependencies: civic-comments-config, serde, serde_json
// ============================================================================

//! ## Overview
//! Two events are emitted: `comments_request` once per handled request and
//! `comments_authz` whenever a permission guard rejects an action. Events never
//! carry comment bodies or session tokens.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use civic_comments_config::AuditConfig;
use civic_comments_core::runtime::CommentAction;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Comment action label (`index` or `create`).
    pub action: &'static str,
    /// HTTP status returned.
    pub status: u16,
    /// Outcome label.
    pub outcome: &'static str,
    /// Signed-in viewer when resolved.
    pub viewer_id: Option<u64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
}

/// Inputs required to construct a request audit event.
pub struct RequestAuditParams {
    /// Peer IP address if known.
    pub peer_ip: Option<String>,
    /// Comment action label.
    pub action: &'static str,
    /// HTTP status returned.
    pub status: u16,
    /// Outcome label.
    pub outcome: &'static str,
    /// Signed-in viewer when resolved.
    pub viewer_id: Option<u64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
}

impl RequestAuditEvent {
    /// Creates a new request audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: RequestAuditParams) -> Self {
        Self {
            event: "comments_request",
            timestamp_ms: timestamp_ms(),
            peer_ip: params.peer_ip,
            action: params.action,
            status: params.status,
            outcome: params.outcome,
            viewer_id: params.viewer_id,
            request_bytes: params.request_bytes,
        }
    }
}

/// Permission denial audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct AuthzAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Comment action label.
    pub action: &'static str,
    /// Denial reason label.
    pub reason: &'static str,
    /// Signed-in viewer when resolved.
    pub viewer_id: Option<u64>,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
}

impl AuthzAuditEvent {
    /// Creates a denial event.
    #[must_use]
    pub fn denied(
        action: CommentAction,
        reason: &'static str,
        viewer_id: Option<u64>,
        peer_ip: Option<String>,
    ) -> Self {
        Self {
            event: "comments_authz",
            timestamp_ms: timestamp_ms(),
            action: action.as_str(),
            reason,
            viewer_id,
            peer_ip,
        }
    }
}

/// Returns the current unix time in milliseconds.
fn timestamp_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for comment request events.
pub trait AuditSink: Send + Sync {
    /// Record a request event.
    fn record(&self, event: &RequestAuditEvent);

    /// Record a permission denial.
    fn record_authz(&self, _event: &AuthzAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_authz(&self, event: &AuthzAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes one serialized line.
    fn append(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }

    fn record_authz(&self, event: &AuthzAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &RequestAuditEvent) {}
}

/// Builds the audit sink selected by `[server.audit]`.
///
/// # Errors
///
/// Returns an error when the audit file cannot be opened.
pub fn audit_sink_from_config(config: &AuditConfig) -> io::Result<Arc<dyn AuditSink>> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &config.path {
        Some(path) => Ok(Arc::new(FileAuditSink::new(Path::new(path.trim()))?)),
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
