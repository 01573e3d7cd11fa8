// crates/civic-comments-http/src/server.rs
// ============================================================================
// Module: Comments Server
// Description: axum router for the comments index and create actions.
// Purpose: Expose the comments controller over HTTP.
// Dependencies: civic-comments-core, civic-comments-config, axum, tokio
// ============================================================================

//! ## Overview
//! Routes:
//! - `GET /comments` lists the comments of a signed commentable.
//! - `POST /comments` posts `{ "comment": { commentable_gid, body, alignment } }`.
//! - `GET /health` answers `ok` when the store is ready, `503` otherwise.
//!
//! Store access is synchronous and runs through `block_in_place` on the
//! multi-threaded runtime. Security posture: inputs are untrusted and must be
//! validated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::REFERER;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use civic_comments_config::CommentsConfig;
use civic_comments_config::StoreType;
use civic_comments_core::CommentId;
use civic_comments_core::CommentOrder;
use civic_comments_core::CommentsBackend;
use civic_comments_core::CommentsController;
use civic_comments_core::ControllerError;
use civic_comments_core::CreateRequest;
use civic_comments_core::GlobalIdSigner;
use civic_comments_core::InMemoryCommentsStore;
use civic_comments_core::IndexRequest;
use civic_comments_core::SharedCommentsStore;
use civic_comments_core::User;
use civic_comments_core::global_id::parse_signing_key;
use civic_comments_core::runtime::CommentAction;
use civic_comments_core::runtime::CommentForm;
use civic_comments_store_sqlite::SqliteCommentsStore;
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::audit::AuditSink;
use crate::audit::AuthzAuditEvent;
use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditParams;
use crate::audit::audit_sink_from_config;
use crate::auth::session_token;
use crate::views::View;
use crate::views::create_view;
use crate::views::error_response;
use crate::views::error_view;
use crate::views::index_view;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum signing key file size.
const MAX_SIGNING_KEY_BYTES: u64 = 4 * 1024;

// ============================================================================
// SECTION: Server
// ============================================================================

/// Comments HTTP server.
pub struct CommentsServer {
    /// Listener address.
    bind: SocketAddr,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl CommentsServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the store, signer, or audit sink cannot be
    /// initialized.
    pub fn from_config(config: &CommentsConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let store = build_store(config)?;
        let signer = build_signer(config)?;
        let audit = audit_sink_from_config(&config.server.audit)
            .map_err(|err| ServerError::Init(format!("audit sink: {err}")))?;
        Self::from_parts(config, store, signer, audit)
    }

    /// Builds a server from an existing store, signer, and audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] when the bind address is invalid.
    pub fn from_parts(
        config: &CommentsConfig,
        store: SharedCommentsStore,
        signer: GlobalIdSigner,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, ServerError> {
        let bind = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let controller = CommentsController::new(store, signer, config.i18n.locale());
        Ok(Self {
            bind,
            state: Arc::new(ServerState {
                controller,
                audit,
                max_body_bytes: config.server.max_body_bytes,
                session_cookie: config.server.session_cookie.clone(),
            }),
        })
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Returns the comments controller.
    #[must_use]
    pub fn controller(&self) -> &CommentsController<SharedCommentsStore> {
        &self.state.controller
    }

    /// Builds the axum router.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/comments", get(handle_index).post(handle_create))
            .route("/health", get(handle_health))
            .layer(DefaultBodyLimit::max(self.state.max_body_bytes))
            .with_state(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves requests.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_listener(listener).await
    }

    /// Serves requests on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when serving fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, "comments server listening");
        }
        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

/// Builds the store backend selected by `[store]`.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the `SQLite` store cannot be opened.
pub fn build_store(config: &CommentsConfig) -> Result<SharedCommentsStore, ServerError> {
    match config.store.store_type {
        StoreType::Memory => Ok(SharedCommentsStore::from_store(InMemoryCommentsStore::new())),
        StoreType::Sqlite => {
            let sqlite = config
                .store
                .sqlite()
                .ok_or_else(|| ServerError::Config("sqlite store requires path".to_string()))?;
            let store =
                SqliteCommentsStore::new(sqlite).map_err(|err| ServerError::Init(err.to_string()))?;
            tracing::info!(path = %store.path().display(), "opened sqlite comments store");
            Ok(SharedCommentsStore::from_store(store))
        }
    }
}

/// Builds the global id signer from `[global_id]`.
///
/// Without `signing_key_path` an ephemeral key is generated, so signed gids
/// do not survive a restart.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the key file cannot be read or parsed.
pub fn build_signer(config: &CommentsConfig) -> Result<GlobalIdSigner, ServerError> {
    let app = config.global_id.app.clone();
    let signer = match &config.global_id.signing_key_path {
        Some(path) => {
            let key_bytes = read_signing_key(Path::new(path.trim()))?;
            let key = parse_signing_key(&key_bytes)
                .map_err(|err| ServerError::Init(format!("signing key: {err}")))?;
            GlobalIdSigner::new(app, key)
        }
        None => {
            tracing::warn!("global_id.signing_key_path not set; using an ephemeral signing key");
            GlobalIdSigner::ephemeral(app)
        }
    };
    Ok(signer.with_expiry(config.global_id.expires_in_ms()))
}

/// Reads a signing key file with a size cap.
fn read_signing_key(path: &Path) -> Result<Vec<u8>, ServerError> {
    let metadata =
        fs::metadata(path).map_err(|err| ServerError::Init(format!("signing key: {err}")))?;
    if metadata.len() > MAX_SIGNING_KEY_BYTES {
        return Err(ServerError::Init("signing key file exceeds size limit".to_string()));
    }
    fs::read(path).map_err(|err| ServerError::Init(format!("signing key: {err}")))
}

/// Returns the current unix time in milliseconds.
#[must_use]
pub fn now_ms() -> u64 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Shared server state for handlers.
struct ServerState {
    /// Comments controller.
    controller: CommentsController<SharedCommentsStore>,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
    /// Session cookie name.
    session_cookie: String,
}

/// Index query parameters.
#[derive(Debug, Default, Deserialize)]
struct IndexParams {
    /// Signed global id of the commentable.
    #[serde(default)]
    commentable_gid: Option<String>,
    /// Render the reload template when truthy.
    #[serde(default)]
    reload: Option<String>,
    /// Listing order label.
    #[serde(default)]
    order: Option<String>,
    /// Only list comments after this identifier.
    #[serde(default)]
    after: Option<String>,
}

/// Create request body.
#[derive(Debug, Deserialize)]
struct CreatePayload {
    /// Submitted comment form.
    comment: CommentForm,
}

/// Handles `GET /health`.
async fn handle_health(State(state): State<Arc<ServerState>>) -> Response {
    health_response(&state)
}

/// Probes store readiness.
fn health_response(state: &ServerState) -> Response {
    match run_blocking(|| state.controller.store().readiness()) {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "comments store not ready");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
        }
    }
}

/// Handles `GET /comments`.
async fn handle_index(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<IndexParams>,
) -> Response {
    index_response(&state, Some(peer), &headers, &params)
}

/// Handles `POST /comments`.
async fn handle_create(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    create_response(&state, Some(peer), &headers, &bytes)
}

/// Runs the index action and renders its outcome.
fn index_response(
    state: &ServerState,
    peer: Option<SocketAddr>,
    headers: &HeaderMap,
    params: &IndexParams,
) -> Response {
    let request = IndexRequest {
        commentable_gid: params.commentable_gid.clone().unwrap_or_default(),
        reload: params.reload.as_deref().is_some_and(is_truthy),
        order: CommentOrder::parse_or_default(params.order.as_deref()),
        after: params.after.as_deref().and_then(|raw| raw.trim().parse().ok()).map(CommentId::new),
        now_ms: now_ms(),
    };
    let token = match session_token(headers, &state.session_cookie) {
        Ok(token) => token,
        Err(err) => {
            return finish(state, CommentAction::Read, peer, None, 0, unauthenticated(&err.to_string()));
        }
    };
    let result = run_blocking(|| {
        let viewer = state.controller.resolve_viewer(token.as_deref())?;
        let outcome = state.controller.index(viewer.as_ref(), &request)?;
        Ok::<_, ControllerError>((viewer, outcome))
    });
    let referer = referer(headers);
    match result {
        Ok((viewer, outcome)) => {
            finish(state, CommentAction::Read, peer, viewer.as_ref(), 0, index_view(outcome, referer))
        }
        Err(err) => finish(state, CommentAction::Read, peer, None, 0, error_view(&err)),
    }
}

/// Runs the create action and renders its outcome.
fn create_response(
    state: &ServerState,
    peer: Option<SocketAddr>,
    headers: &HeaderMap,
    bytes: &Bytes,
) -> Response {
    let size = bytes.len();
    if size > state.max_body_bytes {
        let view = View {
            response: error_response(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            outcome: "payload_too_large",
            denial: None,
        };
        return finish(state, CommentAction::Create, peer, None, size, view);
    }
    let token = match session_token(headers, &state.session_cookie) {
        Ok(token) => token,
        Err(err) => {
            return finish(state, CommentAction::Create, peer, None, size, unauthenticated(&err.to_string()));
        }
    };
    let viewer = match run_blocking(|| state.controller.resolve_viewer(token.as_deref())) {
        Ok(viewer) => viewer,
        Err(err) => return finish(state, CommentAction::Create, peer, None, size, error_view(&err)),
    };
    if viewer.is_none() {
        return finish(state, CommentAction::Create, peer, None, size, error_view(&ControllerError::Unauthorized));
    }
    let Ok(payload) = serde_json::from_slice::<CreatePayload>(bytes) else {
        let view = View {
            response: error_response(StatusCode::BAD_REQUEST, "invalid_request"),
            outcome: "invalid_request",
            denial: None,
        };
        return finish(state, CommentAction::Create, peer, viewer.as_ref(), size, view);
    };
    let request = CreateRequest {
        form: payload.comment,
        now_ms: now_ms(),
    };
    let view = match run_blocking(|| state.controller.create(viewer.as_ref(), &request)) {
        Ok(outcome) => create_view(outcome, referer(headers)),
        Err(err) => error_view(&err),
    };
    finish(state, CommentAction::Create, peer, viewer.as_ref(), size, view)
}

/// Records audit events for a rendered view and returns its response.
fn finish(
    state: &ServerState,
    action: CommentAction,
    peer: Option<SocketAddr>,
    viewer: Option<&User>,
    request_bytes: usize,
    view: View,
) -> Response {
    let peer_ip = peer.map(|addr| addr.ip().to_string());
    let viewer_id = viewer.map(|user| user.id.get());
    if let Some(reason) = view.denial {
        state.audit.record_authz(&AuthzAuditEvent::denied(action, reason, viewer_id, peer_ip.clone()));
    }
    state.audit.record(&RequestAuditEvent::new(RequestAuditParams {
        peer_ip,
        action: route_label(action),
        status: view.response.status().as_u16(),
        outcome: view.outcome,
        viewer_id,
        request_bytes,
    }));
    view.response
}

/// Returns the route label recorded for an action.
const fn route_label(action: CommentAction) -> &'static str {
    match action {
        CommentAction::Read => "index",
        CommentAction::Create => "create",
    }
}

/// Builds the 401 view for unusable credentials.
fn unauthenticated(detail: &str) -> View {
    tracing::debug!(detail, "rejected credentials");
    View {
        response: error_response(StatusCode::UNAUTHORIZED, "unauthorized"),
        outcome: "unauthorized",
        denial: None,
    }
}

/// Returns the `Referer` header when it is valid UTF-8.
fn referer(headers: &HeaderMap) -> Option<&str> {
    headers.get(REFERER).and_then(|value| value.to_str().ok())
}

/// Returns true for `1`, `true`, or `yes`.
fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// Executes store-bound work, shifting to a blocking context when available.
fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Comments server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
