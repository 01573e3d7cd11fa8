// crates/civic-comments-http/tests/common/mod.rs
// ============================================================================
// Module: HTTP Test Fixtures
// Description: Spawns a comments server on an ephemeral port.
// Purpose: Provide reusable end-to-end infrastructure for HTTP tests.
// Dependencies: civic-comments-http, reqwest, tempfile, tokio
// ============================================================================

//! ## Overview
//! Builds a `SQLite`-backed server from a generated config file, seeds one
//! public and one private space, and serves it on `127.0.0.1:0`.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;

use civic_comments_config::CommentsConfig;
use civic_comments_core::CommentableRef;
use civic_comments_core::FixtureSet;
use civic_comments_core::ResourceId;
use civic_comments_core::SessionStore;
use civic_comments_core::UserId;
use civic_comments_http::CommentsServer;
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Resource in the public process.
pub const PUBLIC_RESOURCE: ResourceId = ResourceId::new(10);
/// Resource in the private process.
pub const PRIVATE_RESOURCE: ResourceId = ResourceId::new(20);
/// Confirmed member who is not a private-process participant.
pub const MEMBER: UserId = UserId::new(1);

// ============================================================================
// SECTION: Server
// ============================================================================

/// Running server under test.
pub struct TestServer {
    /// Base URL (`http://127.0.0.1:port`).
    pub base_url: String,
    /// Signed gid of the public resource.
    pub public_gid: String,
    /// Signed gid of the private resource.
    pub private_gid: String,
    /// Session token for [`MEMBER`].
    pub member_token: String,
    /// Keeps the database directory alive.
    _dir: TempDir,
}

/// Returns the fixtures seeded into every test server.
fn fixtures() -> FixtureSet {
    let document = json!({
        "organizations": [{ "id": 1, "name": "City", "default_locale": "en" }],
        "users": [
            { "id": 1, "organization_id": 1, "name": "Ada", "confirmed": true },
            { "id": 2, "organization_id": 1, "name": "Bea", "confirmed": true }
        ],
        "processes": [
            { "id": 5, "organization_id": 1, "slug": "budget" },
            { "id": 6, "organization_id": 1, "slug": "board", "visibility": "private", "participants": [2] }
        ],
        "components": [
            { "id": 7, "process_id": 5, "name": "Debates" },
            { "id": 8, "process_id": 6, "name": "Minutes" }
        ],
        "resources": [
            { "id": 10, "component_id": 7, "title": "Parks" },
            { "id": 20, "component_id": 8, "title": "Salaries" }
        ]
    });
    FixtureSet::from_json_slice(document.to_string().as_bytes()).unwrap()
}

/// Spawns a seeded server.
pub async fn spawn_server() -> TestServer {
    let dir = TempDir::new().unwrap();
    let key_path = dir.path().join("gid.key");
    std::fs::write(&key_path, [3_u8; 32]).unwrap();
    let toml = format!(
        "[server]\nbind = \"127.0.0.1:0\"\n[server.audit]\nenabled = false\n[store]\ntype = \
         \"sqlite\"\npath = {:?}\n[global_id]\nsigning_key_path = {:?}\n",
        dir.path().join("comments.sqlite").display().to_string(),
        key_path.display().to_string(),
    );
    let config = CommentsConfig::from_toml_bytes(toml.as_bytes()).unwrap();
    let server = CommentsServer::from_config(&config).unwrap();
    let controller = server.controller();
    fixtures().apply(controller.store()).unwrap();
    let now = civic_comments_http::server::now_ms();
    let public_gid =
        controller.sign_commentable(CommentableRef::Resource(PUBLIC_RESOURCE), now).unwrap();
    let private_gid =
        controller.sign_commentable(CommentableRef::Resource(PRIVATE_RESOURCE), now).unwrap();
    let member_token = controller.store().issue_session(MEMBER, now).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(server.serve_listener(listener));
    TestServer {
        base_url: format!("http://{addr}"),
        public_gid,
        private_gid,
        member_token,
        _dir: dir,
    }
}

/// Returns a client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().redirect(reqwest::redirect::Policy::none()).build().unwrap()
}
