// crates/civic-comments-http/tests/http_e2e.rs
// ============================================================================
// Module: HTTP End-to-End Tests
// Description: Exercise the comments routes over a real socket.
// Purpose: Validate statuses, headers, cookies, and persistence end to end.
// ============================================================================

//! ## Overview
//! Each test spawns a `SQLite`-backed server and talks to it with `reqwest`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use civic_comments_http::FlashMessage;
use reqwest::StatusCode;
use serde_json::Value;
use serde_json::json;

use crate::common::client;
use crate::common::spawn_server;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_answers_ok() {
    let server = spawn_server().await;
    let response = client().get(format!("{}/health", server.base_url)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn posted_comment_appears_in_index() {
    let server = spawn_server().await;
    let http = client();
    let created = http
        .post(format!("{}/comments", server.base_url))
        .bearer_auth(&server.member_token)
        .json(&json!({
            "comment": {
                "commentable_gid": server.public_gid,
                "body": "This is a new comment",
                "alignment": "1"
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    assert_eq!(created.headers()["x-rendered-template"], "create");
    let created: Value = created.json().await.unwrap();
    assert_eq!(created["comments_count"], 1);
    assert_eq!(created["comment"]["alignment"], 1);

    let index = http
        .get(format!(
            "{}/comments?commentable_gid={}&order=recent",
            server.base_url, server.public_gid
        ))
        .header("cookie", format!("civic_session={}", server.member_token))
        .send()
        .await
        .unwrap();
    assert_eq!(index.status(), StatusCode::OK);
    assert_eq!(index.headers()["x-rendered-template"], "index");
    let page: Value = index.json().await.unwrap();
    assert_eq!(page["comments"][0]["body"], "This is a new comment");
    assert_eq!(page["comments"][0]["author_name"], "Ada");
    assert_eq!(page["can_comment"], true);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn anonymous_post_is_unauthorized() {
    let server = spawn_server().await;
    let response = client()
        .post(format!("{}/comments", server.base_url))
        .json(&json!({ "comment": { "commentable_gid": server.public_gid, "body": "hi" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "unauthorized" }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn private_space_redirects_with_flash() {
    let server = spawn_server().await;
    let response = client()
        .post(format!("{}/comments", server.base_url))
        .bearer_auth(&server.member_token)
        .header("referer", "/processes/board")
        .json(&json!({ "comment": { "commentable_gid": server.private_gid, "body": "hi" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/processes/board");
    let cookie = response.headers()["set-cookie"].to_str().unwrap().to_string();
    let flash = FlashMessage::from_cookie_header(&cookie).unwrap();
    assert!(!flash.alert.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tampered_gid_is_not_found() {
    let server = spawn_server().await;
    let mut tampered = server.public_gid.clone();
    tampered.push('x');
    let response = client()
        .get(format!("{}/comments?commentable_gid={tampered}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "routing_error");
}
