// crates/civic-comments-core/tests/memory_store.rs
// ============================================================================
// Module: In-Memory Store Tests
// Description: Referential rules, sessions, and fixture seeding.
// Purpose: Keep the in-memory backend aligned with the durable backend rules.
// ============================================================================

//! ## Overview
//! Exercises the in-memory backend directly and through the shared wrapper.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use civic_comments_core::Alignment;
use civic_comments_core::CommentStore;
use civic_comments_core::CommentableRef;
use civic_comments_core::Component;
use civic_comments_core::ComponentId;
use civic_comments_core::ComponentSettings;
use civic_comments_core::FixtureSet;
use civic_comments_core::FixtureWriter;
use civic_comments_core::InMemoryCommentsStore;
use civic_comments_core::LocalizedText;
use civic_comments_core::NewComment;
use civic_comments_core::ProcessId;
use civic_comments_core::ProcessVisibility;
use civic_comments_core::ResourceId;
use civic_comments_core::SessionStore;
use civic_comments_core::SharedCommentsStore;
use civic_comments_core::SpaceDirectory;
use civic_comments_core::StoreError;
use civic_comments_core::UserId;
use common::MEMBER_ID;
use common::NOW_MS;
use common::RESOURCE_ID;

fn seeded() -> InMemoryCommentsStore {
    let store = InMemoryCommentsStore::new();
    common::fixtures(ComponentSettings::default(), ProcessVisibility::Public).apply(&store).unwrap();
    store
}

fn new_comment(root: ResourceId) -> NewComment {
    NewComment {
        commentable: CommentableRef::Resource(root),
        root_commentable: root,
        parent_id: None,
        depth: 0,
        author_id: MEMBER_ID,
        body: LocalizedText::new("en", "hello"),
        alignment: Alignment::InFavor,
        created_at_ms: NOW_MS,
    }
}

#[test]
fn fixture_documents_parse_with_defaults() {
    let fixtures = FixtureSet::from_json_slice(
        br#"{
            "organizations": [{ "id": 1, "name": "City" }],
            "users": [{ "id": 1, "organization_id": 1, "name": "Ada", "confirmed": true }],
            "processes": [{ "id": 1, "organization_id": 1, "slug": "p" }],
            "components": [{ "id": 1, "process_id": 1, "name": "c" }],
            "resources": [{ "id": 1, "component_id": 1, "title": "r" }]
        }"#,
    )
    .unwrap();
    assert_eq!(fixtures.organizations[0].comments_max_length, 1_000);
    assert!(fixtures.components[0].settings.comments_enabled);
    let summary = fixtures.apply(&InMemoryCommentsStore::new()).unwrap();
    assert_eq!(summary.resources, 1);
}

#[test]
fn fixture_documents_reject_unknown_sections() {
    let err = FixtureSet::from_json_slice(br#"{ "proposals": [] }"#).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn fixtures_require_existing_parents() {
    let store = InMemoryCommentsStore::new();
    let err = store
        .put_component(&Component {
            id: ComponentId::new(1),
            process_id: ProcessId::new(404),
            name: "orphan".to_string(),
            settings: ComponentSettings::default(),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn comment_ids_are_sequential() {
    let store = seeded();
    let first = store.insert_comment(new_comment(RESOURCE_ID)).unwrap();
    let second = store.insert_comment(new_comment(RESOURCE_ID)).unwrap();
    assert_eq!(second.id.get(), first.id.get() + 1);
    assert_eq!(store.count_comments(RESOURCE_ID).unwrap(), 2);
}

#[test]
fn comments_on_unknown_resources_are_rejected() {
    let store = seeded();
    let err = store.insert_comment(new_comment(ResourceId::new(999))).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn sessions_resolve_only_issued_tokens() {
    let store = seeded();
    let token = store.issue_session(MEMBER_ID, NOW_MS).unwrap();
    assert_eq!(store.resolve_session(&token).unwrap(), Some(MEMBER_ID));
    assert_eq!(store.resolve_session("unknown-token").unwrap(), None);
    assert_eq!(store.resolve_session("").unwrap(), None);
    assert!(store.issue_session(UserId::new(999), NOW_MS).is_err());
}

#[test]
fn shared_store_delegates_to_inner_backend() {
    let inner = seeded();
    let shared = SharedCommentsStore::from_store(inner.clone());
    shared.insert_comment(new_comment(RESOURCE_ID)).unwrap();
    assert_eq!(inner.count_comments(RESOURCE_ID).unwrap(), 1);
    assert!(shared.resource(RESOURCE_ID).unwrap().is_some());
}
