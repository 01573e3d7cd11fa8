// crates/civic-comments-core/tests/comments_controller.rs
// ============================================================================
// Module: Comments Controller Tests
// Description: Index and create behavior across guards, forms, and routing.
// Purpose: Validate that only valid, authorized creates persist a comment.
// ============================================================================

//! ## Overview
//! Drives [`CommentsController`] over the in-memory backend:
//! - every alignment in {-1, 0, 1} persists exactly one comment
//! - invalid alignments and blank bodies render the error view
//! - unauthenticated creates fail without persistence
//! - disabled components and private spaces redirect with an alert
//! - tampered or unknown gids are routing errors

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use civic_comments_core::Alignment;
use civic_comments_core::CommentOrder;
use civic_comments_core::CommentStore;
use civic_comments_core::CommentableRef;
use civic_comments_core::ComponentSettings;
use civic_comments_core::ControllerError;
use civic_comments_core::CreateOutcome;
use civic_comments_core::CreateRequest;
use civic_comments_core::IndexOutcome;
use civic_comments_core::IndexRequest;
use civic_comments_core::ListQuery;
use civic_comments_core::ProcessVisibility;
use civic_comments_core::User;
use civic_comments_core::runtime::AlignmentInput;
use civic_comments_core::runtime::CommentForm;
use civic_comments_core::runtime::CreatedComment;
use civic_comments_core::runtime::DenialReason;
use civic_comments_core::runtime::Template;
use common::FOREIGN_ID;
use common::Harness;
use common::MEMBER_ID;
use common::NOW_MS;
use common::PARTICIPANT_ID;
use common::RESOURCE_ID;
use common::UNCONFIRMED_ID;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn create_request(gid: &str, body: Option<&str>, alignment: Option<i64>) -> CreateRequest {
    CreateRequest {
        form: CommentForm {
            commentable_gid: gid.to_string(),
            body: body.map(str::to_string),
            alignment: alignment.map(AlignmentInput::from),
        },
        now_ms: NOW_MS,
    }
}

fn index_request(gid: &str, reload: bool) -> IndexRequest {
    IndexRequest {
        commentable_gid: gid.to_string(),
        reload,
        order: CommentOrder::Older,
        after: None,
        now_ms: NOW_MS,
    }
}

fn count(harness: &Harness) -> u64 {
    harness.store.count_comments(RESOURCE_ID).unwrap()
}

fn post(harness: &Harness, viewer: &User, body: &str, alignment: i64) -> CreatedComment {
    let gid = harness.resource_gid();
    match harness.controller.create(Some(viewer), &create_request(&gid, Some(body), Some(alignment)))
    {
        Ok(CreateOutcome::Created(created)) => created,
        other => panic!("expected created, got {other:?}"),
    }
}

// ============================================================================
// SECTION: Create
// ============================================================================

#[test]
fn create_persists_one_comment_for_each_alignment() {
    for alignment in Alignment::ALL {
        let harness = Harness::public();
        let viewer = harness.user(MEMBER_ID);
        let created = post(&harness, &viewer, "This is a new comment", alignment.value());
        assert_eq!(created.template, Template::Create);
        assert_eq!(count(&harness), 1);
        let stored = harness.store.comment(created.comment.id).unwrap().unwrap();
        assert_eq!(stored.alignment, alignment);
        assert_eq!(stored.body.get("en"), Some("This is a new comment"));
        assert_eq!(stored.author_id, MEMBER_ID);
        assert_eq!(stored.depth, 0);
    }
}

#[test]
fn create_with_neutral_alignment_increments_count_by_one() {
    let harness = Harness::public();
    let viewer = harness.user(MEMBER_ID);
    let before = count(&harness);
    let created = post(&harness, &viewer, "This is a new comment", 0);
    assert_eq!(count(&harness), before + 1);
    assert_eq!(created.comments_count, before + 1);
    assert_eq!(created.comment.alignment, Alignment::Neutral);
}

#[test]
fn create_rejects_out_of_range_alignment_without_persisting() {
    let harness = Harness::public();
    let viewer = harness.user(MEMBER_ID);
    let gid = harness.resource_gid();
    let outcome = harness
        .controller
        .create(Some(&viewer), &create_request(&gid, Some("This is a new comment"), Some(2)))
        .unwrap();
    let CreateOutcome::Invalid(invalid) = outcome else {
        panic!("expected invalid outcome, got {outcome:?}");
    };
    assert_eq!(invalid.template, Template::Error);
    assert_eq!(invalid.errors.len(), 1);
    assert_eq!(invalid.errors[0].code, "alignment_invalid");
    assert_eq!(count(&harness), 0);
}

#[test]
fn create_rejects_blank_or_missing_body_without_persisting() {
    let harness = Harness::public();
    let viewer = harness.user(MEMBER_ID);
    let gid = harness.resource_gid();
    for body in [None, Some(""), Some("   ")] {
        let outcome =
            harness.controller.create(Some(&viewer), &create_request(&gid, body, Some(0))).unwrap();
        let CreateOutcome::Invalid(invalid) = outcome else {
            panic!("expected invalid outcome, got {outcome:?}");
        };
        assert_eq!(invalid.errors[0].code, "body_missing");
    }
    assert_eq!(count(&harness), 0);
}

#[test]
fn create_rejects_bodies_longer_than_component_limit() {
    let settings = ComponentSettings {
        comments_max_length: Some(5),
        ..ComponentSettings::default()
    };
    let harness = Harness::new(settings, ProcessVisibility::Public);
    let viewer = harness.user(MEMBER_ID);
    let gid = harness.resource_gid();
    let outcome = harness
        .controller
        .create(Some(&viewer), &create_request(&gid, Some("too long"), Some(0)))
        .unwrap();
    assert!(matches!(outcome, CreateOutcome::Invalid(_)));
    assert_eq!(count(&harness), 0);
}

#[test]
fn unauthenticated_create_is_unauthorized() {
    let harness = Harness::public();
    let gid = harness.resource_gid();
    let err = harness
        .controller
        .create(None, &create_request(&gid, Some("This is a new comment"), Some(0)))
        .unwrap_err();
    assert!(matches!(err, ControllerError::Unauthorized));
    assert_eq!(count(&harness), 0);
}

#[test]
fn unauthenticated_create_with_bad_gid_is_still_unauthorized() {
    let harness = Harness::public();
    let err = harness
        .controller
        .create(None, &create_request("not-a-token", Some("body"), Some(0)))
        .unwrap_err();
    assert!(matches!(err, ControllerError::Unauthorized));
}

#[test]
fn disabled_component_redirects_create_with_alert() {
    let settings = ComponentSettings {
        comments_enabled: false,
        ..ComponentSettings::default()
    };
    let harness = Harness::new(settings, ProcessVisibility::Public);
    let viewer = harness.user(MEMBER_ID);
    let gid = harness.resource_gid();
    let outcome = harness
        .controller
        .create(Some(&viewer), &create_request(&gid, Some("This is a new comment"), Some(0)))
        .unwrap();
    let CreateOutcome::Redirect(redirect) = outcome else {
        panic!("expected redirect, got {outcome:?}");
    };
    assert_eq!(redirect.reason, DenialReason::CommentsDisabled);
    assert!(!redirect.alert.is_empty());
    assert_eq!(count(&harness), 0);
}

#[test]
fn private_space_redirects_non_participants_like_disabled_component() {
    let harness = Harness::new(ComponentSettings::default(), ProcessVisibility::Private);
    let outsider = harness.user(MEMBER_ID);
    let gid = harness.resource_gid();
    let outcome = harness
        .controller
        .create(Some(&outsider), &create_request(&gid, Some("This is a new comment"), Some(0)))
        .unwrap();
    let CreateOutcome::Redirect(redirect) = outcome else {
        panic!("expected redirect, got {outcome:?}");
    };
    assert_eq!(redirect.reason, DenialReason::PrivateSpace);
    assert_eq!(count(&harness), 0);

    let participant = harness.user(PARTICIPANT_ID);
    post(&harness, &participant, "Inside the private space", 1);
    assert_eq!(count(&harness), 1);
}

#[test]
fn unconfirmed_and_foreign_users_are_redirected() {
    let harness = Harness::public();
    let gid = harness.resource_gid();
    for (user_id, reason) in [
        (UNCONFIRMED_ID, DenialReason::UnconfirmedUser),
        (FOREIGN_ID, DenialReason::ForeignOrganization),
    ] {
        let viewer = harness.user(user_id);
        let outcome = harness
            .controller
            .create(Some(&viewer), &create_request(&gid, Some("body"), Some(0)))
            .unwrap();
        assert!(
            matches!(&outcome, CreateOutcome::Redirect(redirect) if redirect.reason == reason),
            "unexpected outcome {outcome:?}"
        );
    }
    assert_eq!(count(&harness), 0);
}

#[test]
fn guards_run_before_form_validation() {
    let settings = ComponentSettings {
        comments_blocked: true,
        ..ComponentSettings::default()
    };
    let harness = Harness::new(settings, ProcessVisibility::Public);
    let viewer = harness.user(MEMBER_ID);
    let gid = harness.resource_gid();
    let outcome =
        harness.controller.create(Some(&viewer), &create_request(&gid, None, Some(9))).unwrap();
    assert!(matches!(
        outcome,
        CreateOutcome::Redirect(redirect) if redirect.reason == DenialReason::CommentsBlocked
    ));
}

// ============================================================================
// SECTION: Routing
// ============================================================================

#[test]
fn tampered_gid_is_a_routing_error() {
    let harness = Harness::public();
    let viewer = harness.user(MEMBER_ID);
    let mut gid = harness.resource_gid();
    gid.push('x');
    let err = harness
        .controller
        .create(Some(&viewer), &create_request(&gid, Some("body"), Some(0)))
        .unwrap_err();
    assert!(matches!(err, ControllerError::Routing(_)));
    assert!(matches!(
        harness.controller.index(None, &index_request(&gid, false)).unwrap_err(),
        ControllerError::Routing(_)
    ));
}

#[test]
fn gid_for_missing_resource_is_a_routing_error() {
    let harness = Harness::public();
    let viewer = harness.user(MEMBER_ID);
    let gid = harness
        .controller
        .sign_commentable(CommentableRef::Resource(civic_comments_core::ResourceId::new(999)), NOW_MS)
        .unwrap();
    let err = harness
        .controller
        .create(Some(&viewer), &create_request(&gid, Some("body"), Some(0)))
        .unwrap_err();
    assert!(matches!(err, ControllerError::Routing(_)));
    assert_eq!(count(&harness), 0);
}

// ============================================================================
// SECTION: Replies
// ============================================================================

#[test]
fn replies_record_parent_and_depth_up_to_limit() {
    let harness = Harness::public();
    let viewer = harness.user(MEMBER_ID);
    let mut parent = post(&harness, &viewer, "root", 0).comment;
    for expected_depth in 1 ..= 3 {
        let request = create_request(&parent.reply_gid, Some("reply"), Some(1));
        let CreateOutcome::Created(created) =
            harness.controller.create(Some(&viewer), &request).unwrap()
        else {
            panic!("expected reply at depth {expected_depth}");
        };
        assert_eq!(created.comment.parent_id, Some(parent.id));
        assert_eq!(created.comment.depth, expected_depth);
        parent = created.comment;
    }
    let request = create_request(&parent.reply_gid, Some("too deep"), Some(1));
    let outcome = harness.controller.create(Some(&viewer), &request).unwrap();
    let CreateOutcome::Invalid(invalid) = outcome else {
        panic!("expected invalid outcome, got {outcome:?}");
    };
    assert_eq!(invalid.errors[0].code, "depth_exceeded");
    assert_eq!(count(&harness), 4);
}

// ============================================================================
// SECTION: Index
// ============================================================================

#[test]
fn index_renders_index_and_reload_templates() {
    let harness = Harness::public();
    let viewer = harness.user(MEMBER_ID);
    post(&harness, &viewer, "first", -1);
    let gid = harness.resource_gid();
    for (reload, template) in [(false, Template::Index), (true, Template::Reload)] {
        let IndexOutcome::Rendered(page) =
            harness.controller.index(None, &index_request(&gid, reload)).unwrap()
        else {
            panic!("expected rendered page");
        };
        assert_eq!(page.template, template);
        assert_eq!(page.comments.len(), 1);
        assert_eq!(page.comments[0].author_name, "Participant 1");
        assert!(!page.can_comment);
    }
}

#[test]
fn index_supports_order_and_after_cursor() {
    let harness = Harness::public();
    let viewer = harness.user(MEMBER_ID);
    let first = post(&harness, &viewer, "first", 0).comment;
    let second = post(&harness, &viewer, "second", 0).comment;
    let gid = harness.resource_gid();

    let mut request = index_request(&gid, true);
    request.order = CommentOrder::Recent;
    let IndexOutcome::Rendered(page) = harness.controller.index(Some(&viewer), &request).unwrap()
    else {
        panic!("expected rendered page");
    };
    let ids: Vec<_> = page.comments.iter().map(|entry| entry.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(page.can_comment);

    request.order = CommentOrder::Older;
    request.after = Some(first.id);
    let IndexOutcome::Rendered(page) = harness.controller.index(Some(&viewer), &request).unwrap()
    else {
        panic!("expected rendered page");
    };
    assert_eq!(page.comments.len(), 1);
    assert_eq!(page.last_comment_id, Some(second.id));
    assert_eq!(page.comments_count, 2);
}

#[test]
fn index_redirects_when_component_disabled() {
    let settings = ComponentSettings {
        comments_enabled: false,
        ..ComponentSettings::default()
    };
    let harness = Harness::new(settings, ProcessVisibility::Public);
    let gid = harness.resource_gid();
    let outcome = harness.controller.index(None, &index_request(&gid, false)).unwrap();
    let IndexOutcome::Redirect(redirect) = outcome else {
        panic!("expected redirect, got {outcome:?}");
    };
    assert_eq!(redirect.reason, DenialReason::CommentsDisabled);
    assert_eq!(redirect.alert, "Comments are disabled for this component.");
}

#[test]
fn alerts_follow_viewer_locale() {
    let harness = Harness::new(ComponentSettings::default(), ProcessVisibility::Private);
    let mut viewer = harness.user(MEMBER_ID);
    viewer.locale = "ca".to_string();
    let gid = harness.resource_gid();
    let outcome = harness.controller.index(Some(&viewer), &index_request(&gid, false)).unwrap();
    let IndexOutcome::Redirect(redirect) = outcome else {
        panic!("expected redirect, got {outcome:?}");
    };
    assert_eq!(redirect.alert, "No tens autorització per comentar en aquest espai privat.");
}

#[test]
fn listing_query_limit_is_honored_by_store() {
    let harness = Harness::public();
    let viewer = harness.user(MEMBER_ID);
    post(&harness, &viewer, "one", 0);
    post(&harness, &viewer, "two", 0);
    let query = ListQuery {
        limit: Some(1),
        ..ListQuery::default()
    };
    assert_eq!(harness.store.list_comments(RESOURCE_ID, &query).unwrap().len(), 1);
}
