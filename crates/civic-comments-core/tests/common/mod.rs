// crates/civic-comments-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared spaces, users, and controller harness for core tests.
// Purpose: Provide reusable test infrastructure for deterministic testing.
// Dependencies: civic-comments-core, ed25519-dalek
// ============================================================================

//! ## Overview
//! Builds one organization with a single process, component, and resource,
//! plus a confirmed member, a process participant, an unconfirmed member, and
//! a user from another organization.

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

use std::collections::BTreeSet;

use civic_comments_core::CommentableRef;
use civic_comments_core::CommentsController;
use civic_comments_core::Component;
use civic_comments_core::ComponentId;
use civic_comments_core::ComponentSettings;
use civic_comments_core::FixtureSet;
use civic_comments_core::GlobalIdSigner;
use civic_comments_core::InMemoryCommentsStore;
use civic_comments_core::Locale;
use civic_comments_core::Organization;
use civic_comments_core::OrganizationId;
use civic_comments_core::ParticipatoryProcess;
use civic_comments_core::ProcessId;
use civic_comments_core::ProcessVisibility;
use civic_comments_core::Resource;
use civic_comments_core::ResourceId;
use civic_comments_core::User;
use civic_comments_core::UserId;
use civic_comments_core::global_id::DEFAULT_APP;
use ed25519_dalek::SigningKey;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fixed request time.
pub const NOW_MS: u64 = 1_700_000_000_000;
/// Resource every test comments on.
pub const RESOURCE_ID: ResourceId = ResourceId::new(10);
/// Confirmed member of the organization (not a process participant).
pub const MEMBER_ID: UserId = UserId::new(1);
/// Confirmed member assigned to the process.
pub const PARTICIPANT_ID: UserId = UserId::new(2);
/// Member whose account is not confirmed.
pub const UNCONFIRMED_ID: UserId = UserId::new(3);
/// Confirmed user from another organization.
pub const FOREIGN_ID: UserId = UserId::new(4);

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a user fixture.
pub fn user(id: UserId, organization: u64, confirmed: bool, locale: &str) -> User {
    User {
        id,
        organization_id: OrganizationId::new(organization),
        name: format!("Participant {id}"),
        locale: locale.to_string(),
        confirmed,
    }
}

/// Builds the fixture set for a single commentable resource.
pub fn fixtures(settings: ComponentSettings, visibility: ProcessVisibility) -> FixtureSet {
    FixtureSet {
        organizations: vec![
            Organization {
                id: OrganizationId::new(1),
                name: "Barcelona".to_string(),
                default_locale: "en".to_string(),
                comments_max_length: 1_000,
            },
            Organization {
                id: OrganizationId::new(2),
                name: "Girona".to_string(),
                default_locale: "ca".to_string(),
                comments_max_length: 1_000,
            },
        ],
        users: vec![
            user(MEMBER_ID, 1, true, "en"),
            user(PARTICIPANT_ID, 1, true, "en"),
            user(UNCONFIRMED_ID, 1, false, "en"),
            user(FOREIGN_ID, 2, true, "en"),
        ],
        processes: vec![ParticipatoryProcess {
            id: ProcessId::new(5),
            organization_id: OrganizationId::new(1),
            slug: "participatory-budget".to_string(),
            visibility,
            participants: BTreeSet::from([PARTICIPANT_ID]),
        }],
        components: vec![Component {
            id: ComponentId::new(7),
            process_id: ProcessId::new(5),
            name: "Dummy".to_string(),
            settings,
        }],
        resources: vec![Resource {
            id: RESOURCE_ID,
            component_id: ComponentId::new(7),
            title: "Dummy resource".to_string(),
        }],
    }
}

/// Returns the deterministic signer used by tests.
pub fn signer() -> GlobalIdSigner {
    GlobalIdSigner::new(DEFAULT_APP, SigningKey::from_bytes(&[7_u8; 32]))
}

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Seeded store plus controller.
pub struct Harness {
    /// Backing store.
    pub store: InMemoryCommentsStore,
    /// Controller under test.
    pub controller: CommentsController<InMemoryCommentsStore>,
}

impl Harness {
    /// Seeds a store with the given component settings and visibility.
    pub fn new(settings: ComponentSettings, visibility: ProcessVisibility) -> Self {
        let store = InMemoryCommentsStore::new();
        fixtures(settings, visibility).apply(&store).expect("seed fixtures");
        let controller = CommentsController::new(store.clone(), signer(), Locale::En);
        Self {
            store,
            controller,
        }
    }

    /// Seeds a public process with default settings.
    pub fn public() -> Self {
        Self::new(ComponentSettings::default(), ProcessVisibility::Public)
    }

    /// Returns the signed gid of the test resource.
    pub fn resource_gid(&self) -> String {
        self.controller.sign_commentable(CommentableRef::Resource(RESOURCE_ID), NOW_MS).unwrap()
    }

    /// Loads a fixture user.
    pub fn user(&self, id: UserId) -> User {
        use civic_comments_core::SpaceDirectory;
        self.store.user(id).unwrap().expect("fixture user")
    }
}
