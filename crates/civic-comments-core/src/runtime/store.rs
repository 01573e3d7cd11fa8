// crates/civic-comments-core/src/runtime/store.rs
// ============================================================================
// Module: Civic Comments In-Memory Store
// Description: In-memory comments backend and shared backend wrapper.
// Purpose: Provide a deterministic backend for tests and the `memory` store type.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryCommentsStore`] implements every store interface over ordered
//! maps behind a single mutex. It enforces the same referential rules as the
//! durable backend so tests exercise realistic failures. Data is lost when the
//! process exits.
//!
//! [`SharedCommentsStore`] wraps any backend in a clonable `Arc` trait object
//! for the HTTP server.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::Comment;
use crate::core::CommentId;
use crate::core::CommentOrder;
use crate::core::Component;
use crate::core::ComponentId;
use crate::core::ListQuery;
use crate::core::NewComment;
use crate::core::Organization;
use crate::core::OrganizationId;
use crate::core::ParticipatoryProcess;
use crate::core::ProcessId;
use crate::core::Resource;
use crate::core::ResourceId;
use crate::core::User;
use crate::core::UserId;
use crate::core::session::is_plausible_session_token;
use crate::core::session::new_session_token;
use crate::core::session::session_fingerprint;
use crate::interfaces::CommentStore;
use crate::interfaces::CommentsBackend;
use crate::interfaces::FixtureWriter;
use crate::interfaces::SessionStore;
use crate::interfaces::SpaceDirectory;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Mutable state of the in-memory store.
#[derive(Debug, Default)]
struct MemoryState {
    /// Organizations by identifier.
    organizations: BTreeMap<OrganizationId, Organization>,
    /// Participatory processes by identifier.
    processes: BTreeMap<ProcessId, ParticipatoryProcess>,
    /// Components by identifier.
    components: BTreeMap<ComponentId, Component>,
    /// Commentable resources by identifier.
    resources: BTreeMap<ResourceId, Resource>,
    /// Users by identifier.
    users: BTreeMap<UserId, User>,
    /// Comments by identifier.
    comments: BTreeMap<CommentId, Comment>,
    /// Session fingerprints mapped to their user.
    sessions: BTreeMap<String, UserId>,
    /// Last assigned comment identifier.
    last_comment_id: u64,
}

/// In-memory comments backend for tests and ephemeral deployments.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCommentsStore {
    /// Store state protected by a mutex.
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryCommentsStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the store state.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Store("comments store mutex poisoned".to_string()))
    }
}

impl SpaceDirectory for InMemoryCommentsStore {
    fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
        Ok(self.lock()?.organizations.get(&id).cloned())
    }

    fn process(&self, id: ProcessId) -> Result<Option<ParticipatoryProcess>, StoreError> {
        Ok(self.lock()?.processes.get(&id).cloned())
    }

    fn component(&self, id: ComponentId) -> Result<Option<Component>, StoreError> {
        Ok(self.lock()?.components.get(&id).cloned())
    }

    fn resource(&self, id: ResourceId) -> Result<Option<Resource>, StoreError> {
        Ok(self.lock()?.resources.get(&id).cloned())
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }
}

impl CommentStore for InMemoryCommentsStore {
    fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut guard = self.lock()?;
        if !guard.resources.contains_key(&comment.root_commentable) {
            return Err(StoreError::Invalid(format!(
                "unknown root resource {}",
                comment.root_commentable
            )));
        }
        if let Some(parent_id) = comment.parent_id
            && !guard.comments.contains_key(&parent_id)
        {
            return Err(StoreError::Invalid(format!("unknown parent comment {parent_id}")));
        }
        if !guard.users.contains_key(&comment.author_id) {
            return Err(StoreError::Invalid(format!("unknown author {}", comment.author_id)));
        }
        let next_id = guard
            .last_comment_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Store("comment identifier space exhausted".to_string()))?;
        guard.last_comment_id = next_id;
        let stored = comment.into_comment(CommentId::new(next_id));
        guard.comments.insert(stored.id, stored.clone());
        drop(guard);
        Ok(stored)
    }

    fn comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        Ok(self.lock()?.comments.get(&id).cloned())
    }

    fn list_comments(
        &self,
        root: ResourceId,
        query: &ListQuery,
    ) -> Result<Vec<Comment>, StoreError> {
        let guard = self.lock()?;
        let matching = guard.comments.values().filter(|comment| {
            comment.root_commentable == root && query.after.is_none_or(|after| comment.id > after)
        });
        let ordered: Vec<Comment> = match query.order {
            CommentOrder::Older => matching.cloned().collect(),
            CommentOrder::Recent => matching.rev().cloned().collect(),
        };
        drop(guard);
        Ok(match query.limit {
            Some(limit) => ordered.into_iter().take(limit).collect(),
            None => ordered,
        })
    }

    fn count_comments(&self, root: ResourceId) -> Result<u64, StoreError> {
        let guard = self.lock()?;
        let count = guard.comments.values().filter(|comment| comment.root_commentable == root).count();
        drop(guard);
        u64::try_from(count).map_err(|_| StoreError::Store("comment count overflow".to_string()))
    }
}

impl SessionStore for InMemoryCommentsStore {
    fn issue_session(&self, user_id: UserId, _now_ms: u64) -> Result<String, StoreError> {
        let mut guard = self.lock()?;
        if !guard.users.contains_key(&user_id) {
            return Err(StoreError::Invalid(format!("unknown user {user_id}")));
        }
        let token = new_session_token();
        guard.sessions.insert(session_fingerprint(&token), user_id);
        drop(guard);
        Ok(token)
    }

    fn resolve_session(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        if !is_plausible_session_token(token) {
            return Ok(None);
        }
        Ok(self.lock()?.sessions.get(&session_fingerprint(token)).copied())
    }
}

impl FixtureWriter for InMemoryCommentsStore {
    fn put_organization(&self, organization: &Organization) -> Result<(), StoreError> {
        self.lock()?.organizations.insert(organization.id, organization.clone());
        Ok(())
    }

    fn put_process(&self, process: &ParticipatoryProcess) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if !guard.organizations.contains_key(&process.organization_id) {
            return Err(StoreError::Invalid(format!(
                "process {} references unknown organization {}",
                process.id, process.organization_id
            )));
        }
        guard.processes.insert(process.id, process.clone());
        drop(guard);
        Ok(())
    }

    fn put_component(&self, component: &Component) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if !guard.processes.contains_key(&component.process_id) {
            return Err(StoreError::Invalid(format!(
                "component {} references unknown process {}",
                component.id, component.process_id
            )));
        }
        guard.components.insert(component.id, component.clone());
        drop(guard);
        Ok(())
    }

    fn put_resource(&self, resource: &Resource) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if !guard.components.contains_key(&resource.component_id) {
            return Err(StoreError::Invalid(format!(
                "resource {} references unknown component {}",
                resource.id, resource.component_id
            )));
        }
        guard.resources.insert(resource.id, resource.clone());
        drop(guard);
        Ok(())
    }

    fn put_user(&self, user: &User) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if !guard.organizations.contains_key(&user.organization_id) {
            return Err(StoreError::Invalid(format!(
                "user {} references unknown organization {}",
                user.id, user.organization_id
            )));
        }
        guard.users.insert(user.id, user.clone());
        drop(guard);
        Ok(())
    }
}

impl CommentsBackend for InMemoryCommentsStore {}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared comments backend backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedCommentsStore {
    /// Inner backend implementation.
    inner: Arc<dyn CommentsBackend>,
}

impl SharedCommentsStore {
    /// Wraps a backend in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl CommentsBackend + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }
}

impl SpaceDirectory for SharedCommentsStore {
    fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
        self.inner.organization(id)
    }

    fn process(&self, id: ProcessId) -> Result<Option<ParticipatoryProcess>, StoreError> {
        self.inner.process(id)
    }

    fn component(&self, id: ComponentId) -> Result<Option<Component>, StoreError> {
        self.inner.component(id)
    }

    fn resource(&self, id: ResourceId) -> Result<Option<Resource>, StoreError> {
        self.inner.resource(id)
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.inner.user(id)
    }
}

impl CommentStore for SharedCommentsStore {
    fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        self.inner.insert_comment(comment)
    }

    fn comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        self.inner.comment(id)
    }

    fn list_comments(
        &self,
        root: ResourceId,
        query: &ListQuery,
    ) -> Result<Vec<Comment>, StoreError> {
        self.inner.list_comments(root, query)
    }

    fn count_comments(&self, root: ResourceId) -> Result<u64, StoreError> {
        self.inner.count_comments(root)
    }
}

impl SessionStore for SharedCommentsStore {
    fn issue_session(&self, user_id: UserId, now_ms: u64) -> Result<String, StoreError> {
        self.inner.issue_session(user_id, now_ms)
    }

    fn resolve_session(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        self.inner.resolve_session(token)
    }
}

impl FixtureWriter for SharedCommentsStore {
    fn put_organization(&self, organization: &Organization) -> Result<(), StoreError> {
        self.inner.put_organization(organization)
    }

    fn put_process(&self, process: &ParticipatoryProcess) -> Result<(), StoreError> {
        self.inner.put_process(process)
    }

    fn put_component(&self, component: &Component) -> Result<(), StoreError> {
        self.inner.put_component(component)
    }

    fn put_resource(&self, resource: &Resource) -> Result<(), StoreError> {
        self.inner.put_resource(resource)
    }

    fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner.put_user(user)
    }
}

impl CommentsBackend for SharedCommentsStore {
    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }
}
