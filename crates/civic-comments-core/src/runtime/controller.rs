// crates/civic-comments-core/src/runtime/controller.rs
// ============================================================================
// Module: Comments Controller
// Description: Index and create actions for comments on commentables.
// Purpose: Enforce the guard chain and produce transport-neutral outcomes.
// Dependencies: crate::core, crate::interfaces, crate::runtime, serde, thiserror
// ============================================================================

//! ## Overview
//! [`CommentsController`] implements the two comment actions independently of
//! any transport. Each action resolves a signed global id, loads the
//! commentable scope, runs the permission guards, and then either renders a
//! page, persists a comment, or returns a redirect carrying a localized alert.
//!
//! Create runs its guards in a fixed order: authentication, global id
//! resolution, permissions, form validation, persistence. Only the last step
//! mutates the store.
//!
//! Outcomes distinguish three failure classes:
//! - business-rule rejections become [`IndexOutcome::Redirect`] or
//!   [`CreateOutcome::Redirect`]
//! - invalid forms become [`CreateOutcome::Invalid`] (rendered error view)
//! - missing authentication and unresolvable commentables become
//!   [`ControllerError`] values that transports surface as hard errors

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::Alignment;
use crate::core::Comment;
use crate::core::CommentId;
use crate::core::CommentOrder;
use crate::core::CommentableRef;
use crate::core::GlobalId;
use crate::core::GlobalIdError;
use crate::core::GlobalIdSigner;
use crate::core::ListQuery;
use crate::core::LocalizedText;
use crate::core::NewComment;
use crate::core::ResourceId;
use crate::core::User;
use crate::i18n::Locale;
use crate::interfaces::CommentStore;
use crate::interfaces::SessionStore;
use crate::interfaces::SpaceDirectory;
use crate::interfaces::StoreError;
use crate::runtime::form::CommentForm;
use crate::runtime::form::FormLimits;
use crate::runtime::permissions::CommentAction;
use crate::runtime::permissions::CommentableContext;
use crate::runtime::permissions::DenialReason;
use crate::runtime::permissions::authorize;
use crate::t;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Rendered view template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// Full comment listing.
    Index,
    /// Partial listing for asynchronous refresh.
    Reload,
    /// Successful create.
    Create,
    /// Form validation failure.
    Error,
}

impl Template {
    /// Returns the template name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Reload => "reload",
            Self::Create => "create",
            Self::Error => "error",
        }
    }
}

/// Index action request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRequest {
    /// Signed global id of the commentable.
    pub commentable_gid: String,
    /// Render the partial reload template.
    pub reload: bool,
    /// Listing order.
    pub order: CommentOrder,
    /// Only list comments newer than this identifier.
    pub after: Option<CommentId>,
    /// Request time in unix milliseconds.
    pub now_ms: u64,
}

/// Create action request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    /// Submitted form.
    pub form: CommentForm,
    /// Request time in unix milliseconds.
    pub now_ms: u64,
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Rendered comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentEntry {
    /// Comment identifier.
    pub id: CommentId,
    /// Parent comment for replies.
    pub parent_id: Option<CommentId>,
    /// Depth below the root commentable.
    pub depth: u32,
    /// Body in the viewer's locale.
    pub body: String,
    /// Author stance.
    pub alignment: Alignment,
    /// Author display name.
    pub author_name: String,
    /// Creation time in unix milliseconds.
    pub created_at_ms: u64,
    /// Signed global id for replying to this comment.
    pub reply_gid: String,
}

/// Rendered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentsPage {
    /// Rendered template.
    pub template: Template,
    /// Signed global id of the listed commentable.
    pub commentable_gid: String,
    /// Root resource of the thread.
    pub root_commentable: ResourceId,
    /// Listing order.
    pub order: CommentOrder,
    /// Listed comments.
    pub comments: Vec<CommentEntry>,
    /// Total comments in the thread.
    pub comments_count: u64,
    /// Highest listed comment identifier (reload cursor).
    pub last_comment_id: Option<CommentId>,
    /// Whether the viewer may post.
    pub can_comment: bool,
    /// Locale used for rendering.
    pub locale: &'static str,
}

/// Redirect with a flash alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    /// Guard that denied the action.
    pub reason: DenialReason,
    /// Localized flash alert.
    pub alert: String,
}

/// Successful create view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedComment {
    /// Rendered template.
    pub template: Template,
    /// Persisted comment.
    pub comment: CommentEntry,
    /// Total comments in the thread after the insert.
    pub comments_count: u64,
}

/// Single rendered validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Form field.
    pub field: &'static str,
    /// Stable error code.
    pub code: &'static str,
    /// Localized message.
    pub message: String,
}

/// Rendered validation failure view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidComment {
    /// Rendered template.
    pub template: Template,
    /// Validation errors in detection order.
    pub errors: Vec<FieldError>,
}

/// Index action outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Listing rendered.
    Rendered(CommentsPage),
    /// Guard rejected the request.
    Redirect(Redirect),
}

/// Create action outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// Comment persisted.
    Created(CreatedComment),
    /// Form rejected; nothing persisted.
    Invalid(InvalidComment),
    /// Guard rejected the request; nothing persisted.
    Redirect(Redirect),
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Controller errors surfaced as transport-level failures.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// No signed-in viewer.
    #[error("authentication required")]
    Unauthorized,
    /// Commentable could not be resolved.
    #[error("routing error: {0}")]
    Routing(String),
    /// Global id could not be signed.
    #[error("global id signing failed: {0}")]
    Signing(String),
    /// Backend failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GlobalIdError> for ControllerError {
    fn from(error: GlobalIdError) -> Self {
        Self::Routing(error.to_string())
    }
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// Comments controller over a store backend.
///
/// # Invariants
/// - Only [`CommentsController::create`] writes to the store, at most once.
/// - Permission guards run before form validation.
#[derive(Debug, Clone)]
pub struct CommentsController<S> {
    /// Store backend.
    store: S,
    /// Global id signer.
    signer: GlobalIdSigner,
    /// Locale used when neither viewer nor organization select one.
    default_locale: Locale,
}

impl<S> CommentsController<S>
where
    S: SpaceDirectory + CommentStore + SessionStore,
{
    /// Creates a controller.
    #[must_use]
    pub const fn new(store: S, signer: GlobalIdSigner, default_locale: Locale) -> Self {
        Self {
            store,
            signer,
            default_locale,
        }
    }

    /// Returns the store backend.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the global id signer.
    #[must_use]
    pub const fn signer(&self) -> &GlobalIdSigner {
        &self.signer
    }

    /// Resolves a session token to the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Store`] when the lookup fails.
    pub fn resolve_viewer(&self, token: Option<&str>) -> Result<Option<User>, ControllerError> {
        let Some(token) = token else {
            return Ok(None);
        };
        let Some(user_id) = self.store.resolve_session(token)? else {
            return Ok(None);
        };
        Ok(self.store.user(user_id)?)
    }

    /// Signs the global id of a commentable.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Signing`] when the token cannot be produced.
    pub fn sign_commentable(
        &self,
        commentable: CommentableRef,
        now_ms: u64,
    ) -> Result<String, ControllerError> {
        let gid = GlobalId::for_commentable(self.signer.app(), commentable);
        self.signer.sign(&gid, now_ms).map_err(|err| ControllerError::Signing(err.to_string()))
    }

    /// Lists the comments of a commentable.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Routing`] when the commentable cannot be
    /// resolved and [`ControllerError::Store`] on backend failure.
    pub fn index(
        &self,
        viewer: Option<&User>,
        request: &IndexRequest,
    ) -> Result<IndexOutcome, ControllerError> {
        let commentable = self.locate(&request.commentable_gid, request.now_ms)?;
        let context = self.load_context(commentable)?;
        let locale = self.locale_for(viewer, &context);
        if let Err(reason) = authorize(CommentAction::Read, &context, viewer) {
            return Ok(IndexOutcome::Redirect(redirect(reason, locale)));
        }
        let query = ListQuery {
            order: request.order,
            after: request.after,
            limit: None,
        };
        let comments = self.store.list_comments(context.resource.id, &query)?;
        let last_comment_id = comments.iter().map(|comment| comment.id).max();
        let entries = comments
            .iter()
            .map(|comment| self.render_comment(comment, locale, request.now_ms))
            .collect::<Result<Vec<_>, _>>()?;
        let comments_count = self.store.count_comments(context.resource.id)?;
        let can_comment = authorize(CommentAction::Create, &context, viewer).is_ok();
        Ok(IndexOutcome::Rendered(CommentsPage {
            template: if request.reload { Template::Reload } else { Template::Index },
            commentable_gid: request.commentable_gid.clone(),
            root_commentable: context.resource.id,
            order: request.order,
            comments: entries,
            comments_count,
            last_comment_id,
            can_comment,
            locale: locale.as_str(),
        }))
    }

    /// Posts a comment.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Unauthorized`] without a viewer,
    /// [`ControllerError::Routing`] when the commentable cannot be resolved,
    /// and [`ControllerError::Store`] on backend failure.
    pub fn create(
        &self,
        viewer: Option<&User>,
        request: &CreateRequest,
    ) -> Result<CreateOutcome, ControllerError> {
        let Some(user) = viewer else {
            return Err(ControllerError::Unauthorized);
        };
        let commentable = self.locate(&request.form.commentable_gid, request.now_ms)?;
        let context = self.load_context(commentable)?;
        let locale = self.locale_for(Some(user), &context);
        if let Err(reason) = authorize(CommentAction::Create, &context, Some(user)) {
            return Ok(CreateOutcome::Redirect(redirect(reason, locale)));
        }
        let limits = FormLimits {
            max_length: context.max_length(),
            parent_depth: context.parent.as_ref().map(|parent| parent.depth),
        };
        let validated = match request.form.validate(limits) {
            Ok(validated) => validated,
            Err(errors) => {
                return Ok(CreateOutcome::Invalid(InvalidComment {
                    template: Template::Error,
                    errors: errors
                        .iter()
                        .map(|error| FieldError {
                            field: error.field(),
                            code: error.code(),
                            message: error.message(locale),
                        })
                        .collect(),
                }));
            }
        };
        let stored = self.store.insert_comment(NewComment {
            commentable,
            root_commentable: context.resource.id,
            parent_id: context.parent.as_ref().map(|parent| parent.id),
            depth: validated.depth,
            author_id: user.id,
            body: LocalizedText::new(locale.as_str(), validated.body),
            alignment: validated.alignment,
            created_at_ms: request.now_ms,
        })?;
        let comments_count = self.store.count_comments(context.resource.id)?;
        Ok(CreateOutcome::Created(CreatedComment {
            template: Template::Create,
            comment: self.render_comment(&stored, locale, request.now_ms)?,
            comments_count,
        }))
    }

    /// Verifies a signed global id and returns its commentable.
    fn locate(&self, token: &str, now_ms: u64) -> Result<CommentableRef, ControllerError> {
        if token.trim().is_empty() {
            return Err(ControllerError::Routing("missing commentable_gid".to_string()));
        }
        Ok(self.signer.locate_signed(token, now_ms)?.commentable())
    }

    /// Loads the full scope of a commentable.
    fn load_context(
        &self,
        commentable: CommentableRef,
    ) -> Result<CommentableContext, ControllerError> {
        let (resource_id, parent) = match commentable {
            CommentableRef::Resource(id) => (id, None),
            CommentableRef::Comment(id) => {
                let parent = self
                    .store
                    .comment(id)?
                    .ok_or_else(|| ControllerError::Routing(format!("comment {id} not found")))?;
                (parent.root_commentable, Some(parent))
            }
        };
        let resource = self
            .store
            .resource(resource_id)?
            .ok_or_else(|| ControllerError::Routing(format!("resource {resource_id} not found")))?;
        let component = self.store.component(resource.component_id)?.ok_or_else(|| {
            StoreError::Corrupt(format!(
                "resource {} references missing component {}",
                resource.id, resource.component_id
            ))
        })?;
        let process = self.store.process(component.process_id)?.ok_or_else(|| {
            StoreError::Corrupt(format!(
                "component {} references missing process {}",
                component.id, component.process_id
            ))
        })?;
        let organization = self.store.organization(process.organization_id)?.ok_or_else(|| {
            StoreError::Corrupt(format!(
                "process {} references missing organization {}",
                process.id, process.organization_id
            ))
        })?;
        Ok(CommentableContext {
            organization,
            process,
            component,
            resource,
            parent,
        })
    }

    /// Picks the rendering locale for a viewer.
    fn locale_for(&self, viewer: Option<&User>, context: &CommentableContext) -> Locale {
        viewer
            .and_then(|user| Locale::parse(&user.locale))
            .or_else(|| Locale::parse(&context.organization.default_locale))
            .unwrap_or(self.default_locale)
    }

    /// Renders a stored comment for the viewer.
    fn render_comment(
        &self,
        comment: &Comment,
        locale: Locale,
        now_ms: u64,
    ) -> Result<CommentEntry, ControllerError> {
        let author_name = match self.store.user(comment.author_id)? {
            Some(author) => author.name,
            None => t!(locale, "comments.author.deleted"),
        };
        Ok(CommentEntry {
            id: comment.id,
            parent_id: comment.parent_id,
            depth: comment.depth,
            body: comment.body.translated(locale.as_str()).unwrap_or_default().to_string(),
            alignment: comment.alignment,
            author_name,
            created_at_ms: comment.created_at_ms,
            reply_gid: self.sign_commentable(CommentableRef::Comment(comment.id), now_ms)?,
        })
    }
}

/// Builds a redirect for a denial.
fn redirect(reason: DenialReason, locale: Locale) -> Redirect {
    Redirect {
        reason,
        alert: reason.alert(locale),
    }
}
