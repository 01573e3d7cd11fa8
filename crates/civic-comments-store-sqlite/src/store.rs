// crates/civic-comments-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Comments Store
// Description: Durable comments backend backed by SQLite WAL.
// Purpose: Persist spaces, sessions, and comments with integrity checks.
// Dependencies: civic-comments-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements every `civic-comments-core` store interface on top
//! of `SQLite`. Comment bodies are stored as JSON next to a content hash; loads
//! verify the hash and fail closed on corruption. Referential integrity is
//! enforced with foreign keys, so seeding records out of order is rejected.
//!
//! Security posture: database contents are untrusted. Identifiers are range
//! checked in both directions and session tokens are stored as fingerprints.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use civic_comments_core::Alignment;
use civic_comments_core::Comment;
use civic_comments_core::CommentId;
use civic_comments_core::CommentOrder;
use civic_comments_core::CommentStore;
use civic_comments_core::CommentableRef;
use civic_comments_core::CommentsBackend;
use civic_comments_core::Component;
use civic_comments_core::ComponentId;
use civic_comments_core::ComponentSettings;
use civic_comments_core::FixtureWriter;
use civic_comments_core::ListQuery;
use civic_comments_core::LocalizedText;
use civic_comments_core::NewComment;
use civic_comments_core::Organization;
use civic_comments_core::OrganizationId;
use civic_comments_core::ParticipatoryProcess;
use civic_comments_core::ProcessId;
use civic_comments_core::ProcessVisibility;
use civic_comments_core::Resource;
use civic_comments_core::ResourceId;
use civic_comments_core::SessionStore;
use civic_comments_core::SpaceDirectory;
use civic_comments_core::StoreError;
use civic_comments_core::User;
use civic_comments_core::UserId;
use civic_comments_core::hashing::DEFAULT_HASH_ALGORITHM;
use civic_comments_core::hashing::HashAlgorithm;
use civic_comments_core::hashing::HashDigest;
use civic_comments_core::hashing::hash_bytes;
use civic_comments_core::session::is_plausible_session_token;
use civic_comments_core::session::new_session_token;
use civic_comments_core::session::session_fingerprint;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum serialized comment body size accepted by the store.
pub const MAX_BODY_BYTES: usize = 64 * 1024;
/// Columns selected for comment rows.
const COMMENT_COLUMNS: &str = "id, commentable_type, commentable_id, root_resource_id, \
                               parent_id, depth, author_id, body_json, body_hash, \
                               hash_algorithm, alignment, created_at_ms";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` comments store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Returns a configuration with default pragmas for `path`.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding comment bodies or session tokens.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or rejected write.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Comment body exceeded the size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "body_json exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

/// Maps a `rusqlite` error, classifying constraint violations as invalid writes.
fn db_error(err: &rusqlite::Error) -> SqliteStoreError {
    if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        return SqliteStoreError::Invalid(err.to_string());
    }
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed comments store with WAL support.
///
/// # Invariants
/// - Comment loads verify stored body hashes before deserialization.
/// - `SQLite` connection access is serialized through a mutex.
#[derive(Clone)]
pub struct SqliteCommentsStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCommentsStore {
    /// Opens an `SQLite`-backed comments store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the database path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))
    }

    /// Verifies the store can execute a simple SQL statement.
    fn check_connection(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map_err(|err| db_error(&err))?;
        drop(guard);
        Ok(())
    }

    /// Loads a participatory process and its participants.
    fn load_process(&self, id: ProcessId) -> Result<Option<ParticipatoryProcess>, SqliteStoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT id, organization_id, slug, visibility FROM participatory_processes WHERE \
                 id = ?1",
                params![to_sql_id(id.get())?],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        let Some((raw_id, organization_id, slug, visibility)) = row else {
            return Ok(None);
        };
        let mut statement = guard
            .prepare("SELECT user_id FROM process_participants WHERE process_id = ?1")
            .map_err(|err| db_error(&err))?;
        let raw_participants = statement
            .query_map(params![raw_id], |row| row.get::<_, i64>(0))
            .map_err(|err| db_error(&err))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| db_error(&err))?;
        drop(statement);
        drop(guard);
        let mut participants = BTreeSet::new();
        for raw in raw_participants {
            participants.insert(UserId::new(from_sql_id(raw, "process_participants.user_id")?));
        }
        let visibility = ProcessVisibility::parse(&visibility).ok_or_else(|| {
            SqliteStoreError::Corrupt(format!("invalid visibility for process {raw_id}"))
        })?;
        Ok(Some(ParticipatoryProcess {
            id: ProcessId::new(from_sql_id(raw_id, "participatory_processes.id")?),
            organization_id: OrganizationId::new(from_sql_id(
                organization_id,
                "participatory_processes.organization_id",
            )?),
            slug,
            visibility,
            participants,
        }))
    }

    /// Inserts a comment row.
    fn insert_comment_row(&self, comment: NewComment) -> Result<Comment, SqliteStoreError> {
        let body_json =
            serde_json::to_vec(&comment.body).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if body_json.len() > MAX_BODY_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_BODY_BYTES,
                actual_bytes: body_json.len(),
            });
        }
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &body_json);
        let parent_id = comment.parent_id.map(|id| to_sql_id(id.get())).transpose()?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        if let CommentableRef::Comment(parent) = comment.commentable {
            let parent_root: Option<i64> = tx
                .query_row(
                    "SELECT root_resource_id FROM comments WHERE id = ?1",
                    params![to_sql_id(parent.get())?],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| db_error(&err))?;
            if parent_root != Some(to_sql_id(comment.root_commentable.get())?) {
                return Err(SqliteStoreError::Invalid(format!(
                    "parent comment {parent} is not in thread {}",
                    comment.root_commentable
                )));
            }
        }
        tx.execute(
            "INSERT INTO comments (commentable_type, commentable_id, root_resource_id, parent_id, \
             depth, author_id, body_json, body_hash, hash_algorithm, alignment, created_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                comment.commentable.type_label(),
                to_sql_id(comment.commentable.raw_id())?,
                to_sql_id(comment.root_commentable.get())?,
                parent_id,
                i64::from(comment.depth),
                to_sql_id(comment.author_id.get())?,
                body_json,
                digest.value,
                digest.algorithm.label(),
                comment.alignment.value(),
                to_sql_id(comment.created_at_ms)?,
            ],
        )
        .map_err(|err| db_error(&err))?;
        let raw_id = tx.last_insert_rowid();
        tx.commit().map_err(|err| db_error(&err))?;
        drop(guard);
        let id = CommentId::new(from_sql_id(raw_id, "comments.id")?);
        Ok(comment.into_comment(id))
    }

    /// Loads a comment row by identifier.
    fn load_comment(&self, id: CommentId) -> Result<Option<Comment>, SqliteStoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
                params![to_sql_id(id.get())?],
                CommentRow::from_row,
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        drop(guard);
        row.map(CommentRow::into_comment).transpose()
    }

    /// Lists comment rows of a thread.
    fn load_comments(
        &self,
        root: ResourceId,
        query: &ListQuery,
    ) -> Result<Vec<Comment>, SqliteStoreError> {
        let direction = match query.order {
            CommentOrder::Older => "ASC",
            CommentOrder::Recent => "DESC",
        };
        let after = query.after.map_or(Ok(0), |after| to_sql_id(after.get()))?;
        let limit = match query.limit {
            Some(limit) => i64::try_from(limit)
                .map_err(|_| SqliteStoreError::Invalid("list limit too large".to_string()))?,
            None => -1,
        };
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(&format!(
                "SELECT {COMMENT_COLUMNS} FROM comments WHERE root_resource_id = ?1 AND id > ?2 \
                 ORDER BY id {direction} LIMIT ?3"
            ))
            .map_err(|err| db_error(&err))?;
        let rows = statement
            .query_map(params![to_sql_id(root.get())?, after, limit], CommentRow::from_row)
            .map_err(|err| db_error(&err))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| db_error(&err))?;
        drop(statement);
        drop(guard);
        rows.into_iter().map(CommentRow::into_comment).collect()
    }

    /// Counts comment rows of a thread.
    fn count_rows(&self, root: ResourceId) -> Result<u64, SqliteStoreError> {
        let guard = self.lock()?;
        let count: i64 = guard
            .query_row(
                "SELECT COUNT(1) FROM comments WHERE root_resource_id = ?1",
                params![to_sql_id(root.get())?],
                |row| row.get(0),
            )
            .map_err(|err| db_error(&err))?;
        drop(guard);
        from_sql_id(count, "comments.count")
    }

    /// Upserts a process and replaces its participants.
    fn upsert_process(&self, process: &ParticipatoryProcess) -> Result<(), SqliteStoreError> {
        let process_id = to_sql_id(process.id.get())?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        tx.execute(
            "INSERT INTO participatory_processes (id, organization_id, slug, visibility) VALUES \
             (?1, ?2, ?3, ?4) ON CONFLICT(id) DO UPDATE SET organization_id = \
             excluded.organization_id, slug = excluded.slug, visibility = excluded.visibility",
            params![
                process_id,
                to_sql_id(process.organization_id.get())?,
                process.slug,
                process.visibility.as_str()
            ],
        )
        .map_err(|err| db_error(&err))?;
        tx.execute("DELETE FROM process_participants WHERE process_id = ?1", params![process_id])
            .map_err(|err| db_error(&err))?;
        for participant in &process.participants {
            tx.execute(
                "INSERT INTO process_participants (process_id, user_id) VALUES (?1, ?2)",
                params![process_id, to_sql_id(participant.get())?],
            )
            .map_err(|err| db_error(&err))?;
        }
        tx.commit().map_err(|err| db_error(&err))?;
        drop(guard);
        Ok(())
    }

    /// Executes a single write statement.
    fn execute(&self, sql: &str, values: &[&dyn rusqlite::ToSql]) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.execute(sql, values).map_err(|err| db_error(&err))?;
        drop(guard);
        Ok(())
    }

    /// Runs a single-row query.
    fn query_one<T>(
        &self,
        sql: &str,
        id: u64,
        map: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>, SqliteStoreError> {
        let guard = self.lock()?;
        let value =
            guard.query_row(sql, params![to_sql_id(id)?], map).optional().map_err(|err| db_error(&err))?;
        drop(guard);
        Ok(value)
    }
}

// ============================================================================
// SECTION: Interface Implementations
// ============================================================================

impl SpaceDirectory for SqliteCommentsStore {
    fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
        let row = self.query_one(
            "SELECT name, default_locale, comments_max_length FROM organizations WHERE id = ?1",
            id.get(),
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?)),
        )?;
        let Some((name, default_locale, max_length)) = row else {
            return Ok(None);
        };
        Ok(Some(Organization {
            id,
            name,
            default_locale,
            comments_max_length: to_u32(max_length, "organizations.comments_max_length")?,
        }))
    }

    fn process(&self, id: ProcessId) -> Result<Option<ParticipatoryProcess>, StoreError> {
        self.load_process(id).map_err(StoreError::from)
    }

    fn component(&self, id: ComponentId) -> Result<Option<Component>, StoreError> {
        let row = self.query_one(
            "SELECT process_id, name, comments_enabled, comments_blocked, comments_max_length \
             FROM components WHERE id = ?1",
            id.get(),
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                ))
            },
        )?;
        let Some((process_id, name, comments_enabled, comments_blocked, max_length)) = row else {
            return Ok(None);
        };
        Ok(Some(Component {
            id,
            process_id: ProcessId::new(from_sql_id(process_id, "components.process_id")?),
            name,
            settings: ComponentSettings {
                comments_enabled,
                comments_blocked,
                comments_max_length: max_length
                    .map(|value| to_u32(value, "components.comments_max_length"))
                    .transpose()?,
            },
        }))
    }

    fn resource(&self, id: ResourceId) -> Result<Option<Resource>, StoreError> {
        let row = self.query_one(
            "SELECT component_id, title FROM resources WHERE id = ?1",
            id.get(),
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )?;
        let Some((component_id, title)) = row else {
            return Ok(None);
        };
        Ok(Some(Resource {
            id,
            component_id: ComponentId::new(from_sql_id(component_id, "resources.component_id")?),
            title,
        }))
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = self.query_one(
            "SELECT organization_id, name, locale, confirmed FROM users WHERE id = ?1",
            id.get(),
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                ))
            },
        )?;
        let Some((organization_id, name, locale, confirmed)) = row else {
            return Ok(None);
        };
        Ok(Some(User {
            id,
            organization_id: OrganizationId::new(from_sql_id(
                organization_id,
                "users.organization_id",
            )?),
            name,
            locale,
            confirmed,
        }))
    }
}

impl CommentStore for SqliteCommentsStore {
    fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        self.insert_comment_row(comment).map_err(StoreError::from)
    }

    fn comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        self.load_comment(id).map_err(StoreError::from)
    }

    fn list_comments(
        &self,
        root: ResourceId,
        query: &ListQuery,
    ) -> Result<Vec<Comment>, StoreError> {
        self.load_comments(root, query).map_err(StoreError::from)
    }

    fn count_comments(&self, root: ResourceId) -> Result<u64, StoreError> {
        self.count_rows(root).map_err(StoreError::from)
    }
}

impl SessionStore for SqliteCommentsStore {
    fn issue_session(&self, user_id: UserId, now_ms: u64) -> Result<String, StoreError> {
        let token = new_session_token();
        self.execute(
            "INSERT INTO sessions (token_hash, user_id, created_at_ms) VALUES (?1, ?2, ?3)",
            params![session_fingerprint(&token), to_sql_id(user_id.get())?, to_sql_id(now_ms)?],
        )?;
        Ok(token)
    }

    fn resolve_session(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        if !is_plausible_session_token(token) {
            return Ok(None);
        }
        let guard = self.lock()?;
        let user_id: Option<i64> = guard
            .query_row(
                "SELECT user_id FROM sessions WHERE token_hash = ?1",
                params![session_fingerprint(token)],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        drop(guard);
        Ok(user_id.map(|raw| from_sql_id(raw, "sessions.user_id")).transpose()?.map(UserId::new))
    }
}

impl FixtureWriter for SqliteCommentsStore {
    fn put_organization(&self, organization: &Organization) -> Result<(), StoreError> {
        self.execute(
            "INSERT INTO organizations (id, name, default_locale, comments_max_length) VALUES \
             (?1, ?2, ?3, ?4) ON CONFLICT(id) DO UPDATE SET name = excluded.name, default_locale \
             = excluded.default_locale, comments_max_length = excluded.comments_max_length",
            params![
                to_sql_id(organization.id.get())?,
                organization.name,
                organization.default_locale,
                i64::from(organization.comments_max_length)
            ],
        )
        .map_err(StoreError::from)
    }

    fn put_process(&self, process: &ParticipatoryProcess) -> Result<(), StoreError> {
        self.upsert_process(process).map_err(StoreError::from)
    }

    fn put_component(&self, component: &Component) -> Result<(), StoreError> {
        self.execute(
            "INSERT INTO components (id, process_id, name, comments_enabled, comments_blocked, \
             comments_max_length) VALUES (?1, ?2, ?3, ?4, ?5, ?6) ON CONFLICT(id) DO UPDATE SET \
             process_id = excluded.process_id, name = excluded.name, comments_enabled = \
             excluded.comments_enabled, comments_blocked = excluded.comments_blocked, \
             comments_max_length = excluded.comments_max_length",
            params![
                to_sql_id(component.id.get())?,
                to_sql_id(component.process_id.get())?,
                component.name,
                component.settings.comments_enabled,
                component.settings.comments_blocked,
                component.settings.comments_max_length.map(i64::from)
            ],
        )
        .map_err(StoreError::from)
    }

    fn put_resource(&self, resource: &Resource) -> Result<(), StoreError> {
        self.execute(
            "INSERT INTO resources (id, component_id, title) VALUES (?1, ?2, ?3) ON CONFLICT(id) \
             DO UPDATE SET component_id = excluded.component_id, title = excluded.title",
            params![to_sql_id(resource.id.get())?, to_sql_id(resource.component_id.get())?, resource.title],
        )
        .map_err(StoreError::from)
    }

    fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.execute(
            "INSERT INTO users (id, organization_id, name, locale, confirmed) VALUES (?1, ?2, ?3, \
             ?4, ?5) ON CONFLICT(id) DO UPDATE SET organization_id = excluded.organization_id, \
             name = excluded.name, locale = excluded.locale, confirmed = excluded.confirmed",
            params![
                to_sql_id(user.id.get())?,
                to_sql_id(user.organization_id.get())?,
                user.name,
                user.locale,
                user.confirmed
            ],
        )
        .map_err(StoreError::from)
    }
}

impl CommentsBackend for SqliteCommentsStore {
    fn readiness(&self) -> Result<(), StoreError> {
        self.check_connection().map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Comment Rows
// ============================================================================

/// Raw comment row prior to integrity checks.
#[derive(Debug)]
struct CommentRow {
    /// Comment identifier.
    id: i64,
    /// Commentable type label.
    commentable_type: String,
    /// Commentable identifier.
    commentable_id: i64,
    /// Root resource identifier.
    root_resource_id: i64,
    /// Parent comment identifier.
    parent_id: Option<i64>,
    /// Reply depth.
    depth: i64,
    /// Author identifier.
    author_id: i64,
    /// Serialized localized body.
    body_json: Vec<u8>,
    /// Stored body hash.
    body_hash: String,
    /// Stored hash algorithm label.
    hash_algorithm: String,
    /// Stored alignment value.
    alignment: i64,
    /// Creation time.
    created_at_ms: i64,
}

impl CommentRow {
    /// Reads a row selected with [`COMMENT_COLUMNS`].
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            commentable_type: row.get(1)?,
            commentable_id: row.get(2)?,
            root_resource_id: row.get(3)?,
            parent_id: row.get(4)?,
            depth: row.get(5)?,
            author_id: row.get(6)?,
            body_json: row.get(7)?,
            body_hash: row.get(8)?,
            hash_algorithm: row.get(9)?,
            alignment: row.get(10)?,
            created_at_ms: row.get(11)?,
        })
    }

    /// Verifies integrity and converts the row into a comment.
    fn into_comment(self) -> Result<Comment, SqliteStoreError> {
        let algorithm = HashAlgorithm::from_label(&self.hash_algorithm).ok_or_else(|| {
            SqliteStoreError::Invalid(format!("unsupported hash algorithm: {}", self.hash_algorithm))
        })?;
        if self.body_json.len() > MAX_BODY_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_BODY_BYTES,
                actual_bytes: self.body_json.len(),
            });
        }
        let digest = HashDigest {
            algorithm,
            value: self.body_hash,
        };
        if !digest.matches(&self.body_json) {
            return Err(SqliteStoreError::Corrupt(format!("body hash mismatch for comment {}", self.id)));
        }
        let body: LocalizedText = serde_json::from_slice(&self.body_json)
            .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
        let commentable = CommentableRef::from_parts(
            &self.commentable_type,
            from_sql_id(self.commentable_id, "comments.commentable_id")?,
        )
        .ok_or_else(|| {
            SqliteStoreError::Corrupt(format!("invalid commentable type for comment {}", self.id))
        })?;
        let alignment = Alignment::from_value(self.alignment).ok_or_else(|| {
            SqliteStoreError::Corrupt(format!("invalid alignment for comment {}", self.id))
        })?;
        Ok(Comment {
            id: CommentId::new(from_sql_id(self.id, "comments.id")?),
            commentable,
            root_commentable: ResourceId::new(from_sql_id(
                self.root_resource_id,
                "comments.root_resource_id",
            )?),
            parent_id: self
                .parent_id
                .map(|raw| from_sql_id(raw, "comments.parent_id").map(CommentId::new))
                .transpose()?,
            depth: to_u32(self.depth, "comments.depth")?,
            author_id: UserId::new(from_sql_id(self.author_id, "comments.author_id")?),
            body,
            alignment,
            created_at_ms: from_sql_id(self.created_at_ms, "comments.created_at_ms")?,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts an identifier to its `SQLite` representation.
fn to_sql_id(value: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(value)
        .map_err(|_| SqliteStoreError::Invalid(format!("identifier out of range: {value}")))
}

/// Converts a stored integer to an unsigned value.
fn from_sql_id(value: i64, column: &str) -> Result<u64, SqliteStoreError> {
    u64::try_from(value)
        .map_err(|_| SqliteStoreError::Corrupt(format!("negative value in {column}: {value}")))
}

/// Converts a stored integer to `u32`.
fn to_u32(value: i64, column: &str) -> Result<u32, SqliteStoreError> {
    u32::try_from(value)
        .map_err(|_| SqliteStoreError::Corrupt(format!("value out of range in {column}: {value}")))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| db_error(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_error(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_error(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_error(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS organizations (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    default_locale TEXT NOT NULL,
                    comments_max_length INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY,
                    organization_id INTEGER NOT NULL REFERENCES organizations(id),
                    name TEXT NOT NULL,
                    locale TEXT NOT NULL,
                    confirmed INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS participatory_processes (
                    id INTEGER PRIMARY KEY,
                    organization_id INTEGER NOT NULL REFERENCES organizations(id),
                    slug TEXT NOT NULL,
                    visibility TEXT NOT NULL CHECK (visibility IN ('public', 'private'))
                );
                CREATE TABLE IF NOT EXISTS process_participants (
                    process_id INTEGER NOT NULL
                        REFERENCES participatory_processes(id) ON DELETE CASCADE,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    PRIMARY KEY (process_id, user_id)
                );
                CREATE TABLE IF NOT EXISTS components (
                    id INTEGER PRIMARY KEY,
                    process_id INTEGER NOT NULL REFERENCES participatory_processes(id),
                    name TEXT NOT NULL,
                    comments_enabled INTEGER NOT NULL,
                    comments_blocked INTEGER NOT NULL,
                    comments_max_length INTEGER
                );
                CREATE TABLE IF NOT EXISTS resources (
                    id INTEGER PRIMARY KEY,
                    component_id INTEGER NOT NULL REFERENCES components(id),
                    title TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS sessions (
                    token_hash TEXT PRIMARY KEY,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    created_at_ms INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS comments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    commentable_type TEXT NOT NULL
                        CHECK (commentable_type IN ('resource', 'comment')),
                    commentable_id INTEGER NOT NULL,
                    root_resource_id INTEGER NOT NULL REFERENCES resources(id),
                    parent_id INTEGER REFERENCES comments(id),
                    depth INTEGER NOT NULL CHECK (depth >= 0),
                    author_id INTEGER NOT NULL REFERENCES users(id),
                    body_json BLOB NOT NULL,
                    body_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    alignment INTEGER NOT NULL CHECK (alignment IN (-1, 0, 1)),
                    created_at_ms INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_comments_root
                    ON comments (root_resource_id, id);",
            )
            .map_err(|err| db_error(&err))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| db_error(&err))?;
    Ok(())
}
