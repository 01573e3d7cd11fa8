// crates/civic-comments-config/src/config.rs
// ============================================================================
// Module: Civic Comments Configuration
// Description: Configuration loading and validation for the comments service.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: civic-comments-core, civic-comments-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional; an absent file section falls back to defaults
//! that run an in-memory store on loopback.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use civic_comments_core::Locale;
use civic_comments_core::global_id::DEFAULT_APP;
use civic_comments_store_sqlite::SqliteStoreConfig;
use civic_comments_store_sqlite::SqliteStoreMode;
use civic_comments_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "civic-comments.toml";
/// Environment variable overriding the configuration path.
pub const CONFIG_ENV_VAR: &str = "CIVIC_COMMENTS_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
/// Upper bound for `server.max_body_bytes`.
const MAX_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Default session cookie name.
const DEFAULT_SESSION_COOKIE: &str = "civic_session";
/// Maximum session cookie name length.
const MAX_COOKIE_NAME_LENGTH: usize = 64;
/// Default busy timeout for `SQLite` stores.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum global id app name length.
const MAX_APP_NAME_LENGTH: usize = 64;
/// Maximum signed gid lifetime (one year).
const MAX_EXPIRES_IN_SECS: u64 = 365 * 24 * 60 * 60;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Comments service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentsConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Backend store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Signed global id configuration.
    #[serde(default)]
    pub global_id: GlobalIdConfig,
    /// Localization configuration.
    #[serde(default)]
    pub i18n: I18nConfig,
}

impl CommentsConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `CIVIC_COMMENTS_CONFIG`, then
    /// `civic-comments.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        Self::from_toml_bytes(&bytes)
    }

    /// Parses and validates configuration from TOML bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.global_id.validate()?;
        self.i18n.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Cookie carrying the session token.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            session_cookie: default_session_cookie(),
            audit: AuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid server.bind: {}", self.bind)))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid("max_body_bytes exceeds limit".to_string()));
        }
        let cookie = self.session_cookie.as_str();
        if cookie.is_empty() || cookie.len() > MAX_COOKIE_NAME_LENGTH {
            return Err(ConfigError::Invalid("session_cookie length out of range".to_string()));
        }
        if !cookie.bytes().all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-')) {
            return Err(ConfigError::Invalid(
                "session_cookie must be alphanumeric, '_' or '-'".to_string(),
            ));
        }
        self.audit.validate()
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Enables audit events.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional JSON lines file; stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Backend store type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// In-memory store (lost on restart).
    #[default]
    Memory,
    /// `SQLite` store.
    Sqlite,
}

/// Backend store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store backend.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::Memory,
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the `SQLite` configuration when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (StoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory store must not set path".to_string()));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_path_string("store.path", &path.to_string_lossy())?;
                if self.busy_timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "store.busy_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// SECTION: Global Ids
// ============================================================================

/// Signed global id configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalIdConfig {
    /// Application name embedded in `gid://` URIs.
    #[serde(default = "default_app")]
    pub app: String,
    /// Ed25519 signing key file (32 raw bytes or base64 text).
    #[serde(default)]
    pub signing_key_path: Option<String>,
    /// Lifetime of signed gids; unset means they never expire.
    #[serde(default)]
    pub expires_in_secs: Option<u64>,
}

impl Default for GlobalIdConfig {
    fn default() -> Self {
        Self {
            app: default_app(),
            signing_key_path: None,
            expires_in_secs: None,
        }
    }
}

impl GlobalIdConfig {
    /// Returns the signed gid lifetime in milliseconds.
    #[must_use]
    pub fn expires_in_ms(&self) -> Option<u64> {
        self.expires_in_secs.map(|secs| secs.saturating_mul(1_000))
    }

    /// Validates global id configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let app = self.app.as_str();
        if app.is_empty() || app.len() > MAX_APP_NAME_LENGTH {
            return Err(ConfigError::Invalid("global_id.app length out of range".to_string()));
        }
        if !app.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'-') {
            return Err(ConfigError::Invalid(
                "global_id.app must be alphanumeric or '-'".to_string(),
            ));
        }
        if let Some(path) = &self.signing_key_path {
            validate_path_string("global_id.signing_key_path", path)?;
        }
        match self.expires_in_secs {
            Some(0) => Err(ConfigError::Invalid(
                "global_id.expires_in_secs must be greater than zero".to_string(),
            )),
            Some(secs) if secs > MAX_EXPIRES_IN_SECS => Err(ConfigError::Invalid(
                "global_id.expires_in_secs exceeds one year".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Localization
// ============================================================================

/// Localization configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct I18nConfig {
    /// Locale used when neither the viewer nor the organization picks one.
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
        }
    }
}

impl I18nConfig {
    /// Returns the configured default locale.
    #[must_use]
    pub fn locale(&self) -> Locale {
        Locale::parse_or(&self.default_locale, Locale::En)
    }

    /// Validates localization configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if Locale::parse(&self.default_locale).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unsupported i18n.default_locale: {}",
                self.default_locale
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default session cookie name.
fn default_session_cookie() -> String {
    DEFAULT_SESSION_COOKIE.to_string()
}

/// Audit events are on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}

/// Default `SQLite` busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Default global id app name.
fn default_app() -> String {
    DEFAULT_APP.to_string()
}

/// Default locale label.
fn default_locale() -> String {
    Locale::En.as_str().to_string()
}
