//! Section validation tests for civic-comments-config.
// crates/civic-comments-config/tests/section_validation.rs
// =============================================================================
// Module: Config Section Validation Tests
// Description: Validate server, store, global id, and i18n sections.
// Purpose: Ensure inconsistent settings are rejected before startup.
// =============================================================================

use civic_comments_config::CommentsConfig;
use civic_comments_config::ConfigError;
use civic_comments_core::Locale;
use civic_comments_store_sqlite::SqliteStoreMode;
use civic_comments_store_sqlite::SqliteSyncMode;

type TestResult = Result<(), String>;

fn parse(toml: &str) -> Result<CommentsConfig, ConfigError> {
    CommentsConfig::from_toml_bytes(toml.as_bytes())
}

fn assert_invalid(toml: &str, needle: &str) -> TestResult {
    match parse(toml) {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err(format!("expected invalid config for {toml}")),
    }
}

#[test]
fn server_rejects_bad_bind() -> TestResult {
    assert_invalid("[server]\nbind = \"localhost\"\n", "invalid server.bind")
}

#[test]
fn server_rejects_zero_body_limit() -> TestResult {
    assert_invalid("[server]\nmax_body_bytes = 0\n", "max_body_bytes must be greater than zero")
}

#[test]
fn server_rejects_cookie_with_separators() -> TestResult {
    assert_invalid("[server]\nsession_cookie = \"a=b\"\n", "session_cookie must be alphanumeric")
}

#[test]
fn memory_store_rejects_path() -> TestResult {
    assert_invalid("[store]\ntype = \"memory\"\npath = \"x.db\"\n", "memory store must not set path")
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    assert_invalid("[store]\ntype = \"sqlite\"\n", "sqlite store requires path")
}

#[test]
fn sqlite_store_maps_to_store_config() -> TestResult {
    let config = parse(
        "[store]\ntype = \"sqlite\"\npath = \"data/comments.sqlite\"\njournal_mode = \
         \"delete\"\nsync_mode = \"normal\"\nbusy_timeout_ms = 250\n",
    )
    .map_err(|err| err.to_string())?;
    let sqlite = config.store.sqlite().ok_or("expected sqlite config")?;
    if sqlite.journal_mode != SqliteStoreMode::Delete
        || sqlite.sync_mode != SqliteSyncMode::Normal
        || sqlite.busy_timeout_ms != 250
    {
        return Err(format!("unexpected sqlite config: {sqlite:?}"));
    }
    Ok(())
}

#[test]
fn global_id_rejects_zero_expiry() -> TestResult {
    assert_invalid("[global_id]\nexpires_in_secs = 0\n", "expires_in_secs must be greater than zero")
}

#[test]
fn global_id_rejects_app_with_slashes() -> TestResult {
    assert_invalid("[global_id]\napp = \"civic/comments\"\n", "global_id.app must be alphanumeric")
}

#[test]
fn global_id_expiry_converts_to_millis() -> TestResult {
    let config = parse("[global_id]\nexpires_in_secs = 60\n").map_err(|err| err.to_string())?;
    if config.global_id.expires_in_ms() != Some(60_000) {
        return Err("expected 60000 ms expiry".to_string());
    }
    Ok(())
}

#[test]
fn i18n_rejects_unsupported_locale() -> TestResult {
    assert_invalid("[i18n]\ndefault_locale = \"fr\"\n", "unsupported i18n.default_locale")
}

#[test]
fn i18n_accepts_catalan() -> TestResult {
    let config = parse("[i18n]\ndefault_locale = \"ca\"\n").map_err(|err| err.to_string())?;
    if config.i18n.locale() != Locale::Ca {
        return Err("expected catalan default".to_string());
    }
    Ok(())
}
