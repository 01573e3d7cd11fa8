// crates/civic-comments-cli/src/logging.rs
// ============================================================================
// Module: CLI Logging
// Description: Installs the tracing subscriber used by every command.
// Purpose: Route operational logs to stderr with a verbosity-driven filter.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! Operational logs go to stderr so stdout stays reserved for command output
//! (tokens, JSON summaries). `RUST_LOG` overrides the `-v` count when set.
//!
//! | `-v` count | Default directive |
//! |---|---|
//! | 0 | `warn` |
//! | 1 | `info` |
//! | 2 | `debug` |
//! | 3+ | `trace` |

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Filters
// ============================================================================

/// Returns the default filter directive for a verbosity count.
#[must_use]
pub const fn directive_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Builds the filter, preferring `RUST_LOG` when it parses.
#[must_use]
pub fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(verbosity)))
}

// ============================================================================
// SECTION: Installation
// ============================================================================

/// Installs the global stderr subscriber.
///
/// # Errors
///
/// Returns a message when a global subscriber is already installed.
pub fn init_tracing(verbosity: u8) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| err.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_escalates_and_saturates() {
        assert_eq!(directive_for_verbosity(0), "warn");
        assert_eq!(directive_for_verbosity(1), "info");
        assert_eq!(directive_for_verbosity(2), "debug");
        assert_eq!(directive_for_verbosity(3), "trace");
        assert_eq!(directive_for_verbosity(u8::MAX), "trace");
    }
}
