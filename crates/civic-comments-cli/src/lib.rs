// crates/civic-comments-cli/src/lib.rs
// ============================================================================
// Module: Civic Comments CLI Library
// Description: Shared helpers for the Civic Comments command-line interface.
// Purpose: Provide reusable components (i18n, logging) for the CLI binary and tests.
// Dependencies: civic-comments-core, tracing-subscriber
// ============================================================================

//! ## Overview
//! This library module houses shared CLI utilities: the localized message
//! catalog for operator-facing output and the tracing subscriber setup. The
//! binary entry point (`src/main.rs`) imports these helpers to keep all
//! user-facing output consistent.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Internationalization helpers and message catalog.
pub mod i18n;
/// Tracing subscriber installation.
pub mod logging;
