// crates/civic-comments-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalogs and translation utilities for the CLI.
// Purpose: Centralize operator-facing strings in every supported locale.
// Dependencies: civic-comments-core (locales), standard library collections.
// ============================================================================

//! ## Overview
//! The CLI stores operator-facing strings in small per-locale catalogs. The
//! locale is chosen once per process (`--lang` or `CIVIC_COMMENTS_LANG`) and
//! all runtime output is routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The process locale is set at most once; later calls are ignored.
//! - Missing keys fall back to English and then to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

pub use civic_comments_core::Locale;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Process-wide CLI locale.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the process locale. Only the first call has an effect.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the process locale, defaulting to English.
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or_default()
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog entries.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "civic-comments {version}"),
    (
        "i18n.disclaimer.machine_translated",
        "Note: non-English CLI messages are translated and may lag behind English.",
    ),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected en, ca or es."),
    ("logging.init_failed", "Failed to initialize logging: {error}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("input.read_failed", "Failed to read {kind} at {path}: {error}"),
    (
        "input.read_too_large",
        "Refusing to read {kind} at {path} because it is {size} bytes (limit {limit}).",
    ),
    ("input.kind.fixtures", "fixtures"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    ("serve.init_failed", "Failed to initialize comments server: {error}"),
    ("serve.failed", "Comments server failed: {error}"),
    ("store.init_failed", "Failed to open store: {error}"),
    (
        "store.memory_not_persistent",
        "The {command} command needs store.type = \"sqlite\"; a memory store is discarded on exit.",
    ),
    ("seed.parse_failed", "Invalid fixtures at {path}: {error}"),
    ("seed.apply_failed", "Failed to seed fixtures: {error}"),
    ("seed.summary_failed", "Failed to render seed summary: {error}"),
    ("session.issue_failed", "Failed to issue session for user {user_id}: {error}"),
    (
        "gid.key_required",
        "The {command} command needs global_id.signing_key_path; an ephemeral key cannot be \
         verified later.",
    ),
    ("gid.signer_failed", "Failed to load signing key: {error}"),
    ("gid.sign_failed", "Failed to sign global id: {error}"),
    ("gid.locate_failed", "Global id could not be located: {error}"),
    ("gid.keygen.exists", "Refusing to overwrite existing key at {path}; pass --force."),
    ("gid.keygen.write_failed", "Failed to write signing key to {path}: {error}"),
    ("gid.keygen.ok", "Wrote signing key to {path} (verifying key {verifying_key})."),
];

/// Catalan catalog entries.
const CATALOG_CA: &[(&str, &str)] = &[
    ("main.version", "civic-comments {version}"),
    (
        "i18n.disclaimer.machine_translated",
        "Nota: els missatges de la CLI que no són en anglès estan traduïts i poden anar \
         endarrerits.",
    ),
    ("i18n.lang.invalid_env", "Valor no vàlid per a {env}: {value}. S'esperava en, ca o es."),
    ("logging.init_failed", "No s'ha pogut inicialitzar el registre: {error}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "sortida"),
    ("output.write_failed", "No s'ha pogut escriure a {stream}: {error}"),
    ("input.read_failed", "No s'ha pogut llegir {kind} a {path}: {error}"),
    (
        "input.read_too_large",
        "No es llegirà {kind} a {path} perquè ocupa {size} bytes (límit {limit}).",
    ),
    ("input.kind.fixtures", "les dades inicials"),
    ("config.load_failed", "No s'ha pogut carregar la configuració: {error}"),
    ("config.validate.ok", "Configuració vàlida."),
    ("serve.init_failed", "No s'ha pogut inicialitzar el servidor de comentaris: {error}"),
    ("serve.failed", "El servidor de comentaris ha fallat: {error}"),
    ("store.init_failed", "No s'ha pogut obrir el magatzem: {error}"),
    (
        "store.memory_not_persistent",
        "L'ordre {command} necessita store.type = \"sqlite\"; un magatzem en memòria es descarta \
         en sortir.",
    ),
    ("seed.parse_failed", "Dades inicials no vàlides a {path}: {error}"),
    ("seed.apply_failed", "No s'han pogut carregar les dades inicials: {error}"),
    ("seed.summary_failed", "No s'ha pogut generar el resum: {error}"),
    ("session.issue_failed", "No s'ha pogut emetre la sessió per a l'usuari {user_id}: {error}"),
    (
        "gid.key_required",
        "L'ordre {command} necessita global_id.signing_key_path; una clau efímera no es pot \
         verificar després.",
    ),
    ("gid.signer_failed", "No s'ha pogut carregar la clau de signatura: {error}"),
    ("gid.sign_failed", "No s'ha pogut signar l'identificador global: {error}"),
    ("gid.locate_failed", "No s'ha pogut localitzar l'identificador global: {error}"),
    ("gid.keygen.exists", "No se sobreescriurà la clau existent a {path}; useu --force."),
    ("gid.keygen.write_failed", "No s'ha pogut escriure la clau de signatura a {path}: {error}"),
    ("gid.keygen.ok", "Clau de signatura escrita a {path} (clau de verificació {verifying_key})."),
];

/// Spanish catalog entries.
const CATALOG_ES: &[(&str, &str)] = &[
    ("main.version", "civic-comments {version}"),
    (
        "i18n.disclaimer.machine_translated",
        "Nota: los mensajes de la CLI que no están en inglés son traducciones y pueden ir \
         retrasados.",
    ),
    ("i18n.lang.invalid_env", "Valor no válido para {env}: {value}. Se esperaba en, ca o es."),
    ("logging.init_failed", "No se pudo inicializar el registro: {error}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "salida"),
    ("output.write_failed", "No se pudo escribir en {stream}: {error}"),
    ("input.read_failed", "No se pudo leer {kind} en {path}: {error}"),
    (
        "input.read_too_large",
        "No se leerá {kind} en {path} porque ocupa {size} bytes (límite {limit}).",
    ),
    ("input.kind.fixtures", "los datos iniciales"),
    ("config.load_failed", "No se pudo cargar la configuración: {error}"),
    ("config.validate.ok", "Configuración válida."),
    ("serve.init_failed", "No se pudo inicializar el servidor de comentarios: {error}"),
    ("serve.failed", "El servidor de comentarios ha fallado: {error}"),
    ("store.init_failed", "No se pudo abrir el almacén: {error}"),
    (
        "store.memory_not_persistent",
        "El comando {command} necesita store.type = \"sqlite\"; un almacén en memoria se descarta \
         al salir.",
    ),
    ("seed.parse_failed", "Datos iniciales no válidos en {path}: {error}"),
    ("seed.apply_failed", "No se pudieron cargar los datos iniciales: {error}"),
    ("seed.summary_failed", "No se pudo generar el resumen: {error}"),
    ("session.issue_failed", "No se pudo emitir la sesión para el usuario {user_id}: {error}"),
    (
        "gid.key_required",
        "El comando {command} necesita global_id.signing_key_path; una clave efímera no se puede \
         verificar después.",
    ),
    ("gid.signer_failed", "No se pudo cargar la clave de firma: {error}"),
    ("gid.sign_failed", "No se pudo firmar el identificador global: {error}"),
    ("gid.locate_failed", "No se pudo localizar el identificador global: {error}"),
    ("gid.keygen.exists", "No se sobrescribirá la clave existente en {path}; use --force."),
    ("gid.keygen.write_failed", "No se pudo escribir la clave de firma en {path}: {error}"),
    ("gid.keygen.ok", "Clave de firma escrita en {path} (clave de verificación {verifying_key})."),
];

/// Returns the catalog for a locale.
fn catalog(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static EN: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CA: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static ES: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => EN.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Ca => CA.get_or_init(|| CATALOG_CA.iter().copied().collect()),
        Locale::Es => ES.get_or_init(|| CATALOG_ES.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` in the process locale while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    translate_in(current_locale(), key, args)
}

/// Translates `key` in an explicit locale while substituting `args`.
#[must_use]
pub fn translate_in(locale: Locale, key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog(locale)
        .get(key)
        .or_else(|| catalog(Locale::En).get(key))
        .copied()
        .unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A localized [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn catalogs_cover_the_same_keys() {
        let english: BTreeSet<&str> = CATALOG_EN.iter().map(|(key, _)| *key).collect();
        for entries in [CATALOG_CA, CATALOG_ES] {
            let keys: BTreeSet<&str> = entries.iter().map(|(key, _)| *key).collect();
            assert_eq!(english, keys);
        }
    }

    #[test]
    fn placeholders_are_substituted_per_locale() {
        let args = vec![MessageArg::new("path", "key.b64")];
        assert_eq!(
            translate_in(Locale::En, "gid.keygen.exists", args.clone()),
            "Refusing to overwrite existing key at key.b64; pass --force."
        );
        assert!(translate_in(Locale::Ca, "gid.keygen.exists", args).contains("key.b64"));
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(translate_in(Locale::Es, "missing.key", Vec::new()), "missing.key");
    }
}
