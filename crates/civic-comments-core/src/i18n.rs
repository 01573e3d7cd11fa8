// crates/civic-comments-core/src/i18n.rs
// ============================================================================
// Module: Comment Message Localization
// Description: Message catalogs for flash alerts and validation errors.
// Purpose: Render user-facing comment messages in the viewer's locale.
// Dependencies: Standard library collections.
// ============================================================================

//! ## Overview
//! Every message a participant can see (flash alerts raised by permission
//! guards, form validation errors, placeholder author names) is looked up in a
//! per-locale catalog through the [`t!`](crate::t) macro. Unlike a process-wide
//! CLI locale, the locale here is chosen per request from the viewer.
//!
//! ## Invariants
//! - Catalogs are initialized once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Locales with a comment message catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    /// English (default).
    #[default]
    En,
    /// Catalan.
    Ca,
    /// Spanish.
    Es,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ca => "ca",
            Self::Es => "es",
        }
    }

    /// Parses a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.split(['-', '_']).next().unwrap_or("") {
            "en" => Some(Self::En),
            "ca" => Some(Self::Ca),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    /// Parses a locale value, falling back to `default` when unsupported.
    #[must_use]
    pub fn parse_or(value: &str, default: Self) -> Self {
        Self::parse(value).unwrap_or(default)
    }
}

/// Ordered list of supported locales.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Ca, Locale::Es];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// Placeholder name without braces.
    pub key: &'static str,
    /// Preformatted value.
    pub value: String,
}

impl MessageArg {
    /// Constructs a message argument.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog.
const CATALOG_EN: &[(&str, &str)] = &[
    ("comments.alert.comments_disabled", "Comments are disabled for this component."),
    ("comments.alert.private_space", "You are not authorized to comment in this private space."),
    ("comments.alert.comments_blocked", "Comments are blocked at this moment."),
    ("comments.alert.unconfirmed_user", "You need to confirm your account before commenting."),
    (
        "comments.alert.foreign_organization",
        "You can only comment in spaces of your own organization.",
    ),
    ("comments.error.body_missing", "The comment body can't be blank."),
    ("comments.error.body_too_long", "The comment body is too long (maximum is {max} characters)."),
    ("comments.error.alignment_invalid", "Alignment must be -1, 0 or 1 (got {value})."),
    ("comments.error.depth_exceeded", "Replies can't be nested more than {max} levels deep."),
    ("comments.error.unauthorized", "You need to sign in before commenting."),
    ("comments.error.routing", "The commentable could not be found."),
    ("comments.author.deleted", "Deleted participant"),
];

/// Catalan catalog.
const CATALOG_CA: &[(&str, &str)] = &[
    ("comments.alert.comments_disabled", "Els comentaris estan desactivats en aquest component."),
    (
        "comments.alert.private_space",
        "No tens autorització per comentar en aquest espai privat.",
    ),
    ("comments.alert.comments_blocked", "Els comentaris estan bloquejats en aquest moment."),
    ("comments.alert.unconfirmed_user", "Has de confirmar el teu compte abans de comentar."),
    (
        "comments.alert.foreign_organization",
        "Només pots comentar en espais de la teva organització.",
    ),
    ("comments.error.body_missing", "El cos del comentari no pot estar en blanc."),
    (
        "comments.error.body_too_long",
        "El cos del comentari és massa llarg (el màxim és de {max} caràcters).",
    ),
    ("comments.error.alignment_invalid", "L'alineació ha de ser -1, 0 o 1 (s'ha rebut {value})."),
    (
        "comments.error.depth_exceeded",
        "Les respostes no poden niar-se més de {max} nivells.",
    ),
    ("comments.error.unauthorized", "Has d'iniciar sessió abans de comentar."),
    ("comments.error.routing", "No s'ha trobat l'element comentable."),
    ("comments.author.deleted", "Participant eliminat"),
];

/// Spanish catalog.
const CATALOG_ES: &[(&str, &str)] = &[
    (
        "comments.alert.comments_disabled",
        "Los comentarios están desactivados en este componente.",
    ),
    (
        "comments.alert.private_space",
        "No tienes autorización para comentar en este espacio privado.",
    ),
    ("comments.alert.comments_blocked", "Los comentarios están bloqueados en este momento."),
    ("comments.alert.unconfirmed_user", "Debes confirmar tu cuenta antes de comentar."),
    (
        "comments.alert.foreign_organization",
        "Solo puedes comentar en espacios de tu organización.",
    ),
    ("comments.error.body_missing", "El cuerpo del comentario no puede estar en blanco."),
    (
        "comments.error.body_too_long",
        "El cuerpo del comentario es demasiado largo (el máximo es {max} caracteres).",
    ),
    ("comments.error.alignment_invalid", "La alineación debe ser -1, 0 o 1 (se recibió {value})."),
    (
        "comments.error.depth_exceeded",
        "Las respuestas no pueden anidarse más de {max} niveles.",
    ),
    ("comments.error.unauthorized", "Debes iniciar sesión antes de comentar."),
    ("comments.error.routing", "No se ha encontrado el elemento comentable."),
    ("comments.author.deleted", "Participante eliminado"),
];

/// Returns the message catalog for the requested locale.
#[must_use]
pub fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_CA_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_ES_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Ca => CATALOG_CA_MAP.get_or_init(|| CATALOG_CA.iter().copied().collect()),
        Locale::Es => CATALOG_ES_MAP.get_or_init(|| CATALOG_ES.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` in `locale` while substituting `args`.
#[must_use]
pub fn translate(locale: Locale, key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
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

/// Formats a localized comment message from a locale, key, and named arguments.
#[macro_export]
macro_rules! t {
    ($locale:expr, $key:expr $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($locale, $key, args)
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
    fn catalogs_have_matching_keys() {
        let en_keys: BTreeSet<&str> = catalog_for(Locale::En).keys().copied().collect();
        for locale in SUPPORTED_LOCALES {
            let keys: BTreeSet<&str> = catalog_for(*locale).keys().copied().collect();
            assert_eq!(en_keys, keys, "catalog parity ({})", locale.as_str());
        }
    }

    #[test]
    fn locale_parsing_accepts_region_tags() {
        assert_eq!(Locale::parse("ca-ES"), Some(Locale::Ca));
        assert_eq!(Locale::parse(" ES_es "), Some(Locale::Es));
        assert_eq!(Locale::parse("fr"), None);
        assert_eq!(Locale::parse_or("fr", Locale::Ca), Locale::Ca);
    }

    #[test]
    fn translate_substitutes_placeholders() {
        let message = t!(Locale::En, "comments.error.body_too_long", max = 10);
        assert_eq!(message, "The comment body is too long (maximum is 10 characters).");
    }

    #[test]
    fn unknown_keys_fall_back_to_key() {
        assert_eq!(t!(Locale::Es, "comments.missing"), "comments.missing");
    }
}
