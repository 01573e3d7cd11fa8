// crates/civic-comments-http/src/views.rs
// ============================================================================
// Module: Comment Views
// Description: Maps controller outcomes to HTTP responses.
// Purpose: Keep status codes, headers, and payload shapes in one place.
// Dependencies: civic-comments-core, axum, serde_json
// ============================================================================

//! ## Overview
//! | Outcome | Status | Extra |
//! |---|---|---|
//! | page / reload | 200 | `x-rendered-template` |
//! | created | 200 | `x-rendered-template: create` |
//! | invalid form | 422 | `x-rendered-template: error` |
//! | guard rejection | 302 | `Location`, `Set-Cookie: flash=...` |
//! | unauthenticated | 401 | |
//! | routing error | 404 | |

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::response::Response;
use civic_comments_core::ControllerError;
use civic_comments_core::CreateOutcome;
use civic_comments_core::IndexOutcome;
use civic_comments_core::runtime::Redirect;
use civic_comments_core::runtime::Template;
use serde::Serialize;
use serde_json::json;

use crate::flash::FlashMessage;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header naming the rendered template.
pub const RENDERED_TEMPLATE_HEADER: &str = "x-rendered-template";
/// Redirect target when no safe referer is available.
const DEFAULT_LOCATION: &str = "/";

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Rendered response plus the outcome label used for auditing.
pub struct View {
    /// HTTP response.
    pub response: Response,
    /// Outcome label.
    pub outcome: &'static str,
    /// Denial reason for guard rejections.
    pub denial: Option<&'static str>,
}

/// Renders an index outcome.
#[must_use]
pub fn index_view(outcome: IndexOutcome, referer: Option<&str>) -> View {
    match outcome {
        IndexOutcome::Rendered(page) => View {
            response: template_response(StatusCode::OK, page.template, &page),
            outcome: page.template.as_str(),
            denial: None,
        },
        IndexOutcome::Redirect(redirect) => redirect_view(&redirect, referer),
    }
}

/// Renders a create outcome.
#[must_use]
pub fn create_view(outcome: CreateOutcome, referer: Option<&str>) -> View {
    match outcome {
        CreateOutcome::Created(created) => View {
            response: template_response(StatusCode::OK, created.template, &created),
            outcome: "created",
            denial: None,
        },
        CreateOutcome::Invalid(invalid) => View {
            response: template_response(StatusCode::UNPROCESSABLE_ENTITY, invalid.template, &invalid),
            outcome: "invalid",
            denial: None,
        },
        CreateOutcome::Redirect(redirect) => redirect_view(&redirect, referer),
    }
}

/// Renders a controller failure.
#[must_use]
pub fn error_view(error: &ControllerError) -> View {
    match error {
        ControllerError::Unauthorized => View {
            response: error_response(StatusCode::UNAUTHORIZED, "unauthorized"),
            outcome: "unauthorized",
            denial: None,
        },
        ControllerError::Routing(detail) => {
            tracing::debug!(detail = %detail, "commentable could not be resolved");
            View {
                response: error_response(StatusCode::NOT_FOUND, "routing_error"),
                outcome: "routing_error",
                denial: None,
            }
        }
        ControllerError::Signing(_) | ControllerError::Store(_) => {
            tracing::error!(error = %error, "comments request failed");
            View {
                response: error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
                outcome: "internal_error",
                denial: None,
            }
        }
    }
}

/// Builds a JSON error response.
#[must_use]
pub fn error_response(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

/// Builds a JSON response tagged with its template.
fn template_response<T: Serialize>(status: StatusCode, template: Template, body: &T) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(RENDERED_TEMPLATE_HEADER),
        HeaderValue::from_static(template.as_str()),
    );
    (status, headers, Json(body)).into_response()
}

/// Builds the redirect carrying a flash alert.
fn redirect_view(redirect: &Redirect, referer: Option<&str>) -> View {
    let mut headers = HeaderMap::new();
    let location = HeaderValue::from_str(safe_location(referer))
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_LOCATION));
    headers.insert(LOCATION, location);
    if let Ok(cookie) = HeaderValue::from_str(&FlashMessage::alert(&redirect.alert).set_cookie()) {
        headers.insert(SET_COOKIE, cookie);
    }
    View {
        response: (StatusCode::FOUND, headers).into_response(),
        outcome: "redirect",
        denial: Some(redirect.reason.as_str()),
    }
}

/// Returns the referer when it is a same-origin relative path.
///
/// Browsers read `/\host` like `//host`, so any backslash is rejected.
#[must_use]
pub fn safe_location(referer: Option<&str>) -> &str {
    match referer.map(str::trim) {
        Some(path) if is_relative_path(path) => path,
        _ => DEFAULT_LOCATION,
    }
}

/// Checks for a path that cannot be read as a network location.
fn is_relative_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use civic_comments_core::runtime::DenialReason;

    use super::*;

    #[test]
    fn only_relative_referers_are_followed() {
        assert_eq!(safe_location(Some("/processes/5/debates/10")), "/processes/5/debates/10");
        assert_eq!(safe_location(Some("//evil.example/")), "/");
        assert_eq!(safe_location(Some("https://evil.example/")), "/");
        assert_eq!(safe_location(Some("/\\evil.example/phish")), "/");
        assert_eq!(safe_location(Some("/processes\\5")), "/");
        assert_eq!(safe_location(Some("/")), "/");
        assert_eq!(safe_location(None), "/");
    }

    #[test]
    fn redirect_sets_location_and_flash() {
        let redirect = Redirect {
            reason: DenialReason::CommentsDisabled,
            alert: "Comments are disabled for this component.".to_string(),
        };
        let view = redirect_view(&redirect, Some("/back"));
        assert_eq!(view.response.status(), StatusCode::FOUND);
        assert_eq!(view.response.headers()[LOCATION], "/back");
        let cookie = view.response.headers()[SET_COOKIE].to_str().unwrap_or_default();
        assert_eq!(
            FlashMessage::from_cookie_header(cookie).map(|flash| flash.alert),
            Some(redirect.alert)
        );
        assert_eq!(view.denial, Some("comments_disabled"));
    }

    #[test]
    fn controller_errors_map_to_statuses() {
        assert_eq!(error_view(&ControllerError::Unauthorized).response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            error_view(&ControllerError::Routing("bad".to_string())).response.status(),
            StatusCode::NOT_FOUND
        );
    }
}
