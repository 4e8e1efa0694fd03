//! Route protection: admin pages redirect to the login page, mutating API
//! calls get a 401 JSON body. Verification is stateless.

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::authenticate;
use crate::error::AppError;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/admin/login";
pub const RESET_PATH: &str = "/admin/reset-password";

#[derive(Debug, PartialEq, Eq)]
enum Access {
    Public,
    AdminPage,
    AdminApi,
}

fn classify(method: &Method, path: &str) -> Access {
    if path == "/admin" || path.starts_with("/admin/") {
        return if path == LOGIN_PATH || path == RESET_PATH {
            Access::Public
        } else {
            Access::AdminPage
        };
    }

    if !path.starts_with("/api/") {
        return Access::Public;
    }
    if path.starts_with("/api/auth/") {
        return Access::Public;
    }

    let is_read = matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS);

    // Visitors submit the contact form; reading submissions is admin-only.
    if path == "/api/contact" || path.starts_with("/api/contact/") {
        if *method == Method::POST && path == "/api/contact" {
            return Access::Public;
        }
        return if *method == Method::OPTIONS {
            Access::Public
        } else {
            Access::AdminApi
        };
    }

    if is_read {
        Access::Public
    } else {
        Access::AdminApi
    }
}

pub async fn require_admin(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let access = classify(request.method(), request.uri().path());
    if access == Access::Public {
        return next.run(request).await;
    }

    match authenticate(&state.config.auth, request.headers()) {
        Some(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        None if access == Access::AdminPage => {
            let original = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/admin");
            tracing::debug!(path = %original, "unauthenticated admin page request");
            let mut response =
                Redirect::to(&format!("{LOGIN_PATH}?redirect={}", percent_encode(original)))
                    .into_response();
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-store"));
            response
        }
        None => {
            tracing::warn!(
                method = %request.method(),
                uri = %request.uri(),
                "rejected unauthenticated API request"
            );
            AppError::Unauthorized.into_response()
        }
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set plus `/`.
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Post-login target (already query-decoded). Only admin paths without
/// backslashes or control characters are honoured; anything else lands on
/// the dashboard.
pub fn safe_redirect_target(raw: Option<&str>) -> String {
    match raw {
        Some(path) if is_admin_path(path) => path.to_string(),
        _ => "/admin".to_string(),
    }
}

fn is_admin_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("/admin") else {
        return false;
    };
    (rest.is_empty() || rest.starts_with(['/', '?', '#']))
        && !path.contains("//")
        && !path.chars().any(|c| c == '\\' || c.is_control())
}
