//! Session gate in front of every route except the public allow-list.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{error::AppError, state::SharedState};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "plank_session";

const LOGIN_PATH: &str = "/login";
const REGISTER_PATH: &str = "/register";

/// Paths reachable without a session.
pub fn is_public(path: &str) -> bool {
    matches!(path, LOGIN_PATH | REGISTER_PATH | "/privacy" | "/healthcheck" | "/api/auth")
        || path.starts_with("/api/auth/")
        || path == "/docs"
        || path.starts_with("/docs/")
        || path.starts_with("/api-doc/")
}

/// Session token from `Authorization: Bearer`, falling back to the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

/// Resolve the caller's session and decide whether the request may proceed.
///
/// Authenticated requests carry a [`CurrentUser`](crate::state::CurrentUser)
/// extension. Anonymous API calls get a JSON 401; anonymous page visits are
/// sent to the login page; signed-in visits to login or register go home.
pub async fn require_session(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    let user = session_token(req.headers()).and_then(|token| state.sessions().resolve(&token));

    match user {
        Some(_) if path == LOGIN_PATH || path == REGISTER_PATH => Redirect::to("/").into_response(),
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None if is_public(&path) => next.run(req).await,
        None if path.starts_with("/api/") => {
            AppError::Unauthorized("Unauthorized".into()).into_response()
        }
        None => Redirect::to(LOGIN_PATH).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn allow_list() {
        for path in [
            "/login",
            "/register",
            "/privacy",
            "/api/auth/login",
            "/api/auth/register",
            "/healthcheck",
            "/docs",
            "/docs/index.html",
            "/api-doc/openapi.json",
        ] {
            assert!(is_public(path), "{path}");
        }
        for path in ["/", "/api/attempts", "/api/leaderboard", "/history", "/api/authx", "/loginx"] {
            assert!(!is_public(path), "{path}");
        }
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("plank_session=def"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; plank_session=def; lang=en"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("def"));
    }

    #[test]
    fn missing_or_empty_token_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(header::COOKIE, HeaderValue::from_static("plank_session="));
        assert_eq!(session_token(&headers), None);
    }
}
