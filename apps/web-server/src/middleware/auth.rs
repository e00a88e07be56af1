//! Session cookie authentication.
//!
//! A signed-in browser carries a JWT in the `session` cookie. Handlers that
//! require a user take [`Identity`]; pages that only personalise take
//! [`OptionalIdentity`].

use std::future::{Ready, ready};
use std::ops::Deref;

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use url::form_urlencoded;

use quill_core::domain::Actor;

use super::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";
pub const LOGIN_PATH: &str = "/auth/login/";

/// Login page URL that returns to `next` afterwards. `next` is
/// form-encoded so `+` and `%` in the path survive the round trip.
pub fn login_url(next: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{LOGIN_PATH}?next={encoded}")
}

/// `next` if it names a path on this site, otherwise `/`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

pub fn session_cookie(token: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_seconds))
        .finish()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Resolve the session cookie into the acting user, if it is valid.
fn session_actor(req: &HttpRequest) -> Option<Actor> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return None;
    };

    let cookie = req.cookie(SESSION_COOKIE)?;
    match state.tokens.validate_token(cookie.value()) {
        Ok(claims) => Some(Actor::new(claims.user_id, claims.username)),
        Err(e) => {
            tracing::debug!("Ignoring session cookie: {}", e);
            None
        }
    }
}

/// Authenticated user extractor. Anonymous requests are redirected to the
/// login page with `next` pointing back at the requested path.
#[derive(Debug, Clone)]
pub struct Identity(pub Actor);

impl Deref for Identity {
    type Target = Actor;

    fn deref(&self) -> &Actor {
        &self.0
    }
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(session_actor(req).map(Identity).ok_or_else(|| {
            AppError::LoginRequired {
                next: req.path().to_string(),
            }
        }))
    }
}

/// Optional identity extractor - never fails.
pub struct OptionalIdentity(pub Option<Actor>);

impl OptionalIdentity {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(session_actor(req))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_keeps_local_paths_only() {
        assert_eq!(safe_next(Some("/new/")), "/new/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(login_url("/new/"), "/auth/login/?next=%2Fnew%2F");
        assert_eq!(login_url("/a+b/"), "/auth/login/?next=%2Fa%2Bb%2F");
        assert_eq!(login_url("/%D0%B0/"), "/auth/login/?next=%2F%25D0%25B0%2F");
    }

    #[test]
    fn test_removal_cookie_targets_session() {
        let cookie = expired_session_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
    }
}
