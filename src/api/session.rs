//! Resolves the current principal from the session cookie.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;
use std::sync::Arc;

use crate::auth::Principal;
use crate::AppState;

pub const SESSION_COOKIE: &str = "board_session";

/// The caller's session, if any. Never rejects; handlers decide what anonymous access means.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<String>,
    pub principal: Option<Principal>,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Infallible> {
        let token = session_token(&CookieJar::from_headers(&parts.headers));
        let principal = match token {
            Some(ref token) => state.sessions.principal(token).await,
            None => None,
        };
        Ok(Session { token, principal })
    }
}

fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Identifies the session cookie for `CookieJar::remove`, which expires it.
pub fn session_removal() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    fn jar(cookie: &'static str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static(cookie));
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let jar = jar("theme=dark; board_session=abc123; other=1");
        assert_eq!(session_token(&jar), Some("abc123".to_string()));
    }

    #[test]
    fn test_missing_or_empty_session_cookie() {
        assert_eq!(session_token(&CookieJar::new()), None);
        assert_eq!(session_token(&jar("board_session=")), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
    }
}
