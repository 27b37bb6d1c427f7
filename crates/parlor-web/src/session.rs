use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use parlor_types::api::Claims;

use crate::auth::AppState;

pub const SESSION_COOKIE: &str = "parlor_session";
const SESSION_DAYS: i64 = 30;

/// Username carried by the signed session cookie, if any.
///
/// A missing, tampered or expired cookie yields an anonymous session
/// rather than a rejection; handlers decide where to redirect.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub username: Option<String>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.username.is_some()
    }
}

impl<S> FromRequestParts<S> for Session
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE).map(Cookie::value).filter(|t| !t.is_empty()) else {
            return Ok(Self::default());
        };

        let app_state = AppState::from_ref(state);
        Ok(Self {
            username: verify_token(&app_state.session_secret, token),
        })
    }
}

pub fn create_token(secret: &str, username: &str) -> jsonwebtoken::errors::Result<String> {
    let claims = Claims {
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Username from a valid token, `None` for anything that fails validation.
pub fn verify_token(secret: &str, token: &str) -> Option<String> {
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => Some(data.claims.username),
        Err(e) => {
            debug!("Ignoring session cookie: {}", e);
            None
        }
    }
}

/// Jar with the session cookie set for `username`.
pub fn start(jar: CookieJar, secret: &str, username: &str) -> jsonwebtoken::errors::Result<CookieJar> {
    let token = create_token(secret, username)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_DAYS));

    Ok(jar.add(cookie))
}

pub fn end(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip() {
        let token = create_token("secret", "alice").unwrap();
        assert_eq!(verify_token("secret", &token).as_deref(), Some("alice"));
    }

    #[test]
    fn token_signed_with_other_secret_is_ignored() {
        let token = create_token("secret", "alice").unwrap();
        assert_eq!(verify_token("another-secret", &token), None);
    }

    #[test]
    fn garbage_token_is_ignored() {
        assert_eq!(verify_token("secret", "not-a-jwt"), None);
    }

    #[test]
    fn expired_token_is_ignored() {
        let claims = Claims {
            username: "alice".into(),
            exp: (chrono::Utc::now() - chrono::Duration::days(1)).timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap();
        assert_eq!(verify_token("secret", &token), None);
    }

    #[test]
    fn start_sets_http_only_cookie() {
        let jar = start(CookieJar::new(), "secret", "alice").unwrap();
        let cookie = jar.get(SESSION_COOKIE).unwrap();

        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(verify_token("secret", cookie.value()).as_deref(), Some("alice"));
    }
}
