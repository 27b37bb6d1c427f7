use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Form, extract::{State, rejection::FormRejection}, response::{Html, IntoResponse, Redirect, Response}};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info, warn};

use parlor_store::Store;
use parlor_types::api::CredentialsForm;

use crate::error::AppError;
use crate::session::{self, Session};
use crate::views;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Store,
    pub session_secret: String,
}

impl AppStateInner {
    pub fn new(store: Store, session_secret: impl Into<String>) -> AppState {
        Arc::new(Self {
            store,
            session_secret: session_secret.into(),
        })
    }
}

pub async fn register_form(session: Session) -> Response {
    if session.is_active() {
        return Redirect::to("/").into_response();
    }
    Html(views::register_page()).into_response()
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<Response, AppError> {
    if session.is_active() {
        return Ok(Redirect::to("/").into_response());
    }
    let form = credentials(form);
    let (username, password) = form.filled().ok_or(AppError::MissingCredentials)?;

    // Check if username is taken
    if state.store.get_user_by_username(username).await?.is_some() {
        return Err(AppError::UsernameTaken);
    }

    let password_hash = hash_password(password.to_string()).await?;

    // A concurrent registration can pass the check above; the store's
    // unique constraint catches it here.
    state
        .store
        .create_user(username, &password_hash)
        .await
        .map_err(|e| if e.is_conflict() { AppError::UsernameTaken } else { e.into() })?;

    info!("Registered user {}", username);
    let jar = session::start(jar, &state.session_secret, username)?;
    Ok((jar, Redirect::to("/chats")).into_response())
}

pub async fn login_form(session: Session) -> Response {
    if session.is_active() {
        return Redirect::to("/").into_response();
    }
    Html(views::login_page()).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<Response, AppError> {
    if session.is_active() {
        return Ok(Redirect::to("/").into_response());
    }
    let form = credentials(form);
    let (username, password) = form.filled().ok_or(AppError::MissingCredentials)?;

    let user = state
        .store
        .get_user_by_username(username)
        .await?
        .ok_or(AppError::UserNotFound)?;

    if !verify_password(password.to_string(), user.password_hash).await? {
        warn!("Wrong password for {}", username);
        return Err(AppError::WrongPassword);
    }

    info!("User {} logged in", username);
    let jar = session::start(jar, &state.session_secret, username)?;
    Ok((jar, Redirect::to("/chats")).into_response())
}

/// A missing or unreadable body counts as blank credentials.
fn credentials(form: Result<Form<CredentialsForm>, FormRejection>) -> CredentialsForm {
    form.map(|Form(form)| form).unwrap_or_default()
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (session::end(jar), Redirect::to("/"))
}

/// Argon2id with a fresh salt, on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| { error!("spawn_blocking join error: {}", e); AppError::Internal(e.to_string()) })?
    .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// `Ok(false)` on mismatch; an unparsable stored hash is an internal error.
pub async fn verify_password(password: String, stored_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored_hash)?;
        Ok::<_, argon2::password_hash::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
        )
    })
    .await
    .map_err(|e| { error!("spawn_blocking join error: {}", e); AppError::Internal(e.to_string()) })?
    .map_err(|e| AppError::Internal(format!("stored password hash is unreadable: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_verifies_only_the_same_password() {
        let hash = hash_password("pw123".into()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password("pw123".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("pw124".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let a = hash_password("pw123".into()).await.unwrap();
        let b = hash_password("pw123".into()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn unreadable_hash_is_internal_error() {
        let err = verify_password("pw".into(), "plaintext".into()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
