use serde::{Deserialize, Serialize};

// -- Session --

/// Claims carried by the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub exp: usize,
}

// -- Forms --

/// Body of `POST /register` and `POST /login`.
///
/// Fields are optional so a missing field reaches the handler as blank
/// input instead of a form rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsForm {
    /// Returns both fields when neither is missing or empty.
    pub fn filled(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

/// Body of `POST /chats`.
#[derive(Debug, Default, Deserialize)]
pub struct PostMessageForm {
    pub content: Option<String>,
}
