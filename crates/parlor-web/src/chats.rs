use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::warn;

use parlor_types::api::PostMessageForm;
use parlor_types::models::{GENERAL_CHAT_ID, GENERAL_CHAT_NAME, NewMessage};

use crate::auth::AppState;
use crate::error::AppError;
use crate::session::Session;
use crate::views;

pub async fn show_chats(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let Some(username) = session.username else {
        return Ok(Redirect::to("/login").into_response());
    };

    let users = state.store.list_users().await?;
    let messages = state.store.get_messages(GENERAL_CHAT_ID).await?;

    Ok(Html(views::chats_page(&username, &users, &messages)).into_response())
}

/// Append a message to the general chat, then redirect back to the view so
/// a reload does not resubmit the form.
pub async fn post_message(
    State(state): State<AppState>,
    session: Session,
    form: Result<Form<PostMessageForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Some(username) = session.username else {
        return Ok(Redirect::to("/login").into_response());
    };

    let users = state.store.list_users().await?;

    let content = form
        .ok()
        .and_then(|Form(form)| form.content)
        .unwrap_or_default();
    if !content.is_empty() {
        match users.iter().find(|u| u.username == username) {
            Some(sender) => {
                // Not atomic with the insert below; ensure_chat tolerates a
                // concurrent creator.
                state
                    .store
                    .ensure_chat(GENERAL_CHAT_ID, GENERAL_CHAT_NAME)
                    .await?;
                state
                    .store
                    .insert_message(&NewMessage {
                        sender: sender.user_id,
                        chat_id: GENERAL_CHAT_ID,
                        meseg: &content,
                    })
                    .await?;
            }
            None => warn!("Session user {} has no users row; message dropped", username),
        }
    }

    Ok(Redirect::to("/chats").into_response())
}
