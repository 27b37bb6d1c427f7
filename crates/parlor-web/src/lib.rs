pub mod auth;
pub mod chats;
pub mod debug;
pub mod error;
pub mod pages;
pub mod session;
pub mod views;

use axum::{Router, routing::get};

use crate::auth::AppState;

/// All application routes, ready to be served.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/chats", get(chats::show_chats).post(chats::post_message))
        .route("/test_supabase", get(debug::list_users))
        .with_state(state)
}
