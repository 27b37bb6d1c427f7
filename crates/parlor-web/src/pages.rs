use axum::response::Html;

use crate::session::Session;
use crate::views;

pub async fn index(session: Session) -> Html<String> {
    Html(views::index_page(session.username.as_deref()))
}
