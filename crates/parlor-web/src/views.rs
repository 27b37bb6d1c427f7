//! Server-rendered HTML pages.

use std::collections::HashMap;
use std::fmt::Write;

use parlor_types::models::{Message, UserId, UserSummary};

const UNKNOWN_SENDER: &str = "unknown";

/// Minimal HTML escaping for text and attribute content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn index_page(username: Option<&str>) -> String {
    let body = match username {
        Some(name) => format!(
            "<h1>Welcome, {}</h1>\n<nav><a href=\"/chats\">Open chat</a> | <a href=\"/logout\">Log out</a></nav>",
            escape(name)
        ),
        None => "<h1>Welcome</h1>\n<nav><a href=\"/login\">Log in</a> | <a href=\"/register\">Register</a></nav>"
            .to_string(),
    };
    layout("Parlor", &body)
}

fn credentials_form(heading: &str, action: &str, submit: &str) -> String {
    format!(
        "<h1>{heading}</h1>\n\
         <form method=\"post\" action=\"{action}\">\n\
         <label>Username <input type=\"text\" name=\"username\"></label>\n\
         <label>Password <input type=\"password\" name=\"password\"></label>\n\
         <button type=\"submit\">{submit}</button>\n\
         </form>"
    )
}

pub fn register_page() -> String {
    let body = credentials_form("Register", "/register", "Create account")
        + "\n<p>Already registered? <a href=\"/login\">Log in</a></p>";
    layout("Register", &body)
}

pub fn login_page() -> String {
    let body = credentials_form("Log in", "/login", "Log in")
        + "\n<p>No account yet? <a href=\"/register\">Register</a></p>";
    layout("Log in", &body)
}

/// The general chat: other users on the side, then the history oldest first.
pub fn chats_page(username: &str, users: &[UserSummary], messages: &[Message]) -> String {
    let names: HashMap<UserId, &str> = users
        .iter()
        .map(|u| (u.user_id, u.username.as_str()))
        .collect();

    let mut body = format!(
        "<header>Signed in as <strong>{}</strong> | <a href=\"/logout\">Log out</a></header>\n",
        escape(username)
    );

    body.push_str("<aside>\n<h2>Users</h2>\n<ul class=\"users\">\n");
    for user in users.iter().filter(|u| u.username != username) {
        let _ = writeln!(body, "<li>{}</li>", escape(&user.username));
    }
    body.push_str("</ul>\n</aside>\n");

    body.push_str("<main>\n<h2>General chat</h2>\n<ul class=\"messages\">\n");
    for message in messages {
        let author = names.get(&message.sender).copied().unwrap_or(UNKNOWN_SENDER);
        let _ = writeln!(
            body,
            "<li class=\"message\"><span class=\"author\">{}</span>: <span class=\"body\">{}</span></li>",
            escape(author),
            escape(&message.meseg)
        );
    }
    body.push_str("</ul>\n");
    body.push_str(
        "<form method=\"post\" action=\"/chats\">\n\
         <input type=\"text\" name=\"content\" autocomplete=\"off\">\n\
         <button type=\"submit\">Send</button>\n\
         </form>\n</main>",
    );

    layout("General chat", &body)
}
