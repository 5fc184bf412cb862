//! Minimal page anchors for the route matcher.
//!
//! The product UI is rendered by the frontend; these handlers only give the
//! guard a matched subtree to front, and a body to land on in development.

use axum::response::Html;

pub async fn home() -> Html<&'static str> {
    Html("<h1>Piscina</h1>")
}

pub async fn login() -> Html<&'static str> {
    Html("<h1>Sign in</h1>")
}

pub async fn signup() -> Html<&'static str> {
    Html("<h1>Create an account</h1>")
}

pub async fn dashboard() -> Html<&'static str> {
    Html("<h1>Dashboard</h1>")
}

pub async fn denied() -> Html<&'static str> {
    Html("<h1>Access denied</h1><p>Your account is not on the allow list.</p>")
}
