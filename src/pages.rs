use axum::response::Html;

const INDEX_HTML: &str = include_str!("../templates/index.html");
const ABOUT_HTML: &str = include_str!("../templates/about.html");
const CONTACT_HTML: &str = include_str!("../templates/contact.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn about() -> Html<&'static str> {
    Html(ABOUT_HTML)
}

pub async fn contact() -> Html<&'static str> {
    Html(CONTACT_HTML)
}
