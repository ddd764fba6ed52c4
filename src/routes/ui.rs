//! Embedded browser form
//!
//! The single-page form drives the analyses API with `fetch`; embedding it
//! keeps the deployment a single binary.

use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}
