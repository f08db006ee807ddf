// src/handlers/document.rs
use axum::{
    http::{header::CACHE_CONTROL, Uri},
    response::{Html, IntoResponse},
};

use crate::context::LoadContext;
use crate::error::{AppError, Result};
use crate::logging::Entry;

/// Hand-off point to the server renderer. Requests that reach it have
/// already missed the static files.
pub async fn render_document(ctx: LoadContext, uri: Uri) -> Result<impl IntoResponse> {
    match uri.path() {
        "/" => {
            ctx.logger.debug(Entry::msg("rendering document").field("path", "/"));
            Ok(([(CACHE_CONTROL, "no-cache")], Html(shell())))
        }
        path => {
            ctx.logger.warn(Entry::msg("no route matches").field("path", path));
            Err(AppError::NotFound(path.to_string()))
        }
    }
}

fn shell() -> String {
    concat!(
        "<!DOCTYPE html>",
        "<html lang=\"en\">",
        "<head><meta charset=\"utf-8\"><title>",
        env!("CARGO_PKG_NAME"),
        "</title></head>",
        "<body><div id=\"root\"></div></body>",
        "</html>"
    )
    .to_string()
}
