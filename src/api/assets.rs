//! Embedded static assets
//!
//! In development, falls back to serving from the filesystem.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Embed)]
#[folder = "ui"]
struct Assets;

const UI_DIR: &str = "ui";

/// Element ids the page script cannot run without
pub const REQUIRED_ELEMENT_IDS: [&str; 3] = ["chat-history", "topicSelectionContainer", "newTopicButton"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("index.html is missing")]
    MissingPage,
    #[error("index.html has no element with id \"{0}\"")]
    MissingElement(&'static str),
}

/// Serve embedded static files, with filesystem fallback for development
pub async fn serve_static(req: Request<Body>) -> Response {
    let path = req.uri().path().trim_start_matches('/');
    match load(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                Body::from(content),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Get the index.html content (embedded or from filesystem)
pub fn get_index_html() -> Option<String> {
    load("index.html").and_then(|bytes| String::from_utf8(bytes).ok())
}

/// Check that the page exists and carries every required element
pub fn validate_page() -> Result<(), PageError> {
    let html = get_index_html().ok_or(PageError::MissingPage)?;
    check_required_elements(&html)
}

fn check_required_elements(html: &str) -> Result<(), PageError> {
    for id in REQUIRED_ELEMENT_IDS {
        let double = format!("id=\"{id}\"");
        let single = format!("id='{id}'");
        if !html.contains(&double) && !html.contains(&single) {
            return Err(PageError::MissingElement(id));
        }
    }
    Ok(())
}

fn load(path: &str) -> Option<Vec<u8>> {
    if !is_within_ui(path) {
        tracing::warn!(path, "Rejected asset path outside the UI directory");
        return None;
    }

    // Try embedded assets first
    if let Some(content) = Assets::get(path) {
        return Some(content.data.to_vec());
    }

    // Fallback to filesystem in development
    let fs_path = PathBuf::from(UI_DIR).join(path);
    std::fs::read(fs_path).ok()
}

/// Only plain relative segments; `..`, absolute paths and drive prefixes
/// could reach outside `ui/`
fn is_within_ui(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
