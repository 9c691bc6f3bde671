//! Compiled theme stylesheet handler

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::server::AppState;
use crate::styles::compile_styles;

/// Compile the theme's `.scss` assets
///
/// **GET /__scss.css**
///
/// Compile failures are answered as a CSS comment so the page keeps
/// rendering. Widgets have no compiled stylesheet and get a 404.
pub async fn compiled(State(state): State<Arc<AppState>>) -> Response {
    let manifest = &state.manifest;
    if !manifest.is_theme() {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    let css = match compile_styles(
        Arc::clone(&state.compiler),
        &manifest.assets,
        &manifest.scss_config,
        &manifest.package,
        &state.config.root,
    )
    .await
    {
        Ok(css) => css,
        Err(e) => {
            tracing::error!("Error compiling scss: {}", e);
            error_comment(&e.to_string())
        },
    };

    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], css).into_response()
}

fn error_comment(message: &str) -> String {
    format!("/* Error compiling scss: {} */", message.replace("*/", "* /"))
}
