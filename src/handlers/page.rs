//! Preview page handlers
//!
//! Soft failures (missing preview file, rejected markup) are answered with a
//! 200 and a readable explanation so the preview frame shows the message.

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::assembler::{AssembleOptions, PreviewTarget};
use crate::gates;
use crate::pages;
use crate::server::AppState;

/// Markup previewed by `/build`.
pub const BUILD_FILE: &str = "build.html";

/// Markup previewed by `/interface`.
pub const INTERFACE_FILE: &str = "interface.html";

/// Serve the root harness page
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(pages::root_page(&state.manifest))
}

/// Assemble `build.html` with the manifest's build bundle
pub async fn build(State(state): State<Arc<AppState>>) -> Response {
    let Some(markup) = read_component_file(&state, BUILD_FILE).await else {
        return not_found(BUILD_FILE);
    };

    if let Err(violation) = gates::check_all(&markup) {
        return Html(violation.message()).into_response();
    }

    let target = state.bound_target(markup, &state.manifest.build);
    render(&state, false, target)
}

/// Assemble `interface.html` with the manifest's interface bundle
pub async fn interface(State(state): State<Arc<AppState>>) -> Response {
    let markup = match read_component_file(&state, INTERFACE_FILE).await {
        Some(markup) if !markup.is_empty() => markup,
        _ => return not_found(INTERFACE_FILE),
    };

    if let Err(violation) = gates::check_external_scripts(&markup) {
        return Html(violation.message()).into_response();
    }

    let target = state.bound_target(markup, &state.manifest.interface);
    render(&state, true, target)
}

/// Assemble a theme template with the compiled stylesheet and package assets
pub async fn template(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let Some(markup) = read_component_file(&state, &name).await else {
        return not_found(&name);
    };

    let now = chrono::Utc::now().timestamp_millis();
    let assets = std::iter::once(format!("__scss.css?_={now}"))
        .chain(state.manifest.assets.iter().cloned())
        .map(|asset| format!("/{}", asset.strip_prefix('/').unwrap_or(&asset)))
        .collect();

    let target = PreviewTarget {
        id: now,
        session_token: None,
        markup,
        dependencies: state.manifest.dependencies.clone(),
        assets,
        data: None,
    };
    render(&state, false, target)
}

fn render(state: &AppState, interface: bool, target: PreviewTarget) -> Response {
    let options = AssembleOptions {
        interface,
        widgets: vec![target],
    };

    match state.assembler.assemble(&options) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!("Failed to assemble preview: {}", e);
            e.to_string().into_response()
        },
    }
}

fn not_found(file: &str) -> Response {
    Html(format!(
        "The {} file was not found",
        crate::assembler::escape_html(file)
    ))
    .into_response()
}

/// Read a file directly inside the component root.
///
/// Returns `None` when the file is missing, unreadable, or resolves outside
/// the root.
async fn read_component_file(state: &AppState, name: &str) -> Option<String> {
    let root = tokio::fs::canonicalize(&state.config.root).await.ok()?;
    let path = tokio::fs::canonicalize(root.join(name)).await.ok()?;
    if !path.starts_with(&root) {
        warn!(file = %name, "Rejected path outside the component root");
        return None;
    }

    match tokio::fs::read_to_string(&path).await {
        Ok(content) => {
            debug!(path = %path.display(), bytes = content.len(), "Read preview file");
            Some(content)
        },
        Err(e) => {
            debug!(path = %path.display(), "Failed to read preview file: {}", e);
            None
        },
    }
}
