//! Client runtime handler

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::assets::runtime_file;

/// **GET /__preview/{*path}**
pub async fn runtime(Path(path): Path<String>) -> Response {
    let Some(file) = runtime_file(&path) else {
        debug!(path = %path, "No bundled preview file");
        return StatusCode::NOT_FOUND.into_response();
    };

    ([(header::CONTENT_TYPE, file.content_type)], file.body.into_owned()).into_response()
}
