//! Error types for the preview server.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a component or rendering its previews.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Neither `widget.json` nor `theme.json` exists in the component root.
    #[error("The definition file has not been found in {root}")]
    ManifestNotFound {
        /// Folder that was probed.
        root: PathBuf,
    },

    /// A definition file exists but is not valid JSON for a manifest.
    #[error("The definition file {path} is not valid: {source}")]
    InvalidManifest {
        /// Path of the offending file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A theme was found but its root folder has no `.html` templates.
    #[error("Your theme has no templates (looked in {root})")]
    NoTemplates {
        /// Folder that was scanned.
        root: PathBuf,
    },

    /// An asset reference whose extension the assembler cannot place.
    #[error("Unable to categorize asset '{0}' by its extension")]
    UnknownAssetType(String),

    /// Serializing the initialization payload failed.
    #[error("Failed to serialize preview data: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The style compiler rejected a source file.
    #[error("{file}: {message}")]
    StyleCompile {
        /// Asset path as declared in the manifest.
        file: String,
        /// Compiler diagnostic.
        message: String,
    },

    /// The style compiler program could not be started.
    #[error("Failed to start style compiler '{program}': {source}")]
    CompilerUnavailable {
        /// Program name or path.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Reading a file from the component folder failed.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The optional `preview.toml` is malformed.
    #[error("Invalid configuration in {path}: {message}")]
    Config {
        /// Path of the configuration file.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

/// Result type for preview operations.
pub type Result<T> = std::result::Result<T, PreviewError>;
