//! Component Preview Server
//!
//! A local development server for previewing a single widget or theme
//! package outside its hosting platform.
//!
//! # Usage
//!
//! ```bash
//! cd my-widget && component-preview
//! ```
//!
//! # Features
//!
//! - Static serving of the component folder (always revalidated)
//! - `/build` and `/interface` previews assembled from the manifest bundles
//! - Saved form data injected into previews for client-side hydration
//! - Theme templates with style variables compiled to CSS on demand

pub mod assembler;
mod assets;
pub mod config;
pub mod error;
pub mod gates;
mod handlers;
pub mod manifest;
pub mod pages;
pub mod server;
pub mod session;
pub mod styles;
pub mod tasks;

pub use assembler::{AssembleOptions, AssetKind, DocumentAssembler, PreviewTarget};
pub use config::PreviewConfig;
pub use error::{PreviewError, Result};
pub use manifest::{load_manifest, ComponentKind, Manifest};
pub use server::{AppState, PreviewServer};
pub use session::SessionState;
pub use styles::{compile_styles, SassCommand, StyleCompiler};
