//! Preview document assembly.
//!
//! Turns one or more [`PreviewTarget`]s into a complete HTML document. For
//! every target the output is, in order:
//!
//! 1. stylesheet links (dependencies first, then the target's own assets)
//! 2. the raw markup, verbatim
//! 3. script tags (dependencies first, then the target's own assets)
//! 4. the `ComponentPreview.init(...)` call carrying id, session token and data
//!
//! Targets are rendered one after another in input order.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;
use uuid::Uuid;

use crate::error::{PreviewError, Result};

/// URL of the embedded client runtime loaded by every preview document.
pub const RUNTIME_URL: &str = "/__preview/runtime.js";

/// One renderable unit handed to the assembler.
#[derive(Debug, Clone, Default)]
pub struct PreviewTarget {
    /// Instance identifier surfaced to client code.
    pub id: i64,
    /// Token of the running preview process, when the target is bound to it.
    pub session_token: Option<Uuid>,
    /// Raw HTML fragment.
    pub markup: String,
    /// Shared libraries, in declaration order.
    pub dependencies: Vec<String>,
    /// Component assets, in declaration order.
    pub assets: Vec<String>,
    /// Saved form data to hydrate, if any.
    pub data: Option<Value>,
}

/// Input of [`DocumentAssembler::assemble`].
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Mark the document as running in the interface context.
    pub interface: bool,
    /// Targets to render, in order.
    pub widgets: Vec<PreviewTarget>,
}

/// How an asset reference is wired into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// `.css`, emitted as `<link rel="stylesheet">`.
    Stylesheet,
    /// `.js`, emitted as `<script src>`.
    Script,
    /// `.scss`, only reachable through the compiled stylesheet.
    StyleSource,
    /// Images, fonts and data files; served statically, never referenced.
    Passive,
}

impl AssetKind {
    /// Categorize an asset path by its extension, ignoring query and fragment.
    pub fn of(path: &str) -> Result<Self> {
        let bare = path.split(['?', '#']).next().unwrap_or(path);
        let file = bare.rsplit('/').next().unwrap_or(bare);
        let ext = file
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .ok_or_else(|| PreviewError::UnknownAssetType(path.to_string()))?;

        match ext.as_str() {
            "css" => Ok(Self::Stylesheet),
            "js" | "mjs" => Ok(Self::Script),
            "scss" => Ok(Self::StyleSource),
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" | "woff" | "woff2"
            | "ttf" | "eot" | "otf" | "json" | "map" | "html" => Ok(Self::Passive),
            _ => Err(PreviewError::UnknownAssetType(path.to_string())),
        }
    }
}

/// A dependency after library lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Dependency {
    /// Concrete URLs to reference, in order.
    Urls(Vec<String>),
    /// A bare library name nothing is registered for.
    Unavailable(String),
}

/// Stylesheet and script references of one target, already ordered.
#[derive(Debug, Default)]
struct Wiring {
    styles: Vec<String>,
    scripts: Vec<String>,
    unavailable: Vec<String>,
}

impl Wiring {
    fn push(&mut self, path: &str) -> Result<()> {
        match AssetKind::of(path)? {
            AssetKind::Stylesheet => self.styles.push(path.to_string()),
            AssetKind::Script => self.scripts.push(path.to_string()),
            AssetKind::StyleSource | AssetKind::Passive => {},
        }
        Ok(())
    }
}

/// Client-side initialization payload.
#[derive(Serialize)]
struct InitPayload<'a> {
    id: i64,
    uuid: Option<Uuid>,
    data: Option<&'a Value>,
    interface: bool,
}

/// Builds preview documents, resolving dependency names through a library
/// registry.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    libraries: IndexMap<String, Vec<String>>,
}

impl DocumentAssembler {
    /// Create an assembler with the given library registry.
    pub fn new(libraries: IndexMap<String, Vec<String>>) -> Self {
        Self { libraries }
    }

    /// Render all targets into a single HTML document.
    ///
    /// # Errors
    ///
    /// Fails if any asset or dependency path has an extension that cannot be
    /// categorized, or if a target's data cannot be serialized.
    pub fn assemble(&self, options: &AssembleOptions) -> Result<String> {
        let mut body = String::new();
        for target in &options.widgets {
            self.render_target(&mut body, target, options.interface)?;
        }

        let body_attrs = if options.interface {
            r#" data-preview-interface="true""#
        } else {
            ""
        };

        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>Preview</title>\n<script src=\"{RUNTIME_URL}\"></script>\n</head>\n\
             <body{body_attrs}>\n{body}</body>\n</html>\n"
        ))
    }

    fn resolve(&self, dependency: &str) -> Dependency {
        if let Some(urls) = self.libraries.get(dependency) {
            return Dependency::Urls(urls.clone());
        }
        if has_extension(dependency) {
            return Dependency::Urls(vec![dependency.to_string()]);
        }
        Dependency::Unavailable(dependency.to_string())
    }

    fn wire(&self, target: &PreviewTarget) -> Result<Wiring> {
        let mut wiring = Wiring::default();

        for dependency in &target.dependencies {
            match self.resolve(dependency) {
                Dependency::Urls(urls) => {
                    for url in &urls {
                        wiring.push(url)?;
                    }
                },
                Dependency::Unavailable(name) => {
                    tracing::warn!(dependency = %name, "Dependency is not available locally");
                    wiring.unavailable.push(name);
                },
            }
        }

        for asset in &target.assets {
            wiring.push(asset)?;
        }

        Ok(wiring)
    }

    fn render_target(
        &self,
        out: &mut String,
        target: &PreviewTarget,
        interface: bool,
    ) -> Result<()> {
        let wiring = self.wire(target)?;

        let payload = serde_json::to_string(&InitPayload {
            id: target.id,
            uuid: target.session_token,
            data: target.data.as_ref(),
            interface,
        })?;

        // String writes are infallible.
        let _ = writeln!(
            out,
            r#"<div class="preview-target" data-preview-id="{}">"#,
            target.id
        );
        for href in &wiring.styles {
            let _ = writeln!(out, r#"<link rel="stylesheet" href="{}">"#, escape_html(href));
        }
        out.push_str(&target.markup);
        out.push('\n');
        for name in &wiring.unavailable {
            let _ = writeln!(
                out,
                "<!-- dependency \"{}\" is not available in local preview -->",
                escape_html(name)
            );
        }
        for src in &wiring.scripts {
            let _ = writeln!(out, r#"<script src="{}"></script>"#, escape_html(src));
        }
        let _ = writeln!(
            out,
            "<script>ComponentPreview.init({});</script>",
            escape_script(&payload)
        );
        out.push_str("</div>\n");

        Ok(())
    }
}

fn has_extension(path: &str) -> bool {
    let bare = path.split(['?', '#']).next().unwrap_or(path);
    bare.rsplit('/').next().is_some_and(|file| {
        file.rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
    })
}

/// Escape text for use inside HTML attribute values and text nodes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Keep serialized JSON from closing the surrounding `<script>` element.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}
