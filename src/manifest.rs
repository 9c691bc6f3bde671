//! Component manifest loading and validation.
//!
//! A component folder holds either a `widget.json` or a `theme.json`
//! definition file. Themes additionally carry `.html` templates next to the
//! definition file and a set of style variables that are turned into a
//! prelude prepended to every stylesheet before compilation.
//!
//! # Example
//!
//! ```rust,ignore
//! use component_preview::manifest::load_manifest;
//!
//! let manifest = load_manifest(std::path::Path::new("."))?;
//! println!("{} ({})", manifest.name, manifest.package);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{PreviewError, Result};

/// Definition file of a widget package.
pub const WIDGET_MANIFEST: &str = "widget.json";

/// Definition file of a theme package.
pub const THEME_MANIFEST: &str = "theme.json";

/// Line separator used when joining prelude declarations.
pub const CRLF: &str = "\r\n";

/// Kind of component package being previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// A widget, defined by `widget.json`.
    #[default]
    Widget,
    /// A theme, defined by `theme.json`.
    Theme,
}

/// Outcome of probing a folder for definition files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestProbe {
    /// `widget.json` exists at the given path.
    Widget(PathBuf),
    /// No widget definition, but `theme.json` exists at the given path.
    Theme(PathBuf),
    /// Neither definition file exists.
    NotFound,
}

impl ManifestProbe {
    /// Look for `widget.json` first, then `theme.json`.
    pub fn probe(root: &Path) -> Self {
        let widget = root.join(WIDGET_MANIFEST);
        if widget.is_file() {
            return Self::Widget(widget);
        }

        let theme = root.join(THEME_MANIFEST);
        if theme.is_file() {
            return Self::Theme(theme);
        }

        Self::NotFound
    }
}

/// Dependencies and assets used by one of the manifest's sub-targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetBundle {
    /// Shared libraries, in declaration order.
    pub dependencies: Vec<String>,
    /// Component-owned scripts and stylesheets, in declaration order.
    pub assets: Vec<String>,
}

/// A single style variable declared by a theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleVariable {
    /// Variable name, without the `$` sigil.
    pub name: String,
    /// Default value; strings are emitted verbatim, anything else as JSON.
    #[serde(default)]
    pub default: Value,
}

impl StyleVariable {
    fn render_default(&self) -> String {
        match &self.default {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A group of style variables, as shown in one settings section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigSection {
    /// Section title, informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Variables in declaration order.
    pub variables: Vec<StyleVariable>,
}

/// The `settings` block of a definition file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Style variable sections, in declaration order.
    pub configuration: Vec<ConfigSection>,
}

/// Parsed definition file of a widget or theme.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Display name.
    pub name: String,
    /// Package identifier (e.g. `com.example.gallery`).
    pub package: String,
    /// Shared libraries required globally.
    pub dependencies: Vec<String>,
    /// Assets belonging to the component.
    pub assets: Vec<String>,
    /// Sub-configuration used by the build preview.
    pub build: AssetBundle,
    /// Sub-configuration used by the interface preview.
    pub interface: AssetBundle,
    /// Theme settings.
    pub settings: Settings,

    /// Whether this is a widget or a theme.
    #[serde(skip_deserializing)]
    pub kind: ComponentKind,
    /// Theme templates found in the root folder (file names).
    #[serde(skip_deserializing)]
    pub templates: Vec<String>,
    /// Style variable prelude derived from `settings.configuration`.
    #[serde(skip_deserializing)]
    pub scss_config: String,
}

impl Manifest {
    /// Whether the manifest describes a theme.
    pub fn is_theme(&self) -> bool {
        self.kind == ComponentKind::Theme
    }

    /// Parse a definition file without any theme post-processing.
    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PreviewError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| PreviewError::InvalidManifest {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load the component definition from `root`.
///
/// Widgets are preferred over themes when both files exist. For themes the
/// root folder is scanned for templates and the style prelude is computed.
///
/// # Errors
///
/// - [`PreviewError::ManifestNotFound`] when neither file exists
/// - [`PreviewError::InvalidManifest`] when the file is not valid JSON
/// - [`PreviewError::NoTemplates`] for a theme without any `.html` file
pub fn load_manifest(root: &Path) -> Result<Manifest> {
    match ManifestProbe::probe(root) {
        ManifestProbe::Widget(path) => {
            let mut manifest = Manifest::read(&path)?;
            manifest.kind = ComponentKind::Widget;
            tracing::debug!(path = %path.display(), "Loaded widget definition");
            Ok(manifest)
        },
        ManifestProbe::Theme(path) => {
            let mut manifest = Manifest::read(&path)?;
            manifest.kind = ComponentKind::Theme;

            manifest.templates = discover_templates(root)?;
            if manifest.templates.is_empty() {
                return Err(PreviewError::NoTemplates {
                    root: root.to_path_buf(),
                });
            }

            manifest.scss_config = build_prelude(&manifest.settings.configuration);
            tracing::debug!(
                path = %path.display(),
                templates = manifest.templates.len(),
                "Loaded theme definition"
            );
            Ok(manifest)
        },
        ManifestProbe::NotFound => Err(PreviewError::ManifestNotFound {
            root: root.to_path_buf(),
        }),
    }
}

/// List `.html` files directly inside `root`, sorted by file name.
pub fn discover_templates(root: &Path) -> Result<Vec<String>> {
    let io_err = |source| PreviewError::Io {
        path: root.to_path_buf(),
        source,
    };

    let mut templates = Vec::new();
    for entry in std::fs::read_dir(root).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("html") {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            templates.push(name.to_string());
        }
    }

    templates.sort();
    Ok(templates)
}

/// Build the style variable prelude: one `$name: default;` line per
/// variable, sections in order and variables in order within a section.
pub fn build_prelude(sections: &[ConfigSection]) -> String {
    sections
        .iter()
        .flat_map(|section| section.variables.iter())
        .map(|variable| format!("${}: {};", variable.name, variable.render_default()))
        .collect::<Vec<_>>()
        .join(CRLF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::fs;

    fn section(vars: &[(&str, &str)]) -> ConfigSection {
        ConfigSection {
            name: None,
            variables: vars
                .iter()
                .map(|(name, default)| StyleVariable {
                    name: (*name).to_string(),
                    default: Value::String((*default).to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_prelude_preserves_section_order() {
        let sections = vec![section(&[("a", "1")]), section(&[("b", "2")])];
        assert_eq!(build_prelude(&sections), "$a: 1;\r\n$b: 2;");
    }

    #[test]
    fn test_prelude_renders_non_string_defaults() {
        let sections = vec![ConfigSection {
            name: Some("Sizes".into()),
            variables: vec![StyleVariable {
                name: "columns".into(),
                default: serde_json::json!(12),
            }],
        }];
        assert_eq!(build_prelude(&sections), "$columns: 12;");
    }

    #[test]
    fn test_prelude_empty() {
        assert_eq!(build_prelude(&[]), "");
        assert_eq!(build_prelude(&[section(&[])]), "");
    }

    proptest! {
        #[test]
        fn prop_prelude_has_one_line_per_variable_in_order(
            groups in prop::collection::vec(
                prop::collection::vec(("[a-z][a-z0-9-]{0,8}", "[a-z0-9#]{1,6}"), 0..4),
                0..4,
            )
        ) {
            let sections: Vec<ConfigSection> = groups
                .iter()
                .map(|vars| ConfigSection {
                    name: None,
                    variables: vars
                        .iter()
                        .map(|(n, d)| StyleVariable { name: n.clone(), default: Value::String(d.clone()) })
                        .collect(),
                })
                .collect();

            let expected: Vec<String> = groups
                .iter()
                .flatten()
                .map(|(n, d)| format!("${n}: {d};"))
                .collect();

            let prelude = build_prelude(&sections);
            let lines: Vec<String> = if prelude.is_empty() {
                Vec::new()
            } else {
                prelude.split(CRLF).map(str::to_string).collect()
            };
            prop_assert_eq!(lines, expected);
        }
    }

    #[test]
    fn test_probe_prefers_widget() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(WIDGET_MANIFEST), "{}").unwrap();
        fs::write(dir.path().join(THEME_MANIFEST), "{}").unwrap();

        assert_eq!(
            ManifestProbe::probe(dir.path()),
            ManifestProbe::Widget(dir.path().join(WIDGET_MANIFEST))
        );
    }

    #[test]
    fn test_probe_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ManifestProbe::probe(dir.path()), ManifestProbe::NotFound);
    }

    #[test]
    fn test_load_widget() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(WIDGET_MANIFEST),
            r#"{
                "name": "Gallery",
                "package": "com.example.gallery",
                "dependencies": ["jquery"],
                "assets": ["css/gallery.css", "js/gallery.js"],
                "build": { "dependencies": ["jquery"], "assets": ["js/build.js"] },
                "interface": { "assets": ["js/interface.js"] },
                "somethingElse": true
            }"#,
        )
        .unwrap();

        let manifest = load_manifest(dir.path()).unwrap();
        assert_eq!(manifest.kind, ComponentKind::Widget);
        assert_eq!(manifest.name, "Gallery");
        assert_eq!(manifest.package, "com.example.gallery");
        assert_eq!(manifest.build.assets, vec!["js/build.js"]);
        assert!(manifest.interface.dependencies.is_empty());
        assert!(manifest.templates.is_empty());
        assert_eq!(manifest.scss_config, "");
    }

    #[test]
    fn test_load_missing_definition() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, PreviewError::ManifestNotFound { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(WIDGET_MANIFEST), "{ not json").unwrap();

        let err = load_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, PreviewError::InvalidManifest { .. }));
    }

    #[test]
    fn test_load_theme_discovers_templates_and_prelude() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(THEME_MANIFEST),
            r##"{
                "name": "Bright",
                "package": "com.example.bright",
                "assets": ["css/main.scss"],
                "settings": { "configuration": [
                    { "name": "Colors", "variables": [
                        { "name": "primary", "default": "#336699" },
                        { "name": "accent", "default": "#ff0000" }
                    ]},
                    { "variables": [ { "name": "radius", "default": "4px" } ] }
                ]}
            }"##,
        )
        .unwrap();
        fs::write(dir.path().join("list.html"), "<div></div>").unwrap();
        fs::write(dir.path().join("detail.html"), "<div></div>").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.html")).unwrap();

        let manifest = load_manifest(dir.path()).unwrap();
        assert!(manifest.is_theme());
        assert_eq!(manifest.templates, vec!["detail.html", "list.html"]);
        assert_eq!(
            manifest.scss_config,
            "$primary: #336699;\r\n$accent: #ff0000;\r\n$radius: 4px;"
        );
    }

    #[test]
    fn test_theme_without_templates_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(THEME_MANIFEST), r#"{"name": "Empty"}"#).unwrap();

        let err = load_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, PreviewError::NoTemplates { .. }));
    }
}
