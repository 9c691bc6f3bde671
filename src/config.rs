//! Preview server configuration
//!
//! Settings come from an optional `preview.toml` in the component root and
//! are then overridden by command-line flags.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PreviewError, Result};

/// Name of the optional configuration file inside the component root.
pub const CONFIG_FILE: &str = "preview.toml";

/// Configuration for the preview server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Component root folder (where `widget.json` / `theme.json` live)
    #[serde(skip)]
    pub root: PathBuf,
    /// Port for the preview server
    pub port: u16,
    /// Open the root page in the default browser once the server is up
    pub open_browser: bool,
    /// Delay before opening the browser, in milliseconds
    pub open_delay_ms: u64,
    /// Launch the build/watch task runner on startup
    pub run_tasks: bool,
    /// Task runner command line (program followed by arguments)
    pub task_command: Vec<String>,
    /// Style compiler command line (program followed by extra arguments)
    pub style_compiler: Vec<String>,
    /// Shared libraries a dependency name may refer to, in load order
    pub libraries: IndexMap<String, Vec<String>>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            port: 3000,
            open_browser: true,
            open_delay_ms: 500,
            run_tasks: true,
            task_command: vec!["grunt".to_string(), "default".to_string()],
            style_compiler: vec!["sass".to_string()],
            libraries: IndexMap::new(),
        }
    }
}

impl PreviewConfig {
    /// Load `preview.toml` from `root`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);

        let mut config = if path.is_file() {
            let content = std::fs::read_to_string(&path).map_err(|source| PreviewError::Io {
                path: path.clone(),
                source,
            })?;
            let config: PreviewConfig =
                toml::from_str(&content).map_err(|e| PreviewError::Config {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            tracing::debug!(path = %path.display(), "Loaded preview configuration");
            config
        } else {
            Self::default()
        };

        config.root = root.to_path_buf();
        config.validate(&path)?;
        Ok(config)
    }

    /// Base URL the server answers on.
    pub fn host_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.style_compiler.is_empty() {
            return Err(PreviewError::Config {
                path: path.to_path_buf(),
                message: "style_compiler must name a program".to_string(),
            });
        }
        if self.run_tasks && self.task_command.is_empty() {
            return Err(PreviewError::Config {
                path: path.to_path_buf(),
                message: "task_command must name a program when run_tasks is enabled"
                    .to_string(),
            });
        }
        Ok(())
    }
}
