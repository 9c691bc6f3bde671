//! Theme stylesheet compilation
//!
//! Each `.scss` asset is compiled separately with the theme's variable
//! prelude prepended. Files are compiled concurrently; the combined output is
//! produced only when every file succeeds.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::error::{PreviewError, Result};
use crate::manifest::CRLF;

/// A single compilation job.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Asset path as declared in the manifest, used in diagnostics.
    pub file: String,
    /// Prelude followed by the file contents.
    pub source: String,
    /// Directory searched for relative `@import`s.
    pub include_dir: PathBuf,
}

/// Compiles SCSS source text into CSS.
#[async_trait]
pub trait StyleCompiler: Send + Sync {
    /// Compile one source with expanded output and no source map.
    async fn compile(&self, request: CompileRequest) -> Result<String>;
}

/// [`StyleCompiler`] backed by the `sass` command-line compiler.
#[derive(Debug, Clone)]
pub struct SassCommand {
    program: String,
    args: Vec<String>,
}

impl SassCommand {
    /// Create from a command line: program followed by extra arguments.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Create from a configured command line, falling back to `sass`.
    pub fn from_command_line(command: &[String]) -> Self {
        match command.split_first() {
            Some((program, args)) => Self::new(program.clone(), args.to_vec()),
            None => Self::new("sass", Vec::new()),
        }
    }
}

#[async_trait]
impl StyleCompiler for SassCommand {
    async fn compile(&self, request: CompileRequest) -> Result<String> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg("--stdin")
            .arg("--no-source-map")
            .arg("--style=expanded")
            .arg(format!("--load-path={}", request.include_dir.display()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| PreviewError::CompilerUnavailable {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin from a separate task so a large output cannot block the write.
        let writer = child.stdin.take().map(|mut stdin| {
            let source = request.source;
            tokio::spawn(async move {
                let _ = stdin.write_all(source.as_bytes()).await;
            })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| PreviewError::CompilerUnavailable {
                program: self.program.clone(),
                source,
            })?;

        if let Some(writer) = writer {
            let _ = writer.await;
        }

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(PreviewError::StyleCompile {
                file: request.file,
                message: stderr.trim().to_string(),
            })
        }
    }
}

/// Whether an asset path names an SCSS source file.
pub fn is_style_source(path: &str) -> bool {
    let bare = path.split(['?', '#']).next().unwrap_or(path);
    bare.to_ascii_lowercase().ends_with(".scss")
}

/// Compile every `.scss` asset and concatenate the results.
///
/// Each block is prefixed with a `/* <label>:<file> */` provenance comment and
/// blocks are joined with CRLF in declaration order. Compilation fans out one
/// task per file; the first failure is returned and the output of every other
/// file is discarded. Tasks still running at that point finish in the
/// background.
pub async fn compile_styles(
    compiler: Arc<dyn StyleCompiler>,
    assets: &[String],
    prelude: &str,
    label: &str,
    base_dir: &Path,
) -> Result<String> {
    let jobs = assets
        .iter()
        .filter(|asset| is_style_source(asset))
        .map(|file| {
            let compiler = Arc::clone(&compiler);
            let file = file.clone();
            let prelude = prelude.to_string();
            let label = label.to_string();
            let path = base_dir.join(file.trim_start_matches('/'));

            tokio::spawn(async move {
                let contents = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| PreviewError::Io {
                        path: path.clone(),
                        source,
                    })?;
                let include_dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();

                tracing::debug!(file = %file, "Compiling stylesheet");
                let css = compiler
                    .compile(CompileRequest {
                        file: file.clone(),
                        source: format!("{prelude}{CRLF}{contents}"),
                        include_dir,
                    })
                    .await?;

                Ok::<_, PreviewError>(format!("/* {label}:{file} */{CRLF}{css}"))
            })
        });

    let joined = futures::future::try_join_all(jobs.map(|handle| async move {
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(PreviewError::StyleCompile {
                file: String::new(),
                message: format!("compile task failed: {e}"),
            }),
        }
    }))
    .await?;

    Ok(joined.join(CRLF))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::time::Duration;

    /// Echoes the source back, failing when it contains `@error`.
    #[derive(Default)]
    struct FakeCompiler {
        seen: Mutex<Vec<CompileRequest>>,
    }

    #[async_trait]
    impl StyleCompiler for FakeCompiler {
        async fn compile(&self, request: CompileRequest) -> Result<String> {
            self.seen.lock().push(request.clone());
            if request.file.contains("slow") {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            if request.source.contains("@error") {
                return Err(PreviewError::StyleCompile {
                    file: request.file,
                    message: "forced failure".to_string(),
                });
            }
            Ok(format!("compiled[{}]", request.source.replace(CRLF, "|")))
        }
    }

    fn theme_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn assets(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_concatenates_in_declaration_order() {
        let dir = theme_dir(&[("css/slow.scss", "a {}"), ("css/b.scss", "b {}")]);
        let compiler = Arc::new(FakeCompiler::default());

        let css = compile_styles(
            compiler.clone(),
            &assets(&["css/slow.scss", "js/app.js", "/css/b.scss"]),
            "$x: 1;",
            "com.example.theme",
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(
            css,
            "/* com.example.theme:css/slow.scss */\r\ncompiled[$x: 1;|a {}]\r\n\
             /* com.example.theme:/css/b.scss */\r\ncompiled[$x: 1;|b {}]"
        );

        let seen = compiler.seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|r| r.include_dir == dir.path().join("css")));
    }

    #[tokio::test]
    async fn test_failure_discards_all_output() {
        let dir = theme_dir(&[("a.scss", "a {}"), ("b.scss", "@error \"boom\";")]);
        let compiler = Arc::new(FakeCompiler::default());

        let err = compile_styles(
            compiler,
            &assets(&["a.scss", "b.scss"]),
            "",
            "pkg",
            dir.path(),
        )
        .await
        .unwrap_err();

        match err {
            PreviewError::StyleCompile { file, message } => {
                assert_eq!(file, "b.scss");
                assert_eq!(message, "forced failure");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_source_fails() {
        let dir = theme_dir(&[("a.scss", "a {}")]);
        let err = compile_styles(
            Arc::new(FakeCompiler::default()),
            &assets(&["a.scss", "missing.scss"]),
            "",
            "pkg",
            dir.path(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PreviewError::Io { .. }));
    }

    #[tokio::test]
    async fn test_no_style_sources_yields_empty_css() {
        let dir = theme_dir(&[]);
        let css = compile_styles(
            Arc::new(FakeCompiler::default()),
            &assets(&["app.js", "main.css"]),
            "$a: 1;",
            "pkg",
            dir.path(),
        )
        .await
        .unwrap();
        assert_eq!(css, "");
    }

    #[tokio::test]
    async fn test_missing_compiler_program() {
        let compiler = SassCommand::new("definitely-not-a-sass-binary-4242", Vec::new());
        let err = compiler
            .compile(CompileRequest {
                file: "a.scss".to_string(),
                source: "a { color: red; }".to_string(),
                include_dir: PathBuf::from("."),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PreviewError::CompilerUnavailable { .. }));
    }

    #[test]
    fn test_is_style_source() {
        assert!(is_style_source("css/main.scss"));
        assert!(is_style_source("/css/MAIN.SCSS?v=1"));
        assert!(!is_style_source("css/main.css"));
        assert!(!is_style_source("scss/readme.md"));
    }

    #[test]
    fn test_command_line_split() {
        let command = SassCommand::from_command_line(&[
            "npx".to_string(),
            "sass".to_string(),
        ]);
        assert_eq!(command.program, "npx");
        assert_eq!(command.args, vec!["sass"]);

        assert_eq!(SassCommand::from_command_line(&[]).program, "sass");
    }
}
