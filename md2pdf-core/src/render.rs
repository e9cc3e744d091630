//! Production implementations of the contract traits: pandoc, pdftk,
//! `--version` checks and an HTTP/filesystem image probe.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::contract::{Converter, ImageProbe, PdfMerger, RenderOptions, ToolChecker, ToolError};

/// LaTeX preamble bundled with the binary and passed to pandoc with `-H`.
pub const LATEX_HEADER: &str = include_str!("../assets/header.tex");

/// Program names (or paths) of the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub pandoc: String,
    pub pdf_engine: String,
    pub pdftk: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            pandoc: "pandoc".to_string(),
            pdf_engine: "xelatex".to_string(),
            pdftk: "pdftk".to_string(),
        }
    }
}

async fn run_tool(tool: &str, mut command: Command) -> Result<(), ToolError> {
    debug!(tool, command = ?command, "Running external tool");
    let status = command.status().await.map_err(|e| {
        error!(error = ?e, tool, "Failed to launch external tool");
        ToolError::Launch {
            tool: tool.to_string(),
            source: e,
        }
    })?;
    if status.success() {
        info!(tool, "External tool finished");
        Ok(())
    } else {
        error!(tool, status = ?status, "External tool failed");
        Err(ToolError::Failed {
            tool: tool.to_string(),
            code: status.code(),
        })
    }
}

/// Command-line arguments for one pandoc run.
pub fn pandoc_args(
    input: &Path,
    output: &Path,
    header: Option<&Path>,
    options: &RenderOptions,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![format!("--pdf-engine={}", options.pdf_engine).into()];
    if let Some(depth) = options.toc_depth {
        args.push("--toc".into());
        args.push(format!("--toc-depth={depth}").into());
    }
    if options.listings {
        args.push("--listings".into());
    }
    if let Some(header) = header {
        args.push("-H".into());
        args.push(header.into());
    }
    args.push("--from".into());
    args.push(options.from.clone().into());
    args.push("--output".into());
    args.push(output.into());
    args.push(input.into());
    args
}

/// Runs pandoc on a temporary copy of the Markdown.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: String,
}

impl PandocConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Converter for PandocConverter {
    async fn render(
        &self,
        markdown: &str,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<(), ToolError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("document.md");
        tokio::fs::write(&input, markdown).await?;

        let header = if options.include_header {
            let path = workdir.path().join("header.tex");
            tokio::fs::write(&path, LATEX_HEADER).await?;
            Some(path)
        } else {
            None
        };

        info!(output = %output.display(), "Rendering PDF with pandoc");
        let mut command = Command::new(&self.program);
        command.args(pandoc_args(&input, output, header.as_deref(), options));
        run_tool(&self.program, command).await
    }
}

/// Concatenates PDFs with `pdftk cover body output out`.
#[derive(Debug, Clone)]
pub struct PdftkMerger {
    program: String,
}

impl PdftkMerger {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl PdfMerger for PdftkMerger {
    async fn merge(&self, cover: &Path, body: &Path, output: &Path) -> Result<(), ToolError> {
        info!(output = %output.display(), "Merging cover and body");
        let mut command = Command::new(&self.program);
        command.arg(cover).arg(body).arg("output").arg(output);
        run_tool(&self.program, command).await
    }
}

/// Considers a tool installed when `<tool> --version` exits successfully.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionChecker;

#[async_trait]
impl ToolChecker for VersionChecker {
    async fn check(&self, tool: &str) -> Result<(), ToolError> {
        let status = Command::new(tool)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(s) if s.success() => {
                debug!(tool, "Tool is installed");
                Ok(())
            }
            Ok(s) => {
                error!(tool, status = ?s, "Tool version check failed");
                Err(ToolError::NotInstalled {
                    tool: tool.to_string(),
                })
            }
            Err(e) => {
                error!(tool, error = ?e, "Tool could not be launched");
                Err(ToolError::NotInstalled {
                    tool: tool.to_string(),
                })
            }
        }
    }
}

/// Checks local images on disk and remote images over HTTP.
///
/// In offline mode every remote image is assumed reachable.
#[derive(Debug, Clone)]
pub struct HttpImageProbe {
    client: reqwest::Client,
    offline: bool,
}

impl HttpImageProbe {
    pub fn new(offline: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = ?e, "Falling back to a default HTTP client");
                reqwest::Client::new()
            });
        Self { client, offline }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn local_exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn remote_reachable(&self, url: &str) -> bool {
        if self.offline {
            debug!(url, "Offline mode, assuming remote image is reachable");
            return true;
        }
        match self.client.head(url).send().await {
            Ok(resp) if resp.status().is_success() => return true,
            Ok(resp) => debug!(url, status = %resp.status(), "HEAD refused, retrying with GET"),
            Err(e) => debug!(url, error = ?e, "HEAD failed, retrying with GET"),
        }
        match self.client.get(url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(url, error = ?e, "Remote image not reachable");
                false
            }
        }
    }
}
