use std::path::PathBuf;
use thiserror::Error;

/// Failures of the external programs (pandoc, the PDF engine, pdftk).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Aborted: {tool} is not correctly installed")]
    NotInstalled { tool: String },

    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed with exit code {}", .code.map_or_else(|| "none (killed by signal)".to_string(), |c| c.to_string()))]
    Failed { tool: String, code: Option<i32> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Anything that stops a build. Per-file content problems are diagnostics,
/// never errors.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("the manifest lists no files")]
    NoSources,

    #[error("input file [{}] not found", .path.display())]
    MissingSource { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("failed to write {}: {source}", .path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
