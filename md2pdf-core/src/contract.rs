//! # contract: seams to the outside world
//!
//! Everything the pipeline needs from external programs or the network goes
//! through one of the traits below, so the whole build can run in tests
//! against generated mocks:
//!
//! - [`Converter`] turns Markdown into a PDF (pandoc + a LaTeX engine).
//! - [`PdfMerger`] concatenates a cover and a body PDF (pdftk).
//! - [`ToolChecker`] verifies a program is installed before any work starts.
//! - [`ImageProbe`] answers whether an image can be embedded.
//!
//! Production implementations live in [`crate::render`]. With the
//! `test-export-mocks` feature (on by default) `mockall` generates
//! `MockConverter`, `MockPdfMerger`, `MockToolChecker` and `MockImageProbe`.

use async_trait::async_trait;
use std::path::Path;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

pub use crate::error::ToolError;

/// Pandoc options for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Reader spec passed to `--from`.
    pub from: String,
    pub pdf_engine: String,
    /// Emit a table of contents of this depth.
    pub toc_depth: Option<u8>,
    /// Typeset code blocks with the `listings` package.
    pub listings: bool,
    /// Include the bundled LaTeX header (page layout, `\BreakableChar`).
    pub include_header: bool,
}

impl RenderOptions {
    pub const MARKDOWN_FLAVOUR: &'static str = "markdown+lists_without_preceding_blankline";

    /// Options for the document body.
    pub fn body(pdf_engine: &str) -> Self {
        Self {
            from: Self::MARKDOWN_FLAVOUR.to_string(),
            pdf_engine: pdf_engine.to_string(),
            toc_depth: Some(3),
            listings: true,
            include_header: true,
        }
    }

    /// Options for the cover page: no table of contents, no header.
    pub fn cover(pdf_engine: &str) -> Self {
        Self {
            from: Self::MARKDOWN_FLAVOUR.to_string(),
            pdf_engine: pdf_engine.to_string(),
            toc_depth: None,
            listings: false,
            include_header: false,
        }
    }
}

/// Converts a Markdown string into a PDF written at `output`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Converter: Send + Sync {
    async fn render(
        &self,
        markdown: &str,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<(), ToolError>;
}

/// Writes `cover` followed by `body` into `output`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PdfMerger: Send + Sync {
    async fn merge(&self, cover: &Path, body: &Path, output: &Path) -> Result<(), ToolError>;
}

/// Verifies that an external program can be run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ToolChecker: Send + Sync {
    async fn check(&self, tool: &str) -> Result<(), ToolError>;
}

/// Availability checks for images. Neither method fails: anything that goes
/// wrong while probing means "not available".
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn local_exists(&self, path: &Path) -> bool;
    async fn remote_reachable(&self, url: &str) -> bool;
}
