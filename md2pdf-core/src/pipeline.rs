//! Top-level orchestration: Markdown files in manifest order → one document → PDF.
//!
//! [`DocumentPipeline`] owns the state that spans files (the [`IdRegistry`]
//! and the [`Diagnostics`] sink) and runs every per-file stage in a fixed
//! order:
//!
//! 1. whitespace normalization, fence indentation, anchor `id` removal
//! 2. HTML/header and image spacing, URL escaping
//! 3. reference definitions extracted and inlined
//! 4. images resolved (probed concurrently)
//! 5. local links rewritten to `#<slug>`
//! 6. header and anchor labels
//! 7. image float hack, header spacing, adjacent label separation
//! 8. pipe tables to grid tables
//!
//! Each file is then wrapped in a page break and its file label and appended.
//!
//! [`build_pdf`] adds the external steps around that: tool checks first, then
//! the body render, the optional cover render and merge. Intermediates live in
//! a temporary directory and the output path is only written once every step
//! has succeeded.
//!
//! # Error Handling
//! Content problems (broken images, empty links, malformed tables, ...) are
//! recorded as diagnostics and never stop the build. Unreadable sources and
//! failing tools abort it with a [`BuildError`].

use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::anchors::{self, label_construct};
use crate::config::{path_label, Manifest};
use crate::contract::{Converter, ImageProbe, PdfMerger, RenderOptions, ToolChecker};
use crate::cover::cover_markdown;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{BuildError, ToolError};
use crate::fixups;
use crate::images::{self, ImageOptions};
use crate::links;
use crate::render::ToolPaths;
use crate::slug::{slugify, IdRegistry};
use crate::tables;

/// Separator placed before every file: a page break, then the file label.
pub fn page_section(file_label: &str, content: &str) -> String {
    format!(
        "\n\n\\newpage\n\n{}\n\n{content}\n",
        label_construct(&[file_label.to_string()])
    )
}

/// Per-build state plus the per-file transformation stages.
pub struct DocumentPipeline<'p> {
    images: ImageOptions,
    probe: &'p dyn ImageProbe,
    registry: IdRegistry,
    diagnostics: Diagnostics,
}

impl<'p> DocumentPipeline<'p> {
    pub fn new(images: ImageOptions, probe: &'p dyn ImageProbe) -> Self {
        Self {
            images,
            probe,
            registry: IdRegistry::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Register and return the label id of a whole file.
    pub fn file_label(&mut self, file_path: &Path) -> String {
        self.registry
            .make_unique(&slugify(&path_label(file_path)))
    }

    /// Run every per-file stage on `content`, the text of `file_path`.
    pub async fn process_document(&mut self, file_path: &Path, content: &str) -> String {
        debug!(file = %file_path.display(), "Normalizing document");
        let text = fixups::normalize_whitespace(content);
        let text = fixups::strip_fence_indent(&text);
        let text = fixups::strip_anchor_ids(&text);
        let text = fixups::space_html_before_header(&text);
        let text = fixups::space_standalone_images(&text);
        let text = fixups::escape_url_specials(&text);

        let (text, refs) = links::extract_references(&text);
        debug!(file = %file_path.display(), references = refs.len(), "Extracted reference definitions");
        let text = links::inline_references(&text, &refs, file_path, &mut self.diagnostics);

        let text = images::resolve_images(
            &text,
            file_path,
            &self.images,
            self.probe,
            &mut self.diagnostics,
        )
        .await;
        let text = links::rewrite_links(
            &text,
            file_path,
            &mut self.diagnostics,
            &links::resolve_local_link,
        );

        let text = anchors::rewrite_anchors(&text, file_path, &mut self.registry);
        let text = fixups::prevent_image_floating(&text);
        let text = fixups::blank_line_before_headers(&text);
        let text = fixups::separate_adjacent_labels(&text);
        tables::translate_tables(&text, file_path, &mut self.diagnostics)
    }

    /// Read and process `files` in order and concatenate them into one document.
    ///
    /// Paths are opened relative to the working directory but slugged as
    /// written, so links between files resolve to the same ids.
    pub async fn assemble(&mut self, files: &[PathBuf]) -> Result<String, BuildError> {
        if files.is_empty() {
            error!("[ASSEMBLE][ERROR] No files to assemble");
            return Err(BuildError::NoSources);
        }
        let mut document = String::new();
        for file in files {
            let content = read_source(&self.images.working_dir.join(file)).await?;
            let label = self.file_label(file);
            let body = self.process_document(file, &content).await;
            document.push_str(&page_section(&label, &body));
            info!(file = %file.display(), label = %label, "[ASSEMBLE] Document processed");
        }
        Ok(document)
    }
}

async fn read_source(path: &Path) -> Result<String, BuildError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!(path = %path.display(), "Source file not found");
            return Err(BuildError::MissingSource {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            error!(error = ?e, path = %path.display(), "Failed to read source file");
            return Err(BuildError::ReadSource {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(path = %path.display(), "Source is not valid UTF-8, replacing invalid sequences");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Result of assembling a manifest without rendering it.
#[derive(Debug)]
pub struct Assembled {
    pub markdown: String,
    pub sources: Vec<PathBuf>,
    pub labels: usize,
    pub diagnostics: Diagnostics,
}

/// Assemble every file of `manifest` into one Markdown document.
pub async fn assemble_manifest(
    manifest: &Manifest,
    images: &ImageOptions,
    probe: &dyn ImageProbe,
) -> Result<Assembled, BuildError> {
    let sources = manifest.source_paths();
    info!(files = sources.len(), "[ASSEMBLE] Starting");
    let mut pipeline = DocumentPipeline::new(images.clone(), probe);
    let markdown = pipeline.assemble(&sources).await?;
    let labels = pipeline.registry().len();
    let diagnostics = pipeline.into_diagnostics();
    info!(
        files = sources.len(),
        labels,
        warnings = diagnostics.len(),
        "[ASSEMBLE] Complete"
    );
    Ok(Assembled {
        markdown,
        sources,
        labels,
        diagnostics,
    })
}

/// External collaborators of a build.
#[derive(Clone, Copy)]
pub struct Toolchain<'t> {
    pub converter: &'t dyn Converter,
    pub merger: &'t dyn PdfMerger,
    pub checker: &'t dyn ToolChecker,
    pub probe: &'t dyn ImageProbe,
}

#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub manifest: Manifest,
    pub output: PathBuf,
    pub images: ImageOptions,
    pub tools: ToolPaths,
    /// Also write the assembled Markdown here.
    pub keep_markdown: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct BuildReport {
    pub output: PathBuf,
    pub sources: Vec<PathBuf>,
    pub labels: usize,
    pub cover: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Check every program the build will run. pdftk only matters with a cover.
pub async fn check_tools(
    tools: &ToolPaths,
    with_cover: bool,
    checker: &dyn ToolChecker,
) -> Result<(), ToolError> {
    let mut required = vec![tools.pandoc.as_str(), tools.pdf_engine.as_str()];
    if with_cover {
        required.push(tools.pdftk.as_str());
    }
    for tool in required {
        checker.check(tool).await?;
    }
    Ok(())
}

async fn write_output(from: &Path, to: &Path) -> Result<(), BuildError> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BuildError::WriteOutput {
                path: to.to_path_buf(),
                source: e,
            })?;
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| BuildError::WriteOutput {
            path: to.to_path_buf(),
            source: e,
        })?;
    Ok(())
}

/// Build the PDF described by `request`.
pub async fn build_pdf(
    request: &BuildRequest,
    toolchain: &Toolchain<'_>,
) -> Result<BuildReport, BuildError> {
    info!(output = %request.output.display(), "[BUILD] Starting PDF build");
    let with_cover = request.manifest.cover_metadata.is_some();
    if let Err(e) = check_tools(&request.tools, with_cover, toolchain.checker).await {
        error!(error = %e, "[BUILD][ERROR] Required tool missing");
        return Err(e.into());
    }

    let assembled = assemble_manifest(&request.manifest, &request.images, toolchain.probe).await?;
    if let Some(path) = &request.keep_markdown {
        tokio::fs::write(path, &assembled.markdown)
            .await
            .map_err(|e| BuildError::WriteOutput {
                path: path.clone(),
                source: e,
            })?;
        info!(path = %path.display(), "[BUILD] Assembled Markdown kept");
    }

    let workdir = tempfile::tempdir()?;
    let engine = &request.tools.pdf_engine;
    let body = workdir.path().join("body.pdf");
    toolchain
        .converter
        .render(&assembled.markdown, &body, &RenderOptions::body(engine))
        .await?;
    info!("[BUILD] Body rendered");

    let finished = match &request.manifest.cover_metadata {
        Some(metadata) => {
            let cover = workdir.path().join("cover.pdf");
            toolchain
                .converter
                .render(&cover_markdown(metadata), &cover, &RenderOptions::cover(engine))
                .await?;
            info!("[BUILD] Cover rendered");
            let merged = workdir.path().join("merged.pdf");
            toolchain.merger.merge(&cover, &body, &merged).await?;
            merged
        }
        None => body,
    };

    write_output(&finished, &request.output).await?;
    info!(output = %request.output.display(), "[BUILD] PDF written");

    Ok(BuildReport {
        output: request.output.clone(),
        sources: assembled.sources,
        labels: assembled.labels,
        cover: with_cover,
        diagnostics: assembled.diagnostics.into_vec(),
    })
}
