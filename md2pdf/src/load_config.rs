/// `load_config` module: reads the YAML manifest and resolves the external tool
/// names from the environment.
///
/// # Responsibilities
/// - Fail early with the classic `input file [..] not found` message
/// - Parse the manifest (`files_order`, optional `cover_metadata`)
/// - Reject manifests that list no files
/// - Resolve `files_order` entries against the manifest's directory
/// - Apply `MD2PDF_PANDOC`, `MD2PDF_PDF_ENGINE` and `MD2PDF_PDFTK` overrides
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use md2pdf_core::config::Manifest;
use md2pdf_core::render::ToolPaths;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const PANDOC_ENV: &str = "MD2PDF_PANDOC";
pub const PDF_ENGINE_ENV: &str = "MD2PDF_PDF_ENGINE";
pub const PDFTK_ENV: &str = "MD2PDF_PDFTK";

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    pub tools: ToolPaths,
}

/// Tool names, defaulting to `pandoc`, `xelatex` and `pdftk`.
pub fn tool_paths_from_env() -> ToolPaths {
    let defaults = ToolPaths::default();
    let var = |name: &str, default: String| {
        std::env::var(name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(default)
    };
    ToolPaths {
        pandoc: var(PANDOC_ENV, defaults.pandoc),
        pdf_engine: var(PDF_ENGINE_ENV, defaults.pdf_engine),
        pdftk: var(PDFTK_ENV, defaults.pdftk),
    }
}

/// Loads the YAML manifest at `path` and the tool configuration.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading manifest from file");

    if !path_ref.is_file() {
        error!(config_path = ?path_ref, "Manifest file not found");
        return Err(anyhow::anyhow!(
            "input file [{}] not found",
            path_ref.display()
        ));
    }

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Manifest file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read manifest file");
            return Err(anyhow::anyhow!(
                "Failed to read manifest file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let manifest: Manifest = match serde_yaml::from_str(&content) {
        Ok(manifest) => {
            info!(config_path = ?path_ref, "Parsed manifest YAML successfully");
            manifest
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse manifest YAML");
            return Err(anyhow::anyhow!("Failed to parse manifest YAML: {e}"));
        }
    };

    if manifest.files_order.is_empty() {
        error!(config_path = ?path_ref, "Manifest lists no files");
        return Err(anyhow::anyhow!(
            "Manifest {} has an empty files_order",
            path_ref.display()
        ));
    }
    let base = path_ref.parent().unwrap_or_else(|| Path::new(""));
    let manifest = manifest.relative_to(base);
    manifest.trace_loaded();

    Ok(CliConfig {
        manifest_path: path_ref.to_path_buf(),
        manifest,
        tools: tool_paths_from_env(),
    })
}
