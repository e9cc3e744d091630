///
/// This module implements the CLI interface for md2pdf: command parsing,
/// argument defaults and the async entrypoint.
///
/// All transformation logic (slugs, links, images, tables, rendering) lives in
/// the [`md2pdf-core`] crate. This module only wires real tool implementations
/// into the core pipeline and reports the outcome.
///
/// ## How To Use
/// - From the shell: `md2pdf build -i md2pdf.yml -o output.pdf`
/// - Programmatically or in tests: call [`run`] with a parsed [`Cli`].
///
/// [`md2pdf-core`]: ../../md2pdf-core/
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use md2pdf_core::images::{BrokenImagePolicy, ImageOptions};
use md2pdf_core::pipeline::{assemble_manifest, build_pdf, BuildRequest, Toolchain};
use md2pdf_core::render::{HttpImageProbe, PandocConverter, PdftkMerger, VersionChecker};
use std::path::PathBuf;

/// CLI for md2pdf: assemble a tree of Markdown files into one PDF.
#[derive(Parser)]
#[clap(
    name = "md2pdf",
    version,
    about = "Assemble an ordered set of Markdown files into a single cross-referenced PDF"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the PDF described by a manifest
    Build {
        /// Path to the YAML manifest
        #[clap(short = 'i', long, visible_alias = "input", default_value = "md2pdf.yml")]
        config: PathBuf,
        /// Where to write the PDF
        #[clap(short, long, default_value = "output.pdf")]
        output: PathBuf,
        /// What replaces images that cannot be embedded: marker or remove
        #[clap(long, default_value = "marker")]
        broken_images: BrokenImagePolicy,
        /// Do not probe remote images over the network
        #[clap(long)]
        offline: bool,
        /// Also write the assembled Markdown to this path
        #[clap(long)]
        keep_markdown: Option<PathBuf>,
        /// Print the build report as JSON on stdout
        #[clap(long)]
        json: bool,
    },
    /// Assemble the Markdown without rendering it
    Assemble {
        /// Path to the YAML manifest
        #[clap(short = 'i', long, visible_alias = "input", default_value = "md2pdf.yml")]
        config: PathBuf,
        /// Where to write the Markdown; stdout when omitted or `-`
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// What replaces images that cannot be embedded: marker or remove
        #[clap(long, default_value = "marker")]
        broken_images: BrokenImagePolicy,
        /// Do not probe remote images over the network
        #[clap(long)]
        offline: bool,
    },
}

fn image_options(broken_images: BrokenImagePolicy) -> Result<ImageOptions> {
    Ok(ImageOptions {
        working_dir: std::env::current_dir()?,
        broken_images,
    })
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Build {
            config,
            output,
            broken_images,
            offline,
            keep_markdown,
            json,
        } => {
            let config = load_config(config)?;
            tracing::info!(command = "build", manifest = ?config.manifest_path, "Starting build");

            let converter = PandocConverter::new(config.tools.pandoc.clone());
            let merger = PdftkMerger::new(config.tools.pdftk.clone());
            let probe = HttpImageProbe::new(offline);
            let toolchain = Toolchain {
                converter: &converter,
                merger: &merger,
                checker: &VersionChecker,
                probe: &probe,
            };
            let request = BuildRequest {
                manifest: config.manifest,
                output,
                images: image_options(broken_images)?,
                tools: config.tools,
                keep_markdown,
            };

            match build_pdf(&request, &toolchain).await {
                Ok(report) => {
                    tracing::info!(command = "build", ?report, "Build complete");
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        println!(
                            "Wrote {} ({} files, {} warnings)",
                            report.output.display(),
                            report.sources.len(),
                            report.diagnostics.len()
                        );
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "build", error = %e, "Build failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Assemble {
            config,
            output,
            broken_images,
            offline,
        } => {
            let config = load_config(config)?;
            tracing::info!(command = "assemble", manifest = ?config.manifest_path, "Starting assembly");

            let probe = HttpImageProbe::new(offline);
            let images = image_options(broken_images)?;
            let assembled = assemble_manifest(&config.manifest, &images, &probe)
                .await
                .map_err(|e| {
                    tracing::error!(command = "assemble", error = %e, "Assembly failed");
                    anyhow::Error::new(e)
                })?;

            match output.filter(|p| p.as_os_str() != "-") {
                Some(path) => {
                    std::fs::write(&path, &assembled.markdown)?;
                    tracing::info!(command = "assemble", path = %path.display(), "Markdown written");
                }
                None => print!("{}", assembled.markdown),
            }
            tracing::info!(
                command = "assemble",
                files = assembled.sources.len(),
                warnings = assembled.diagnostics.len(),
                "Assembly complete"
            );
            Ok(())
        }
    }
}
