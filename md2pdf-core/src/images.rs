//! Image resolution.
//!
//! Runs in two phases so the availability checks can go out concurrently:
//! [`collect_targets`] lists every distinct image of a file, the probe checks
//! them all at once, and [`rewrite_images`] then rewrites the text knowing
//! which targets are available.
//!
//! Local images are rewritten to an absolute path (working directory, then the
//! source file's directory, then the destination). Remote images keep their
//! destination. Broken or unsupported images are replaced according to the
//! [`BrokenImagePolicy`].

use futures::future::join_all;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::config::normalize_path;
use crate::contract::ImageProbe;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::fixups::escape_latex;
use crate::inline::{self, format_link, Target};
use crate::links::{is_external, percent_decode};
use crate::scan::{map_prose, split_blocks, Block};

/// What to put in place of an image that cannot be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrokenImagePolicy {
    /// A red `Image Not Found` line naming the missing source.
    #[default]
    Marker,
    /// A single space.
    Remove,
}

impl FromStr for BrokenImagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "marker" => Ok(BrokenImagePolicy::Marker),
            "remove" => Ok(BrokenImagePolicy::Remove),
            other => Err(format!("unknown broken image policy '{other}' (expected marker or remove)")),
        }
    }
}

/// Where an image destination points once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    Local(PathBuf),
    /// URL as it should be probed (`www.` hosts get an `http://` scheme).
    Remote(String),
}

#[derive(Debug, Clone)]
pub struct ImageOptions {
    pub working_dir: PathBuf,
    pub broken_images: BrokenImagePolicy,
}

pub fn image_target(destination: &str, file_path: &Path, working_dir: &Path) -> ImageTarget {
    if is_external(destination) {
        if destination.starts_with("www.") {
            return ImageTarget::Remote(format!("http://{destination}"));
        }
        return ImageTarget::Remote(destination.to_string());
    }
    let dir = file_path.parent().unwrap_or_else(|| Path::new(""));
    let decoded = percent_decode(destination);
    ImageTarget::Local(normalize_path(&working_dir.join(dir).join(decoded)))
}

/// The renderer cannot embed SVG, whatever the probe says.
pub fn is_unsupported(destination: &str) -> bool {
    let path = destination
        .split(['?', '#'])
        .next()
        .unwrap_or(destination);
    path.to_ascii_lowercase().ends_with(".svg")
}

/// Every distinct image target of a file that needs probing.
pub fn collect_targets(markdown: &str, file_path: &Path, working_dir: &Path) -> Vec<ImageTarget> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for block in split_blocks(markdown) {
        let Block::Prose(prose) = block else {
            continue;
        };
        inline::visit(prose, |c| {
            if !c.is_image {
                return;
            }
            if let Target::Inline { destination, .. } = c.target {
                if is_unsupported(destination) {
                    return;
                }
                let target = image_target(destination, file_path, working_dir);
                if seen.insert(target.clone()) {
                    targets.push(target);
                }
            }
        });
    }
    targets
}

/// Probe every target concurrently and return those that are available.
pub async fn probe_targets(targets: &[ImageTarget], probe: &dyn ImageProbe) -> HashSet<ImageTarget> {
    let checks = targets.iter().map(|target| async move {
        let ok = match target {
            ImageTarget::Local(path) => probe.local_exists(path).await,
            ImageTarget::Remote(url) => probe.remote_reachable(url).await,
        };
        debug!(target = ?target, available = ok, "Probed image");
        (target, ok)
    });
    join_all(checks)
        .await
        .into_iter()
        .filter(|(_, ok)| *ok)
        .map(|(target, _)| target.clone())
        .collect()
}

/// LaTeX shown in place of a broken image.
pub fn broken_image_marker(source: &str) -> String {
    format!(
        "\\textcolor{{red}}{{Image Not Found \\texttt{{{}}}}}",
        escape_latex(source)
    )
}

/// Rewrite every image given which targets are available.
pub fn rewrite_images(
    markdown: &str,
    file_path: &Path,
    options: &ImageOptions,
    available: &HashSet<ImageTarget>,
    diagnostics: &mut Diagnostics,
) -> String {
    map_prose(markdown, |prose| {
        inline::rewrite(prose, &mut |c| {
            if !c.is_image {
                return None;
            }
            let Target::Inline { destination, title } = c.target else {
                return None;
            };

            if is_unsupported(destination) {
                diagnostics.warn(
                    DiagnosticKind::UnsupportedImage,
                    file_path,
                    format!("SVG format is not currently supported: {destination}"),
                );
                return Some(replacement(options.broken_images, destination));
            }

            let target = image_target(destination, file_path, &options.working_dir);
            if !available.contains(&target) {
                let message = match &target {
                    ImageTarget::Local(_) => format!(
                        "Ignoring local image not found [{destination}] in file [{}]",
                        file_path.display()
                    ),
                    ImageTarget::Remote(_) => format!(
                        "Ignoring remote image not reachable [{destination}] in file [{}]",
                        file_path.display()
                    ),
                };
                diagnostics.warn(DiagnosticKind::BrokenImage, file_path, message);
                return Some(replacement(options.broken_images, destination));
            }

            match target {
                ImageTarget::Local(path) => Some(format_link(
                    true,
                    c.text,
                    &path.to_string_lossy(),
                    title.map(|t| t.raw),
                )),
                ImageTarget::Remote(_) => None,
            }
        })
    })
}

fn replacement(policy: BrokenImagePolicy, source: &str) -> String {
    match policy {
        BrokenImagePolicy::Marker => broken_image_marker(source),
        BrokenImagePolicy::Remove => " ".to_string(),
    }
}

/// Resolve every image of one file: collect, probe concurrently, rewrite.
pub async fn resolve_images(
    markdown: &str,
    file_path: &Path,
    options: &ImageOptions,
    probe: &dyn ImageProbe,
    diagnostics: &mut Diagnostics,
) -> String {
    let targets = collect_targets(markdown, file_path, &options.working_dir);
    let available = probe_targets(&targets, probe).await;
    rewrite_images(markdown, file_path, options, &available, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Remove".parse::<BrokenImagePolicy>(), Ok(BrokenImagePolicy::Remove));
        assert!("drop".parse::<BrokenImagePolicy>().is_err());
    }

    #[test]
    fn marker_escapes_latex_specials() {
        assert_eq!(
            broken_image_marker("img_1#a.png"),
            "\\textcolor{red}{Image Not Found \\texttt{img\\_1\\#a.png}}"
        );
    }

    #[test]
    fn targets_are_resolved_and_deduplicated() {
        let md = "![a](img/x.png) ![b](img/x.png)\n![c](www.example.org/y.png) ![d](z.svg)";
        let targets = collect_targets(md, Path::new("docs/a.md"), Path::new("/work"));
        assert_eq!(
            targets,
            vec![
                ImageTarget::Local(PathBuf::from("/work/docs/img/x.png")),
                ImageTarget::Remote("http://www.example.org/y.png".to_string()),
            ]
        );
    }
}
