use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// The build manifest: which Markdown files go into the PDF, in which order,
/// and what goes on the cover page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub files_order: Vec<PathBuf>,
    #[serde(default)]
    pub cover_metadata: Option<CoverMetadata>,
}

/// Cover page contents. `title` fills the template; every other key is
/// printed as a `**key**: value` line in the order it sorts in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, MetadataValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Flag(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Flag(b) => write!(f, "{b}"),
            MetadataValue::Integer(n) => write!(f, "{n}"),
            MetadataValue::Float(x) => write!(f, "{x}"),
            MetadataValue::Text(s) => f.write_str(s),
        }
    }
}

impl Manifest {
    pub fn trace_loaded(&self) {
        info!(
            files = self.files_order.len(),
            cover = self.cover_metadata.is_some(),
            "Loaded manifest"
        );
        debug!(?self, "Manifest loaded (full debug)");
    }

    /// Rebase relative `files_order` entries onto `base`, the directory the
    /// manifest was read from, so a manifest works from any working directory.
    /// The rebased paths are what every slug is derived from.
    pub fn relative_to(mut self, base: &Path) -> Self {
        self.files_order = self
            .files_order
            .iter()
            .map(|p| normalize_path(&base.join(p)))
            .collect();
        debug!(base = %base.display(), files = ?self.files_order, "Rebased manifest entries");
        self
    }

    /// Source paths as the pipeline should open them.
    ///
    /// Entries are kept relative so they double as the stable identity used for
    /// slugs; only absolute entries are normalized.
    pub fn source_paths(&self) -> Vec<PathBuf> {
        self.files_order
            .iter()
            .map(|p| {
                if p.is_absolute() {
                    normalize_path(p)
                } else {
                    p.clone()
                }
            })
            .collect()
    }
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
///
/// `..` past the start of a relative path is kept, `..` past the root is
/// dropped, and an empty result becomes `.`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Text form of a path used as slug input.
pub fn path_label(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
