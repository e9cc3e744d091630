use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// What kind of recoverable problem was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Local image missing on disk or remote image not reachable.
    BrokenImage,
    /// Image format the renderer cannot embed (SVG).
    UnsupportedImage,
    /// `[text]()` with nothing between the parentheses.
    EmptyLink,
    /// `[text][id]` with no `[id]: ...` definition.
    UnresolvedReference,
    /// Separator row of a pipe table disagrees with its header.
    TableColumnMismatch,
    /// Body row of a pipe table has more cells than the header.
    TableRowOverflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: PathBuf,
    pub message: String,
}

/// Warnings collected over a whole build, in the order they were found.
///
/// Every entry is also logged at `WARN` the moment it is recorded.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, kind: DiagnosticKind, file: &Path, message: impl Into<String>) {
        let message = message.into();
        warn!(kind = ?kind, file = %file.display(), "{message}");
        self.entries.push(Diagnostic {
            kind,
            file: file.to_path_buf(),
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
