//! Link classification, reference-style link inlining and local link rewriting.
//!
//! Every local link destination is turned into `#<slug>` where the slug is
//! computed exactly like the label of the file or header it points to:
//!
//! - `#frag` in `docs/a.md` becomes `#` + `slugify("docs/a.md#frag")`
//! - `b.md#x` in `docs/a.md` becomes `#` + `slugify("docs/b.md#x")`
//!
//! External links (`http://`, `https://`, `www.`) are never touched.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

use crate::config::{normalize_path, path_label};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::inline::{self, format_link, Target};
use crate::scan::{classify_lines, map_prose};
use crate::slug::slugify;

/// Where a link destination points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind<'a> {
    External(&'a str),
    /// `#fragment` inside the current file. Holds the text after `#`.
    Anchor(&'a str),
    /// Another file, optionally with a `#fragment`.
    Local {
        path: &'a str,
        fragment: Option<&'a str>,
    },
}

pub fn is_external(destination: &str) -> bool {
    destination.starts_with("http://")
        || destination.starts_with("https://")
        || destination.starts_with("www.")
}

pub fn classify(destination: &str) -> LinkKind<'_> {
    if is_external(destination) {
        LinkKind::External(destination)
    } else if let Some(fragment) = destination.strip_prefix('#') {
        LinkKind::Anchor(fragment)
    } else {
        match destination.split_once('#') {
            Some((path, fragment)) => LinkKind::Local {
                path,
                fragment: Some(fragment),
            },
            None => LinkKind::Local {
                path: destination,
                fragment: None,
            },
        }
    }
}

/// Decode `%20` and friends; invalid UTF-8 sequences are replaced.
pub fn percent_decode(destination: &str) -> String {
    percent_decode_str(destination).decode_utf8_lossy().into_owned()
}

/// Map a local destination found in `file_path` to the internal `#<slug>`
/// anchor of the file or header it designates.
pub fn resolve_local_link(destination: &str, file_path: &Path) -> String {
    let decoded = percent_decode(destination);
    if decoded.starts_with('#') {
        return format!("#{}", slugify(&format!("{}{decoded}", path_label(file_path))));
    }
    let dir = file_path.parent().unwrap_or_else(|| Path::new(""));
    let target = normalize_path(&dir.join(&decoded));
    format!("#{}", slugify(&path_label(&target)))
}

/// Rewrite every non-image inline link with a local destination through
/// `resolver`. External destinations stay byte-identical and empty ones are
/// reported and left alone.
pub fn rewrite_links(
    markdown: &str,
    file_path: &Path,
    diagnostics: &mut Diagnostics,
    resolver: &dyn Fn(&str, &Path) -> String,
) -> String {
    map_prose(markdown, |prose| {
        inline::rewrite(prose, &mut |c| {
            if c.is_image {
                return None;
            }
            let Target::Inline { destination, title } = c.target else {
                return None;
            };
            if destination.is_empty() {
                diagnostics.warn(
                    DiagnosticKind::EmptyLink,
                    file_path,
                    format!(
                        "Found empty link ([{}]()) in file [{}]",
                        c.text,
                        file_path.display()
                    ),
                );
                return None;
            }
            match classify(destination) {
                LinkKind::External(_) => None,
                LinkKind::Anchor(_) | LinkKind::Local { .. } => Some(format_link(
                    false,
                    c.text,
                    &resolver(destination, file_path),
                    title.map(|t| t.raw),
                )),
            }
        })
    })
}

/// One `[id]: destination "title"` definition. `title` keeps its delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub destination: String,
    pub title: Option<String>,
}

/// Reference definitions of one file, keyed by normalized id.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    entries: HashMap<String, Reference>,
}

impl ReferenceMap {
    pub fn get(&self, id: &str) -> Option<&Reference> {
        self.entries.get(&normalize_reference_id(id))
    }

    /// Keep the first definition of an id, like CommonMark does.
    pub fn insert(&mut self, id: &str, reference: Reference) {
        self.entries
            .entry(normalize_reference_id(id))
            .or_insert(reference);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ids match case-insensitively with inner whitespace collapsed.
pub fn normalize_reference_id(id: &str) -> String {
    id.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

static REFERENCE_DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^ {0,3}\[([^\]\^][^\]]*)\]:[ \t]*(?:<([^>\n]*)>|(\S+))(?:[ \t]+(?:"([^"]*)"|'([^']*)'|\(([^)]*)\)))?[ \t]*$"#,
    )
    .unwrap()
});

/// Remove `[id]: target "title"` lines (outside code fences) and return them
/// as a map alongside the remaining text.
pub fn extract_references(markdown: &str) -> (String, ReferenceMap) {
    let mut refs = ReferenceMap::default();
    let mut kept = Vec::new();

    for (kind, line) in classify_lines(markdown) {
        if kind.is_text() {
            if let Some(caps) = REFERENCE_DEFINITION.captures(line) {
                let destination = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .map_or("", |m| m.as_str());
                let title = if let Some(t) = caps.get(4) {
                    Some(format!("\"{}\"", t.as_str()))
                } else if let Some(t) = caps.get(5) {
                    Some(format!("'{}'", t.as_str()))
                } else {
                    caps.get(6).map(|t| format!("({})", t.as_str()))
                };
                refs.insert(
                    &caps[1],
                    Reference {
                        destination: destination.to_string(),
                        title,
                    },
                );
                continue;
            }
        }
        kept.push(line);
    }
    (kept.join("\n"), refs)
}

/// Replace reference-style usages (`[text][id]`, `[text][]`, `[text]`) that
/// have a definition with the equivalent inline link or image.
///
/// A full reference with no definition is reported; a bare `[text]` without a
/// definition is ordinary bracketed prose and stays silent.
pub fn inline_references(
    markdown: &str,
    refs: &ReferenceMap,
    file_path: &Path,
    diagnostics: &mut Diagnostics,
) -> String {
    map_prose(markdown, |prose| {
        inline::rewrite(prose, &mut |c| {
            let Target::Reference { id } = c.target else {
                return None;
            };
            let key = c.reference_id()?;
            match refs.get(key) {
                Some(r) => Some(format_link(
                    c.is_image,
                    c.text,
                    &r.destination,
                    r.title.as_deref(),
                )),
                None => {
                    if id.is_some_and(|i| !i.trim().is_empty()) {
                        diagnostics.warn(
                            DiagnosticKind::UnresolvedReference,
                            file_path,
                            format!("No definition for reference [{key}] in file [{}]", file_path.display()),
                        );
                    }
                    None
                }
            }
        })
    })
}
