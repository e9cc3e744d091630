//! Header labels and HTML anchors.
//!
//! Every header gets a label whose id is the slug of the file path followed by
//! the slug of the header text, made unique by the [`IdRegistry`]. HTML
//! anchors (`<a name="x"></a>`) become labels with id `slug(file) + slug(x)`:
//! anchors that sit on their own line right before a header, or inside the
//! header itself, are folded into the header's label so the header and all its
//! aliases share one construct.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::config::path_label;
use crate::inline::{self, Target};
use crate::scan::{classify_lines, detect_header, header_text, is_blank};
use crate::slug::{slugify, IdRegistry};

/// Start of every label construct emitted into the document.
pub const LABEL_MARKER: &str = "\\phantomsection";

static HTML_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<a\s+(?:[^>]*?\s)?name\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*?(?:/>|>(?:\s*</a>)?)"#,
    )
    .unwrap()
});

static CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"`+([^`]*)`+").unwrap());

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>").unwrap());

/// One raw-LaTeX construct defining every id in `ids` at the same position.
///
/// `\hypertarget` serves `#id` links the way pandoc writes them and `\label`
/// serves `\ref`-style references.
pub fn label_construct(ids: &[String]) -> String {
    let mut out = String::from(LABEL_MARKER);
    for id in ids {
        out.push_str(&format!("\\hypertarget{{{id}}}{{}}\\label{{{id}}}"));
    }
    out
}

/// Header text reduced to what should feed the slug: anchors removed, code
/// markers dropped, links and images replaced by their text.
pub fn header_slug_text(text: &str) -> String {
    let without_anchors = HTML_ANCHOR.replace_all(text, "");
    let without_links = inline::rewrite(&without_anchors, &mut |c| match c.target {
        Target::Inline { .. } => Some(c.text.to_string()),
        Target::Reference { .. } => None,
    });
    let without_code = CODE_SPAN.replace_all(&without_links, "$1");
    HTML_TAG.replace_all(&without_code, "").into_owned()
}

/// Names of the HTML anchors in `line` and the line with them removed.
fn take_anchors(line: &str) -> (String, Vec<String>) {
    let names = HTML_ANCHOR
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect::<Vec<_>>();
    if names.is_empty() {
        return (line.to_string(), names);
    }
    (HTML_ANCHOR.replace_all(line, "").into_owned(), names)
}

struct LabelWriter<'r> {
    file_slug: String,
    registry: &'r mut IdRegistry,
    out: Vec<String>,
    /// Ids of standalone anchor lines waiting for the next header.
    pending: Vec<String>,
}

impl LabelWriter<'_> {
    fn anchor_id(&mut self, name: &str) -> String {
        self.registry
            .make_unique(&format!("{}{}", self.file_slug, slugify(name)))
    }

    fn push_label(&mut self, ids: &[String]) {
        if self.out.last().is_some_and(|l| !is_blank(l)) {
            self.out.push(String::new());
        }
        self.out.push(label_construct(ids));
        self.out.push(String::new());
    }

    fn flush_pending(&mut self) {
        if !self.pending.is_empty() {
            let ids = std::mem::take(&mut self.pending);
            self.push_label(&ids);
        }
    }
}

/// Insert a label before every header and turn HTML anchors into labels.
///
/// Fenced code is copied through untouched. Ids are minted in document order,
/// so running files in manifest order gives reproducible `-N` suffixes.
pub fn rewrite_anchors(markdown: &str, file_path: &Path, registry: &mut IdRegistry) -> String {
    let lines = classify_lines(markdown);
    let mut writer = LabelWriter {
        file_slug: slugify(&path_label(file_path)),
        registry,
        out: Vec::with_capacity(lines.len()),
        pending: Vec::new(),
    };

    for (i, &(kind, line)) in lines.iter().enumerate() {
        if !kind.is_text() {
            writer.flush_pending();
            writer.out.push(line.to_string());
            continue;
        }

        let next = lines
            .get(i + 1)
            .filter(|(k, _)| k.is_text())
            .map(|&(_, l)| l);
        if let Some(header) = detect_header(line, next) {
            let (stripped, names) = take_anchors(line);
            let slug_input = header_slug_text(header_text(line, header));
            let mut ids = vec![writer.registry.make_unique(&format!(
                "{}{}",
                writer.file_slug,
                slugify(&slug_input)
            ))];
            ids.append(&mut writer.pending);
            for name in &names {
                let id = writer.anchor_id(name);
                ids.push(id);
            }
            writer.push_label(&ids);
            writer.out.push(stripped);
            continue;
        }

        let (stripped, names) = take_anchors(line);
        if !names.is_empty() && is_blank(&stripped) {
            for name in &names {
                let id = writer.anchor_id(name);
                writer.pending.push(id);
            }
            continue;
        }
        if is_blank(line) && !writer.pending.is_empty() {
            continue;
        }

        writer.flush_pending();
        if names.is_empty() {
            writer.out.push(line.to_string());
        } else {
            let replaced = HTML_ANCHOR
                .replace_all(line, |caps: &regex::Captures<'_>| {
                    let name = caps
                        .get(1)
                        .or_else(|| caps.get(2))
                        .map_or("", |m| m.as_str());
                    let id = writer.anchor_id(name);
                    label_construct(&[id])
                })
                .into_owned();
            writer.out.push(replaced);
        }
    }
    writer.flush_pending();
    writer.out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_slug_text_drops_markup() {
        assert_eq!(
            header_slug_text("Using `cargo` with [docs](https://x.org) <a name=\"x\"></a>"),
            "Using cargo with docs "
        );
    }

    #[test]
    fn anchor_regex_tolerates_attribute_order_and_quotes() {
        for html in [
            "<a name=\"top\"></a>",
            "<A NAME='top'/>",
            "<a class=\"x\" name=\"top\" id=\"y\">",
        ] {
            let (rest, names) = take_anchors(html);
            assert_eq!(names, vec!["top"], "{html}");
            assert!(rest.trim().is_empty(), "{html}");
        }
    }
}
