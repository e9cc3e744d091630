//! Small textual fixups that keep pandoc and LaTeX from misreading the input.
//!
//! Each function is a pure `&str -> String` pass. All of them except
//! [`normalize_whitespace`] and [`strip_fence_indent`] leave fenced code alone.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::anchors::LABEL_MARKER;
use crate::inline::{code_span_ranges, is_standalone_image};
use crate::scan::{atx_level, classify_lines, detect_header, is_blank, map_prose};

/// Turn exotic Unicode spaces into plain spaces, normalize line endings, blank
/// out whitespace-only lines and collapse runs of blank lines to one.
pub fn normalize_whitespace(markdown: &str) -> String {
    let text = markdown
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace(
            |c: char| matches!(c, '\u{2000}'..='\u{200a}' | '\u{202f}' | '\u{205f}' | '\u{3000}'),
            " ",
        );

    let mut out: Vec<&str> = Vec::new();
    for (kind, line) in classify_lines(&text) {
        if kind.is_text() && is_blank(line) {
            if out.last().is_some_and(|l| l.is_empty()) {
                continue;
            }
            out.push("");
        } else {
            out.push(line);
        }
    }
    out.join("\n")
}

static INDENTED_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^ {1,3}(```)").unwrap());

/// Pull fences indented by one to three spaces back to column 0.
pub fn strip_fence_indent(markdown: &str) -> String {
    INDENTED_FENCE.replace_all(markdown, "$1").into_owned()
}

static ANCHOR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<a\b[^>]*>").unwrap());
static ID_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\s+id\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).unwrap());

/// Drop `id` attributes from `<a>` tags; labels are generated from `name`.
pub fn strip_anchor_ids(markdown: &str) -> String {
    map_prose(markdown, |prose| {
        ANCHOR_TAG
            .replace_all(prose, |caps: &regex::Captures<'_>| {
                ID_ATTRIBUTE.replace_all(&caps[0], "").into_owned()
            })
            .into_owned()
    })
}

fn map_text_lines(markdown: &str, mut f: impl FnMut(&mut Vec<String>, &str, Option<&str>)) -> String {
    let lines = classify_lines(markdown);
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for (i, &(kind, line)) in lines.iter().enumerate() {
        if kind.is_text() {
            let next = lines
                .get(i + 1)
                .filter(|(k, _)| k.is_text())
                .map(|&(_, l)| l);
            f(&mut out, line, next);
        } else {
            out.push(line.to_string());
        }
    }
    out.join("\n")
}

fn ensure_blank_before(out: &mut Vec<String>) {
    if out.last().is_some_and(|l| !is_blank(l)) {
        out.push(String::new());
    }
}

/// A header right after a line ending in an HTML tag would be swallowed into
/// the HTML block; separate them.
pub fn space_html_before_header(markdown: &str) -> String {
    map_text_lines(markdown, |out, line, _| {
        if atx_level(line).is_some() && out.last().is_some_and(|l| l.trim_end().ends_with('>')) {
            out.push(String::new());
        }
        out.push(line.to_string());
    })
}

/// Give every standalone image a paragraph of its own.
pub fn space_standalone_images(markdown: &str) -> String {
    let mut after_image = false;
    map_text_lines(markdown, |out, line, _| {
        if is_standalone_image(line) {
            ensure_blank_before(out);
            out.push(line.to_string());
            after_image = true;
            return;
        }
        if after_image && !is_blank(line) {
            ensure_blank_before(out);
        }
        if !(after_image && is_blank(line) && out.last().is_some_and(|l| l.is_empty())) {
            out.push(line.to_string());
        }
        after_image = after_image && is_blank(line);
    })
}

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)https?://[^\s"']*"#).unwrap());

/// Backslash-escape `<` and `>` inside bare URLs so pandoc does not read them
/// as HTML. Code spans, fenced code and already escaped characters are left
/// alone, and a URL written as `<http://...>` ends at its closing `>`.
pub fn escape_url_specials(markdown: &str) -> String {
    map_prose(markdown, |prose| {
        let code = code_span_ranges(prose);
        let mut out = String::with_capacity(prose.len());
        let mut last = 0;
        for m in URL.find_iter(prose) {
            if code.iter().any(|r| r.contains(&m.start())) {
                continue;
            }
            let mut url = m.as_str();
            if prose[..m.start()].ends_with('<') {
                if let Some(close) = url.find('>') {
                    url = &url[..close];
                }
            }
            out.push_str(&prose[last..m.start()]);
            let mut prev = '\0';
            for c in url.chars() {
                if matches!(c, '<' | '>') && prev != '\\' {
                    out.push('\\');
                }
                out.push(c);
                prev = c;
            }
            last = m.start() + url.len();
        }
        out.push_str(&prose[last..]);
        out
    })
}

/// Append an escaped space to standalone images so LaTeX treats them as
/// inline content instead of floating figures.
pub fn prevent_image_floating(markdown: &str) -> String {
    map_text_lines(markdown, |out, line, _| {
        if is_standalone_image(line) {
            out.push(format!("{}\\ ", line.trim_end()));
        } else {
            out.push(line.to_string());
        }
    })
}

/// Make sure every header starts a new block.
pub fn blank_line_before_headers(markdown: &str) -> String {
    map_text_lines(markdown, |out, line, next| {
        if detect_header(line, next).is_some() {
            ensure_blank_before(out);
        }
        out.push(line.to_string());
    })
}

/// Two label constructs on consecutive lines make LaTeX complain about an
/// empty section; put a blank line between them.
pub fn separate_adjacent_labels(markdown: &str) -> String {
    map_text_lines(markdown, |out, line, _| {
        if line.trim_start().starts_with(LABEL_MARKER)
            && out.last().is_some_and(|l| l.contains(LABEL_MARKER))
        {
            out.push(String::new());
        }
        out.push(line.to_string());
    })
}

/// Escape characters that are special in LaTeX text mode.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latex_specials_are_escaped() {
        assert_eq!(escape_latex("50% of a_b & {c}"), "50\\% of a\\_b \\& \\{c\\}");
        assert_eq!(escape_latex("~\\"), "\\textasciitilde{}\\textbackslash{}");
    }

    #[test]
    fn whitespace_only_lines_become_empty() {
        assert_eq!(
            normalize_whitespace("a\u{2003}b\n \t \n\n\nc\r\n"),
            "a b\n\nc\n"
        );
    }

    #[test]
    fn blank_lines_inside_code_are_kept() {
        let md = "```\nx\n\n\n  \ny\n```";
        assert_eq!(normalize_whitespace(md), md);
    }

    #[test]
    fn indented_fences_move_to_column_zero() {
        assert_eq!(strip_fence_indent("  ```rust\n    ```"), "```rust\n    ```");
    }

    #[test]
    fn anchor_ids_are_stripped() {
        assert_eq!(
            strip_anchor_ids("<a name=\"x\" id=\"x\"></a> <div id=\"y\">"),
            "<a name=\"x\"></a> <div id=\"y\">"
        );
    }

    #[test]
    fn html_then_header() {
        assert_eq!(space_html_before_header("<br>\n# T"), "<br>\n\n# T");
    }

    #[test]
    fn images_get_their_own_paragraph() {
        assert_eq!(
            space_standalone_images("text\n![a](b.png)\nmore"),
            "text\n\n![a](b.png)\n\nmore"
        );
        assert_eq!(
            space_standalone_images("![a](b.png)\n\n\n\nmore"),
            "![a](b.png)\n\nmore"
        );
    }

    #[test]
    fn url_specials_are_escaped_once() {
        let once = escape_url_specials("see http://x.org/a<b>c and `http://y.org/<id>`");
        assert_eq!(once, "see http://x.org/a\\<b\\>c and `http://y.org/<id>`");
        assert_eq!(escape_url_specials(&once), once);
        assert_eq!(escape_url_specials("<http://x.org/a>"), "<http://x.org/a>");
    }

    #[test]
    fn standalone_image_gets_escaped_space() {
        assert_eq!(prevent_image_floating("![](foo.png)\n"), "![](foo.png)\\ \n");
        assert_eq!(prevent_image_floating("a ![](foo.png)"), "a ![](foo.png)");
    }

    #[test]
    fn headers_are_separated_from_paragraphs() {
        assert_eq!(blank_line_before_headers("text\n# H"), "text\n\n# H");
        assert_eq!(blank_line_before_headers("```\ntext\n# not\n```"), "```\ntext\n# not\n```");
    }

    #[test]
    fn adjacent_labels_are_separated() {
        let md = format!("{LABEL_MARKER}\\label{{a}}\n{LABEL_MARKER}\\label{{b}}");
        assert_eq!(
            separate_adjacent_labels(&md),
            format!("{LABEL_MARKER}\\label{{a}}\n\n{LABEL_MARKER}\\label{{b}}")
        );
    }
}
