//! Inline construct scanner for links, images and reference usages.
//!
//! Brackets are matched with a depth counter instead of a regex, so several
//! links on one line, link text spanning lines and images nested in link text
//! (`[![logo](logo.png)](https://example.org)`) are all recognised. Backslash
//! escapes and inline code spans are skipped; a blank line ends the search for
//! a closing bracket.
//!
//! The scanner never looks inside fenced code: callers feed it prose runs
//! produced by [`crate::scan::map_prose`].

use std::ops::Range;

/// Title of an inline link, as written (`raw` keeps its delimiters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Title<'a> {
    pub raw: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// `[text](destination "title")`
    Inline {
        destination: &'a str,
        title: Option<Title<'a>>,
    },
    /// `[text][id]`, `[text][]` (id is `Some("")`) or the shortcut `[text]` (id is `None`).
    Reference { id: Option<&'a str> },
}

/// A link or image found by the scanner.
#[derive(Debug, Clone, Copy)]
pub struct Construct<'a> {
    pub is_image: bool,
    /// Bracket contents exactly as written.
    pub label: &'a str,
    /// Bracket contents after nested constructs were rewritten.
    pub text: &'a str,
    pub target: Target<'a>,
    /// The whole construct exactly as written.
    pub raw: &'a str,
}

impl Construct<'_> {
    /// Id used to look this usage up among reference definitions.
    pub fn reference_id(&self) -> Option<&str> {
        match self.target {
            Target::Reference { id: Some(id) } if !id.trim().is_empty() => Some(id),
            Target::Reference { .. } => Some(self.label),
            Target::Inline { .. } => None,
        }
    }
}

/// Render `[text](destination "title")`, or the image form.
pub fn format_link(is_image: bool, text: &str, destination: &str, title_raw: Option<&str>) -> String {
    let bang = if is_image { "!" } else { "" };
    let destination = if destination.chars().any(char::is_whitespace) {
        format!("<{destination}>")
    } else {
        destination.to_string()
    };
    match title_raw {
        Some(title) => format!("{bang}[{text}]({destination} {title})"),
        None => format!("{bang}[{text}]({destination})"),
    }
}

/// Rewrite every construct in `src`, innermost first.
///
/// `f` receives each construct with its text already rewritten and returns a
/// replacement for the whole construct, or `None` to keep it (with the
/// rewritten text spliced in).
pub fn rewrite(src: &str, f: &mut dyn FnMut(&Construct<'_>) -> Option<String>) -> String {
    let bytes = src.as_bytes();
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => i = skip_code_span(bytes, i),
            b'!' | b'[' => {
                let Some(parsed) = parse_construct(src, i) else {
                    i += 1;
                    continue;
                };
                out.push_str(&src[last..i]);

                let label = &src[parsed.text.clone()];
                let text = rewrite(label, f);
                let construct = Construct {
                    is_image: parsed.is_image,
                    label,
                    text: &text,
                    target: parsed.target,
                    raw: &src[i..parsed.end],
                };
                match f(&construct) {
                    Some(replacement) => out.push_str(&replacement),
                    None => {
                        if parsed.is_image {
                            out.push('!');
                        }
                        out.push('[');
                        out.push_str(&text);
                        out.push(']');
                        out.push_str(&src[parsed.text.end + 1..parsed.end]);
                    }
                }
                last = parsed.end;
                i = parsed.end;
            }
            _ => i += 1,
        }
    }
    if last < src.len() {
        out.push_str(&src[last..]);
    }
    out
}

/// Call `f` for every construct in `src` (nested ones included) without
/// changing anything.
pub fn visit(src: &str, mut f: impl FnMut(&Construct<'_>)) {
    rewrite(src, &mut |c| {
        f(c);
        None
    });
}

/// True when the trimmed `line` is a single image, optionally wrapped in a link.
pub fn is_standalone_image(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.starts_with("![") && !trimmed.starts_with("[![") {
        return false;
    }
    let Some(parsed) = parse_construct(trimmed, 0) else {
        return false;
    };
    if parsed.end != trimmed.len() || !matches!(parsed.target, Target::Inline { .. }) {
        return false;
    }
    parsed.is_image || is_standalone_image(&trimmed[parsed.text])
}

/// Byte ranges of the closed inline code spans in `src`.
pub(crate) fn code_span_ranges(src: &str) -> Vec<Range<usize>> {
    let bytes = src.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let end = skip_code_span(bytes, i);
                let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
                if end > i + run {
                    ranges.push(i..end);
                }
                i = end;
            }
            _ => i += 1,
        }
    }
    ranges
}

struct Parsed<'a> {
    is_image: bool,
    /// Range of the bracket contents in the source.
    text: Range<usize>,
    target: Target<'a>,
    end: usize,
}

fn parse_construct(src: &str, start: usize) -> Option<Parsed<'_>> {
    let bytes = src.as_bytes();
    let is_image = bytes[start] == b'!';
    let open = if is_image { start + 1 } else { start };
    if bytes.get(open) != Some(&b'[') {
        return None;
    }
    // Footnote markers and definitions are not links.
    if !is_image && bytes.get(open + 1) == Some(&b'^') {
        return None;
    }
    let close = find_closing_bracket(bytes, open)?;
    let text = open + 1..close;

    match bytes.get(close + 1) {
        Some(b'(') => {
            let (destination, title, end) = parse_inline_target(src, close + 2)?;
            Some(Parsed {
                is_image,
                text,
                target: Target::Inline { destination, title },
                end,
            })
        }
        Some(b'[') => {
            let id_start = close + 2;
            let id_end = bytes[id_start..]
                .iter()
                .position(|&b| b == b']' || b == b'[' || b == b'\n')
                .map(|p| id_start + p)
                .filter(|&p| bytes[p] == b']');
            match id_end {
                // `[a][b](c)` is a shortcut `[a]` followed by the inline link `[b](c)`.
                Some(p) if bytes.get(p + 1) != Some(&b'(') => Some(Parsed {
                    is_image,
                    text,
                    target: Target::Reference {
                        id: Some(&src[id_start..p]),
                    },
                    end: p + 1,
                }),
                _ => Some(shortcut(is_image, text, close)),
            }
        }
        _ => Some(shortcut(is_image, text, close)),
    }
}

fn shortcut<'a>(is_image: bool, text: Range<usize>, close: usize) -> Parsed<'a> {
    Parsed {
        is_image,
        text,
        target: Target::Reference { id: None },
        end: close + 1,
    }
}

fn find_closing_bracket(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut j = open;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => {
                j += 2;
                continue;
            }
            b'`' => {
                j = skip_code_span(bytes, j);
                continue;
            }
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            b'\n' if starts_blank_line(&bytes[j + 1..]) => return None,
            _ => {}
        }
        j += 1;
    }
    None
}

fn starts_blank_line(rest: &[u8]) -> bool {
    rest.iter()
        .take_while(|&&b| b != b'\n')
        .all(|&b| b == b' ' || b == b'\t')
}

/// Index just past the inline code span starting at `i`, or past the backtick
/// run when the span is never closed.
fn skip_code_span(bytes: &[u8], i: usize) -> usize {
    let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
    let mut j = i + run;
    while j < bytes.len() {
        if bytes[j] == b'`' {
            let len = bytes[j..].iter().take_while(|&&b| b == b'`').count();
            if len == run {
                return j + len;
            }
            j += len;
        } else {
            j += 1;
        }
    }
    i + run
}

fn skip_whitespace(bytes: &[u8], mut k: usize) -> usize {
    let mut newlines = 0;
    while k < bytes.len() {
        match bytes[k] {
            b' ' | b'\t' => {}
            b'\n' if newlines == 0 => newlines += 1,
            _ => break,
        }
        k += 1;
    }
    k
}

/// Parse `destination "title")` starting right after the opening parenthesis.
fn parse_inline_target(src: &str, p: usize) -> Option<(&str, Option<Title<'_>>, usize)> {
    let bytes = src.as_bytes();
    let mut k = skip_whitespace(bytes, p);

    let destination = if bytes.get(k) == Some(&b'<') {
        let rel = bytes[k + 1..]
            .iter()
            .position(|&b| b == b'>' || b == b'<' || b == b'\n')?;
        let close = k + 1 + rel;
        if bytes[close] != b'>' {
            return None;
        }
        let dest = &src[k + 1..close];
        k = close + 1;
        dest
    } else {
        let start = k;
        let mut depth = 0usize;
        while k < bytes.len() {
            match bytes[k] {
                b'\\' => {
                    k += 2;
                    continue;
                }
                b'(' => depth += 1,
                b')' if depth == 0 => break,
                b')' => depth -= 1,
                b' ' | b'\t' | b'\n' => break,
                _ => {}
            }
            k += 1;
        }
        if k > bytes.len() {
            return None;
        }
        &src[start..k]
    };

    k = skip_whitespace(bytes, k);
    let mut title = None;
    if let Some(&delim) = bytes.get(k) {
        let closing = match delim {
            b'"' => Some(b'"'),
            b'\'' => Some(b'\''),
            b'(' => Some(b')'),
            _ => None,
        };
        if let Some(closing) = closing {
            let mut m = k + 1;
            while m < bytes.len() && bytes[m] != closing {
                if bytes[m] == b'\\' {
                    m += 1;
                }
                m += 1;
            }
            if m >= bytes.len() {
                return None;
            }
            title = Some(Title {
                raw: &src[k..=m],
                text: &src[k + 1..m],
            });
            k = skip_whitespace(bytes, m + 1);
        }
    }

    if bytes.get(k) != Some(&b')') {
        return None;
    }
    Some((destination, title, k + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destinations(src: &str) -> Vec<String> {
        let mut found = Vec::new();
        visit(src, |c| {
            if let Target::Inline { destination, .. } = c.target {
                found.push(destination.to_string());
            }
        });
        found
    }

    #[test]
    fn several_links_on_one_line() {
        assert_eq!(
            destinations("see [a](a.md) and [b](b.md#x), not (c)"),
            vec!["a.md", "b.md#x"]
        );
    }

    #[test]
    fn nested_image_is_visited_before_its_link() {
        let mut order = Vec::new();
        visit("[![logo](logo.png)](https://example.org)", |c| {
            order.push(c.is_image)
        });
        assert_eq!(order, vec![true, false]);
    }

    #[test]
    fn title_and_angle_destinations() {
        let mut seen = None;
        visit("![alt](<my image.png> \"The title\")", |c| {
            if let Target::Inline { destination, title } = c.target {
                seen = Some((destination.to_string(), title.map(|t| t.raw.to_string())));
            }
        });
        assert_eq!(
            seen,
            Some(("my image.png".to_string(), Some("\"The title\"".to_string())))
        );
    }

    #[test]
    fn code_spans_and_escapes_hide_brackets() {
        assert!(destinations("`[a](a.md)` and \\[b](b.md)").is_empty());
    }

    #[test]
    fn link_text_may_span_lines_but_not_paragraphs() {
        assert_eq!(destinations("[multi\nline](x.md)"), vec!["x.md"]);
        assert!(destinations("[broken\n\nparagraph](x.md)").is_empty());
    }

    #[test]
    fn standalone_images() {
        assert!(is_standalone_image("![foo](bar.png)"));
        assert!(is_standalone_image("  [![foo](bar.png)](https://x.org)  "));
        assert!(!is_standalone_image("![foo](bar.png) trailing text"));
        assert!(!is_standalone_image("![foo](bar.png)\\ "));
        assert!(!is_standalone_image("[link](x.md)"));
    }

    #[test]
    fn unchanged_constructs_are_copied_verbatim() {
        let src = "a [x][y] b [z] c ![i](j.png 'k') [^1]";
        assert_eq!(rewrite(src, &mut |_| None), src);
    }
}
