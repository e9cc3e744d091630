//! Break opportunities for long words in table cells.
//!
//! Grid-table columns are narrow, and LaTeX will not break a word it cannot
//! hyphenate, so long words overflow the cell. Words are split into rough
//! syllables and a zero-width breakable marker is inserted between them.
//! Removing every [`BREAKABLE_MARKER`] from the output gives back the input.

use once_cell::sync::Lazy;
use regex::Regex;

/// Zero-width breakable space, defined in the LaTeX header.
pub const BREAKABLE_MARKER: &str = "\\BreakableChar{}";

/// Longest piece left unsplit when a syllable has no better break point.
const MAX_PIECE: usize = 4;
/// A marker is inserted once the text since the last marker is longer than this.
const MIN_RUN: usize = 3;
/// Words shorter than this are left alone.
const MIN_WORD: usize = 5;

/// Parts of a cell that must pass through untouched: code spans, links and
/// images, LaTeX commands with their arguments, HTML tags, backslash escapes.
/// Bare URLs are captured separately so they can be wrapped in `\url{}`.
static PROTECTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(`+[^`]*`+)|(!?\[[^\]]*\]\([^)]*\))|(\\[A-Za-z]+(?:\{[^}]*\})*)|(</?[A-Za-z][^>]*>)|(\\.)|(?P<url>(?:https?://|www\.)[^\s|]+)",
    )
    .unwrap()
});

fn is_vowel(c: char) -> bool {
    matches!(
        c.to_ascii_lowercase(),
        'a' | 'e' | 'i' | 'o' | 'u' | 'y'
    ) || matches!(
        c,
        'à' | 'á' | 'â' | 'ä' | 'è' | 'é' | 'ê' | 'ë' | 'ì' | 'í' | 'î' | 'ï' | 'ò' | 'ó' | 'ô'
            | 'ö' | 'ù' | 'ú' | 'û' | 'ü'
    )
}

/// Consonant pairs that are never split.
fn is_digraph(a: char, b: char) -> bool {
    matches!(
        (a.to_ascii_lowercase(), b.to_ascii_lowercase()),
        ('c', 'h') | ('s', 'h') | ('t', 'h') | ('p', 'h') | ('w', 'h') | ('c', 'k') | ('q', 'u') | ('g', 'h')
    )
}

/// Split a word into syllable-like pieces with a vowel/consonant heuristic:
/// `V|CV` and `VC|CV`.
pub fn syllables(word: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = word.char_indices().collect();
    let n = chars.len();
    if n < MIN_WORD {
        return vec![word];
    }
    let vowel = |i: usize| is_vowel(chars[i].1);

    let mut cuts = Vec::new();
    let mut b = 2;
    while b + 1 < n {
        let split = if vowel(b - 1) && !vowel(b) && vowel(b + 1) {
            true
        } else {
            b >= 2
                && vowel(b - 2)
                && !vowel(b - 1)
                && !vowel(b)
                && vowel(b + 1)
                && !is_digraph(chars[b - 1].1, chars[b].1)
        };
        if split && cuts.last().map_or(b >= 2, |&last| b - last >= 2) {
            cuts.push(b);
        }
        b += 1;
    }

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        let offset = chars[cut].0;
        pieces.push(&word[start..offset]);
        start = offset;
    }
    pieces.push(&word[start..]);
    pieces
}

/// Insert break markers into one word.
pub fn hyphenate_word(word: &str) -> String {
    let total = word.chars().count();
    if total < MIN_WORD {
        return word.to_string();
    }

    let mut out = String::with_capacity(word.len() + 32);
    let mut run = 0;
    let mut consumed = 0;
    for syllable in syllables(word) {
        let chars: Vec<char> = syllable.chars().collect();
        for piece in chars.chunks(MAX_PIECE) {
            out.extend(piece.iter());
            run += piece.len();
            consumed += piece.len();
            // never leave a single character dangling after the last break
            if run > MIN_RUN && total - consumed >= 2 {
                out.push_str(BREAKABLE_MARKER);
                run = 0;
            }
        }
    }
    out
}

/// Hyphenate every alphabetic word of plain text.
pub fn hyphenate_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        match (c.is_alphabetic(), word_start) {
            (true, None) => word_start = Some(i),
            (false, Some(start)) => {
                out.push_str(&hyphenate_word(&text[start..i]));
                out.push(c);
                word_start = None;
            }
            (false, None) => out.push(c),
            (true, Some(_)) => {}
        }
    }
    if let Some(start) = word_start {
        out.push_str(&hyphenate_word(&text[start..]));
    }
    out
}

/// Hyphenate a table cell, leaving protected constructs intact and wrapping
/// bare URLs in `\url{}`.
pub fn hyphenate_cell(cell: &str) -> String {
    let mut out = String::with_capacity(cell.len() + 16);
    let mut last = 0;
    for caps in PROTECTED.captures_iter(cell) {
        let Some(m) = caps.get(0) else { continue };
        out.push_str(&hyphenate_text(&cell[last..m.start()]));
        match caps.name("url") {
            Some(url) => {
                out.push_str("\\url{");
                out.push_str(url.as_str());
                out.push('}');
            }
            None => out.push_str(m.as_str()),
        }
        last = m.end();
    }
    out.push_str(&hyphenate_text(&cell[last..]));
    out
}
