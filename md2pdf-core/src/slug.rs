//! Slug generation and the per-build registry of used cross-reference ids.
//!
//! Slugs only ever contain `[a-z0-9-]`, never start or end with `-` and never
//! contain `--`, which makes [`slugify`] idempotent on its own output.
//!
//! Characters that are neither alphanumeric nor in the separator set are
//! deleted rather than replaced. In particular `.` and `#` vanish, so the slug
//! of `path#fragment` equals `slugify(path) + slugify(fragment)`: this is what
//! lets a link written as `guide.md#setup` land on the label generated for the
//! `Setup` header of `guide.md`.

use std::collections::HashMap;
use tracing::debug;

/// Characters that act as word separators in addition to whitespace, `-` and `_`.
const SEPARATORS: &[char] = &[
    '?', '<', '>', '(', ')', '"', '&', '\'', '=', '/', '\\', '|', ',', ';', '[', ']', '{', '}',
];

/// Map arbitrary text to a label-safe identifier.
///
/// ```
/// use md2pdf_core::slug::slugify;
///
/// assert_eq!(slugify("String with spaces"), "string-with-spaces");
/// assert_eq!(slugify("1?2<3>4?5(6)7&8\"9'10=11/12"), "1-2-3-4-5-6-7-8-9-10-11-12");
/// assert_eq!(slugify("docs/guide.md"), "docs-guidemd");
/// ```
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            push_ascii(&mut out, c);
        } else if c.is_whitespace() {
            push_separator(&mut out);
        } else if let Some(folded) = transliterate(c) {
            for f in folded.chars() {
                push_ascii(&mut out, f);
            }
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Slugify raw bytes, falling back to the ASCII subset when they are not UTF-8.
pub fn slugify_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => slugify(text),
        Err(e) => {
            debug!(error = %e, "Slug input is not UTF-8, keeping ASCII bytes only");
            let ascii: String = bytes
                .iter()
                .filter(|b| b.is_ascii())
                .map(|&b| b as char)
                .collect();
            slugify(&ascii)
        }
    }
}

fn push_ascii(out: &mut String, c: char) {
    if c.is_ascii_alphanumeric() {
        out.push(c.to_ascii_lowercase());
    } else if c.is_ascii_whitespace() || c == '-' || c == '_' || SEPARATORS.contains(&c) {
        push_separator(out);
    }
}

fn push_separator(out: &mut String) {
    if !out.is_empty() && !out.ends_with('-') {
        out.push('-');
    }
}

/// Best-effort ASCII folding for Latin letters carrying diacritics.
fn transliterate(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'ć' | 'č' | 'Ç' | 'Ć' | 'Č' => "c",
        'ď' | 'đ' | 'Ď' | 'Đ' | 'ð' | 'Ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "e",
        'ğ' | 'Ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' | 'İ' => "i",
        'ł' | 'ľ' | 'Ł' | 'Ľ' => "l",
        'ñ' | 'ń' | 'ň' | 'Ñ' | 'Ń' | 'Ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "o",
        'œ' | 'Œ' => "oe",
        'ř' | 'Ř' => "r",
        'ś' | 'š' | 'ş' | 'Ś' | 'Š' | 'Ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' | 'Ť' | 'Ţ' => "t",
        'þ' | 'Þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' | 'Ų' => "u",
        'ý' | 'ÿ' | 'Ý' | 'Ÿ' => "y",
        'ź' | 'ż' | 'ž' | 'Ź' | 'Ż' | 'Ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// Tracks every id handed out during one build so cross-file labels stay unique.
///
/// Owned by the pipeline for the duration of a run and passed by reference to
/// every stage that mints ids. Files must be processed in manifest order for
/// the `-N` suffixes to be reproducible.
#[derive(Debug, Default)]
pub struct IdRegistry {
    used: HashMap<String, usize>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `slug` on first use, then `slug-1`, `slug-2`, ...
    ///
    /// A suffixed candidate that was itself registered earlier (e.g. a header
    /// literally named `intro-1`) is skipped, so returned ids never repeat.
    pub fn make_unique(&mut self, slug: &str) -> String {
        let Some(&count) = self.used.get(slug) else {
            self.used.insert(slug.to_string(), 1);
            return slug.to_string();
        };

        let mut n = count;
        let mut candidate = format!("{slug}-{n}");
        while self.used.contains_key(&candidate) {
            n += 1;
            candidate = format!("{slug}-{n}");
        }
        self.used.insert(slug.to_string(), n + 1);
        self.used.insert(candidate.clone(), 1);
        candidate
    }

    pub fn contains(&self, id: &str) -> bool {
        self.used.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
