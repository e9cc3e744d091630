//! Line-level scanning shared by every stage.
//!
//! A document is read line by line with a two-state machine
//! ([`LineMode::Normal`] / [`LineMode::InCodeFence`]) toggled by fence lines.
//! Header detection, table detection and most fixups only look at lines that
//! the tracker classifies as [`LineKind::Text`].

/// Code-fence state of the scanner between two lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineMode {
    #[default]
    Normal,
    InCodeFence,
}

/// Classification of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Ordinary Markdown outside any code fence.
    Text,
    /// An opening or closing fence line.
    Fence,
    /// A line inside a fenced code block.
    Code,
}

impl LineKind {
    pub fn is_text(self) -> bool {
        self == LineKind::Text
    }
}

/// True for a line that opens or closes a fenced code block.
///
/// A line such as ```` ```inline``` text ```` is an inline code span, not a
/// fence, so a second run of three backticks disqualifies the line.
pub fn is_fence_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if !trimmed.starts_with("```") {
        return false;
    }
    let rest = trimmed.trim_start_matches('`');
    !rest.contains("```")
}

#[derive(Debug, Default)]
pub struct FenceTracker {
    mode: LineMode,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> LineMode {
        self.mode
    }

    /// Classify `line` and advance the state machine past it.
    pub fn classify(&mut self, line: &str) -> LineKind {
        if is_fence_line(line) {
            self.mode = match self.mode {
                LineMode::Normal => LineMode::InCodeFence,
                LineMode::InCodeFence => LineMode::Normal,
            };
            return LineKind::Fence;
        }
        match self.mode {
            LineMode::Normal => LineKind::Text,
            LineMode::InCodeFence => LineKind::Code,
        }
    }
}

/// Split on `\n` and classify every line. Joining the lines back with `\n`
/// restores the input exactly.
pub fn classify_lines(text: &str) -> Vec<(LineKind, &str)> {
    let mut tracker = FenceTracker::new();
    text.split('\n')
        .map(|line| (tracker.classify(line), line))
        .collect()
}

/// A run of consecutive lines that are either all prose or all fenced code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<'a> {
    Prose(&'a str),
    Code(&'a str),
}

/// Cut `text` into prose and fenced-code runs, keeping line terminators.
pub fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut tracker = FenceTracker::new();
    let mut start = 0;
    let mut offset = 0;
    let mut current_is_code: Option<bool> = None;

    for line in text.split_inclusive('\n') {
        let is_code = !tracker.classify(line.trim_end_matches('\n')).is_text();
        if current_is_code.is_some_and(|c| c != is_code) {
            blocks.push(make_block(&text[start..offset], current_is_code == Some(true)));
            start = offset;
        }
        current_is_code = Some(is_code);
        offset += line.len();
    }
    if start < text.len() {
        blocks.push(make_block(&text[start..], current_is_code == Some(true)));
    }
    blocks
}

fn make_block(text: &str, is_code: bool) -> Block<'_> {
    if is_code {
        Block::Code(text)
    } else {
        Block::Prose(text)
    }
}

/// Apply `f` to every prose run, copying fenced code through untouched.
pub fn map_prose(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    for block in split_blocks(text) {
        match block {
            Block::Prose(prose) => out.push_str(&f(prose)),
            Block::Code(code) => out.push_str(code),
        }
    }
    out
}

/// Which header syntax a line uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// `#`-prefixed header with its level.
    Atx(usize),
    /// Text line underlined by `===` (level 1) or `---` (level 2).
    Setext(usize),
}

impl HeaderKind {
    pub fn level(self) -> usize {
        match self {
            HeaderKind::Atx(level) | HeaderKind::Setext(level) => level,
        }
    }
}

/// Level of an ATX header. The `#` run must start at column 0.
pub fn atx_level(line: &str) -> Option<usize> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    match line[hashes..].chars().next() {
        None | Some(' ') | Some('\t') => Some(hashes),
        _ => None,
    }
}

/// Level of a Setext underline (`==` → 1, `--` → 2), if `line` is one.
pub fn setext_underline_level(line: &str) -> Option<usize> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let body = line.trim();
    if body.len() < 2 {
        return None;
    }
    if body.bytes().all(|b| b == b'=') {
        Some(1)
    } else if body.bytes().all(|b| b == b'-') {
        Some(2)
    } else {
        None
    }
}

/// Bullet or ordered list item (`- x`, `* x`, `+ x`, `1. x`, `1) x`).
fn is_list_item(trimmed: &str) -> bool {
    if trimmed.starts_with('-') {
        return true;
    }
    let marker_then_space = |rest: &str| rest.is_empty() || rest.starts_with([' ', '\t']);
    if let Some(rest) = trimmed.strip_prefix(['*', '+']) {
        return marker_then_space(rest);
    }
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    (1..=9).contains(&digits)
        && trimmed[digits..]
            .strip_prefix(['.', ')'])
            .is_some_and(marker_then_space)
}

/// Detect a header on `line`, looking at `next` for a Setext underline.
pub fn detect_header(line: &str, next: Option<&str>) -> Option<HeaderKind> {
    if let Some(level) = atx_level(line) {
        return Some(HeaderKind::Atx(level));
    }

    let trimmed = line.trim();
    if trimmed.is_empty()
        || is_list_item(trimmed)
        || is_fence_line(line)
        || setext_underline_level(line).is_some()
    {
        return None;
    }
    next.and_then(setext_underline_level).map(HeaderKind::Setext)
}

/// Raw header text: `#` markers and an optional closing `#` run removed.
pub fn header_text(line: &str, kind: HeaderKind) -> &str {
    match kind {
        HeaderKind::Setext(_) => line.trim(),
        HeaderKind::Atx(level) => {
            let body = line[level..].trim();
            let without_closing = body.trim_end_matches('#');
            if without_closing.is_empty() {
                ""
            } else if without_closing.ends_with(' ') || without_closing.ends_with('\t') {
                without_closing.trim_end()
            } else {
                body
            }
        }
    }
}

/// True for lines holding nothing but whitespace.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}
