//! Pipe tables to grid tables.
//!
//! Pipe tables let pandoc size columns however it likes, which in practice
//! squeezes long cells off the page. Grid tables carry their column widths
//! in the border lines, so every table is re-emitted as a grid table with
//! widths derived from its contents and hyphenated cells.

use std::path::Path;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::hyphenate::hyphenate_cell;
use crate::scan::classify_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Default,
    Left,
    Center,
    Right,
}

/// A pipe table with its cells already split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub alignments: Vec<Alignment>,
    pub rows: Vec<Vec<String>>,
}

/// Split a table row into trimmed cells. Outer pipes are optional and `\|`
/// stays inside its cell.
pub fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = if inner.ends_with('|') && !inner.ends_with("\\|") {
        &inner[..inner.len() - 1]
    } else {
        inner
    };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('\\');
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

fn parse_alignment(cell: &str) -> Option<Alignment> {
    let cell = cell.trim();
    let body = cell.trim_start_matches(':').trim_end_matches(':');
    if body.is_empty() || !body.bytes().all(|b| b == b'-') {
        return None;
    }
    Some(match (cell.starts_with(':'), cell.ends_with(':')) {
        (true, true) => Alignment::Center,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (false, false) => Alignment::Default,
    })
}

/// Alignments of a separator row (`|---|:--:|`), or `None` if `line` is not one.
/// A bare `---` is a rule or Setext underline, not a separator.
pub fn parse_separator(line: &str) -> Option<Vec<Alignment>> {
    if !line.contains('-') || !line.contains('|') {
        return None;
    }
    split_cells(line)
        .iter()
        .map(|cell| parse_alignment(cell))
        .collect()
}

/// Column width: the widest cell of the column plus a fifth of the widest
/// cells of all other columns, rounded up, never below 1.
pub fn column_widths(table: &Table) -> Vec<usize> {
    let columns = table.header.len();
    let mut widest = vec![0usize; columns];
    for row in std::iter::once(&table.header).chain(table.rows.iter()) {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widest[i] = widest[i].max(cell.chars().count());
        }
    }
    let total: usize = widest.iter().sum();
    widest
        .iter()
        .map(|&own| {
            let others = total - own;
            (5 * own + others).div_ceil(5).max(1)
        })
        .collect()
}

fn border(widths: &[usize], fill: char, alignments: Option<&[Alignment]>) -> String {
    let mut out = String::from("+");
    for (i, &width) in widths.iter().enumerate() {
        let alignment = alignments
            .and_then(|a| a.get(i).copied())
            .unwrap_or_default();
        let mut rule: Vec<char> = vec![fill; width];
        if width >= 3 {
            match alignment {
                Alignment::Left => rule[0] = ':',
                Alignment::Right => rule[width - 1] = ':',
                Alignment::Center => {
                    rule[0] = ':';
                    rule[width - 1] = ':';
                }
                Alignment::Default => {}
            }
        }
        out.extend(rule);
        out.push('+');
    }
    out
}

fn row_line(cells: &[String], widths: &[usize]) -> String {
    let mut out = String::from("|");
    for (cell, &width) in cells.iter().zip(widths) {
        out.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        out.extend(std::iter::repeat(' ').take(pad));
        out.push('|');
    }
    out
}

/// Render `table` as grid-table lines. Cells are expected to be hyphenated
/// already; widths are measured on what is printed.
pub fn render_grid(table: &Table) -> Vec<String> {
    let widths = column_widths(table);
    let dashes = border(&widths, '-', None);
    let mut lines = Vec::with_capacity(3 + 2 * table.rows.len());
    lines.push(dashes.clone());
    lines.push(row_line(&table.header, &widths));
    lines.push(border(&widths, '=', Some(table.alignments.as_slice())));
    for row in &table.rows {
        lines.push(row_line(row, &widths));
        lines.push(dashes.clone());
    }
    lines
}

/// Build a table from its raw lines, or `None` (with a diagnostic) when the
/// header and separator disagree on the number of columns.
fn parse_table(
    header: &str,
    alignments: Vec<Alignment>,
    body: &[&str],
    file_path: &Path,
    diagnostics: &mut Diagnostics,
) -> Option<Table> {
    let header: Vec<String> = split_cells(header).iter().map(|c| hyphenate_cell(c)).collect();
    let columns = header.len();
    if alignments.len() != columns {
        diagnostics.warn(
            DiagnosticKind::TableColumnMismatch,
            file_path,
            format!(
                "Mismatched number of columns for the header ({} <> {}) in file [{}]",
                columns,
                alignments.len(),
                file_path.display()
            ),
        );
        return None;
    }

    let mut rows = Vec::with_capacity(body.len());
    for line in body {
        let mut cells: Vec<String> = split_cells(line).iter().map(|c| hyphenate_cell(c)).collect();
        if cells.len() > columns {
            diagnostics.warn(
                DiagnosticKind::TableRowOverflow,
                file_path,
                format!(
                    "Table row has {} cells but the header has {}, extra cells dropped in file [{}]",
                    cells.len(),
                    columns,
                    file_path.display()
                ),
            );
            cells.truncate(columns);
        }
        cells.resize(columns, String::new());
        rows.push(cells);
    }
    Some(Table {
        header,
        alignments,
        rows,
    })
}

/// Replace every pipe table outside code fences with a grid table. A table
/// whose header and separator disagree is copied through verbatim.
pub fn translate_tables(markdown: &str, file_path: &Path, diagnostics: &mut Diagnostics) -> String {
    let lines = classify_lines(markdown);
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let (kind, line) = lines[i];
        let separator = lines
            .get(i + 1)
            .filter(|(k, _)| k.is_text())
            .and_then(|&(_, next)| parse_separator(next));

        match separator {
            Some(alignments) if kind.is_text() && line.contains('|') => {
                let mut end = i + 2;
                while end < lines.len() && lines[end].0.is_text() && lines[end].1.contains('|') {
                    end += 1;
                }
                let body: Vec<&str> = lines[i + 2..end].iter().map(|&(_, l)| l).collect();
                match parse_table(line, alignments, &body, file_path, diagnostics) {
                    Some(table) => out.extend(render_grid(&table)),
                    None => out.extend(lines[i..end].iter().map(|&(_, l)| l.to_string())),
                }
                i = end;
            }
            _ => {
                out.push(line.to_string());
                i += 1;
            }
        }
    }
    out.join("\n")
}
