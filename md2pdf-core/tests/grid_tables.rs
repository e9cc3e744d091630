use md2pdf_core::diagnostics::{DiagnosticKind, Diagnostics};
use md2pdf_core::hyphenate::BREAKABLE_MARKER;
use md2pdf_core::tables::translate_tables;
use std::path::Path;

fn translate(md: &str) -> (String, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let out = translate_tables(md, Path::new("t.md"), &mut diagnostics);
    (out, diagnostics)
}

#[test]
fn pipe_table_becomes_grid_table() {
    let (out, diagnostics) = translate("| a | b |\n|---|---|\n| 1 | 2 |");
    assert_eq!(
        out,
        "+--+--+\n|a |b |\n+==+==+\n|1 |2 |\n+--+--+"
    );
    assert!(diagnostics.is_empty());
}

#[test]
fn alignment_colons_move_to_the_header_rule() {
    let (out, _) = translate("Key | Val\n:-- | --:\na | bb\n");
    assert_eq!(
        out,
        "+----+----+\n|Key |Val |\n+:===+===:+\n|a   |bb  |\n+----+----+\n"
    );
}

#[test]
fn surrounding_text_is_untouched() {
    let (out, _) = translate("before\n\n| a |\n|---|\n| 1 |\n\nafter");
    assert!(out.starts_with("before\n\n+-+\n"), "{out}");
    assert!(out.ends_with("\n\nafter"), "{out}");
}

#[test]
fn long_words_are_hyphenated_and_still_fit() {
    let (out, _) = translate("| word |\n|---|\n| internationalization |");
    assert!(out.contains(BREAKABLE_MARKER));
    let lines: Vec<&str> = out.lines().collect();
    let width = lines[0].chars().count();
    assert!(lines.iter().all(|l| l.chars().count() == width), "{out}");
}

#[test]
fn mismatched_header_is_left_verbatim() {
    let md = "| a | b |\n|---|\n| 1 | 2 |";
    let (out, diagnostics) = translate(md);
    assert_eq!(out, md);
    assert_eq!(diagnostics.count(DiagnosticKind::TableColumnMismatch), 1);
    assert!(diagnostics.entries()[0]
        .message
        .contains("Mismatched number of columns for the header (2 <> 1)"));
}

#[test]
fn short_rows_are_padded_and_long_rows_truncated() {
    let (out, diagnostics) = translate("| a | b |\n|---|---|\n| 1 |\n| 1 | 2 | 3 |");
    assert_eq!(
        out,
        "+--+--+\n|a |b |\n+==+==+\n|1 |  |\n+--+--+\n|1 |2 |\n+--+--+"
    );
    assert_eq!(diagnostics.count(DiagnosticKind::TableRowOverflow), 1);
}

#[test]
fn tables_in_code_fences_are_ignored() {
    let md = "```\n| a | b |\n|---|---|\n```";
    let (out, _) = translate(md);
    assert_eq!(out, md);
}

#[test]
fn bare_urls_in_cells_are_wrapped() {
    let (out, _) = translate("| link |\n|---|\n| https://example.org |");
    assert!(out.contains("|\\url{https://example.org}"), "{out}");
}
