use md2pdf_core::diagnostics::{DiagnosticKind, Diagnostics};
use md2pdf_core::links::{
    extract_references, inline_references, resolve_local_link, rewrite_links,
};
use std::path::Path;

fn expand(md: &str) -> (String, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let (text, refs) = extract_references(md);
    let out = inline_references(&text, &refs, Path::new("a.md"), &mut diagnostics);
    (out, diagnostics)
}

#[test]
fn full_reference_is_inlined_with_its_title() {
    let (out, diagnostics) = expand("See [text][id].\n\n[id]: http://x.com \"t\"");
    assert_eq!(out, "See [text](http://x.com \"t\").\n");
    assert!(diagnostics.is_empty());
}

#[test]
fn collapsed_and_shortcut_references() {
    let md = "[Guide][] and [guide] and ![Logo]\n\n[GUIDE]: docs/guide.md\n[logo]: <img/logo 1.png> 'Logo'\n";
    let (out, _) = expand(md);
    assert_eq!(
        out,
        "[Guide](docs/guide.md) and [guide](docs/guide.md) and ![Logo](<img/logo 1.png> 'Logo')\n\n"
    );
}

#[test]
fn first_definition_wins_and_ids_ignore_case_and_spacing() {
    let md = "[a][Some  Id]\n\n[some id]: first.md\n[SOME ID]: second.md";
    let (out, _) = expand(md);
    assert!(out.starts_with("[a](first.md)"), "{out}");
}

#[test]
fn unresolved_full_reference_is_reported_but_shortcut_is_not() {
    let (out, diagnostics) = expand("[x][missing] and [just brackets]");
    assert_eq!(out, "[x][missing] and [just brackets]");
    assert_eq!(diagnostics.count(DiagnosticKind::UnresolvedReference), 1);
}

#[test]
fn definitions_inside_code_fences_are_kept() {
    let md = "```\n[id]: http://x.com\n```";
    let (text, refs) = extract_references(md);
    assert_eq!(text, md);
    assert!(refs.is_empty());
}

#[test]
fn footnotes_are_not_references() {
    let md = "Text[^1].\n\n[^1]: The note.";
    let (out, _) = expand(md);
    assert_eq!(out, md);
}

#[test]
fn local_links_become_internal_anchors() {
    let mut diagnostics = Diagnostics::new();
    let file = Path::new("docs/a.md");
    let out = rewrite_links(
        "[b](b.md) [sec](#Usage) [up](../README.md#top \"Top\") [ext](https://x.org/a.md) [w](www.x.org)",
        file,
        &mut diagnostics,
        &resolve_local_link,
    );
    assert_eq!(
        out,
        "[b](#docs-bmd) [sec](#docs-amdusage) [up](#readmemdtop \"Top\") [ext](https://x.org/a.md) [w](www.x.org)"
    );
    assert!(diagnostics.is_empty());
}

#[test]
fn empty_links_are_reported_and_left_alone() {
    let mut diagnostics = Diagnostics::new();
    let out = rewrite_links("[nothing]()", Path::new("a.md"), &mut diagnostics, &resolve_local_link);
    assert_eq!(out, "[nothing]()");
    assert_eq!(diagnostics.count(DiagnosticKind::EmptyLink), 1);
    assert!(diagnostics.entries()[0].message.contains("[nothing]()"));
}

#[test]
fn images_and_code_are_not_rewritten() {
    let mut diagnostics = Diagnostics::new();
    let md = "![img](pic.png) `[x](y.md)`\n```\n[x](y.md)\n```";
    let out = rewrite_links(md, Path::new("a.md"), &mut diagnostics, &resolve_local_link);
    assert_eq!(out, md);
}

#[test]
fn resolver_is_pluggable() {
    let mut diagnostics = Diagnostics::new();
    let upper = |dest: &str, _: &Path| dest.to_uppercase();
    let out = rewrite_links("[a](x.md) [b](https://y)", Path::new("a.md"), &mut diagnostics, &upper);
    assert_eq!(out, "[a](X.MD) [b](https://y)");
}

#[test]
fn linked_badge_keeps_its_external_link() {
    let mut diagnostics = Diagnostics::new();
    let md = "[![build](badge.png)](https://ci.example.org)";
    let out = rewrite_links(md, Path::new("a.md"), &mut diagnostics, &resolve_local_link);
    assert_eq!(out, md);
}
