use md2pdf_core::slug::{slugify, slugify_bytes, IdRegistry};

const SAMPLES: &[&str] = &[
    "String with spaces",
    "1?2<3>4?5(6)7&8\"9'10=11/12",
    "  Leading and trailing  ",
    "docs/guide/setup.md#Install Steps",
    "Crème brûlée & café",
    "snake_case--and---dashes",
    "C# (language)",
    "日本語 title",
    "",
    "---",
];

#[test]
fn known_slugs() {
    assert_eq!(slugify("String with spaces"), "string-with-spaces");
    assert_eq!(
        slugify("1?2<3>4?5(6)7&8\"9'10=11/12"),
        "1-2-3-4-5-6-7-8-9-10-11-12"
    );
    assert_eq!(slugify("Crème brûlée & café"), "creme-brulee-cafe");
    assert_eq!(slugify("C# (language)"), "c-language");
    assert_eq!(slugify("---"), "");
}

#[test]
fn slugs_are_idempotent_and_label_safe() {
    for sample in SAMPLES {
        let once = slugify(sample);
        assert_eq!(slugify(&once), once, "not idempotent for {sample:?}");
        assert!(
            once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
            "unsafe character in {once:?}"
        );
        assert!(!once.starts_with('-') && !once.ends_with('-'), "{once:?}");
        assert!(!once.contains("--"), "{once:?}");
    }
}

#[test]
fn path_and_fragment_slugs_concatenate() {
    // a link to `b.md#setup` must land on the label of header "Setup" in b.md
    assert_eq!(
        slugify("docs/b.md#setup"),
        format!("{}{}", slugify("docs/b.md"), slugify("Setup"))
    );
}

#[test]
fn non_utf8_bytes_keep_the_ascii_part() {
    assert_eq!(slugify_bytes(b"Intro \xff\xfe Part"), "intro-part");
}

#[test]
fn registry_suffixes_in_order() {
    let mut registry = IdRegistry::new();
    assert_eq!(registry.make_unique("intro"), "intro");
    assert_eq!(registry.make_unique("intro"), "intro-1");
    assert_eq!(registry.make_unique("intro"), "intro-2");
    assert_eq!(registry.make_unique("other"), "other");
    assert!(registry.contains("intro-1"));
}

#[test]
fn registry_skips_ids_taken_by_real_headers() {
    let mut registry = IdRegistry::new();
    assert_eq!(registry.make_unique("intro-1"), "intro-1");
    assert_eq!(registry.make_unique("intro"), "intro");
    assert_eq!(registry.make_unique("intro"), "intro-2");
}

#[test]
fn registry_never_returns_the_same_id_twice() {
    let mut registry = IdRegistry::new();
    let mut seen = std::collections::HashSet::new();
    for slug in ["a", "a-1", "a", "a", "a-2", "a-1", "b", "a"] {
        let id = registry.make_unique(slug);
        assert!(seen.insert(id.clone()), "{id} returned twice");
    }
    assert_eq!(registry.len(), seen.len());
}
