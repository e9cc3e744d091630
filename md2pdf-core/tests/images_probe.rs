use md2pdf_core::contract::MockImageProbe;
use md2pdf_core::diagnostics::{DiagnosticKind, Diagnostics};
use md2pdf_core::images::{broken_image_marker, resolve_images, BrokenImagePolicy, ImageOptions};
use std::path::{Path, PathBuf};

fn options(policy: BrokenImagePolicy) -> ImageOptions {
    ImageOptions {
        working_dir: PathBuf::from("/work"),
        broken_images: policy,
    }
}

#[tokio::test]
async fn local_image_is_rewritten_to_an_absolute_path() {
    let mut probe = MockImageProbe::new();
    probe
        .expect_local_exists()
        .withf(|path| path.to_str() == Some("/work/docs/relative/img.png"))
        .times(1)
        .returning(|_| true);

    let mut diagnostics = Diagnostics::new();
    let out = resolve_images(
        "![alt](relative/img.png \"T\") and again ![b](./relative/img.png)",
        Path::new("docs/a.md"),
        &options(BrokenImagePolicy::Marker),
        &probe,
        &mut diagnostics,
    )
    .await;

    assert_eq!(
        out,
        "![alt](/work/docs/relative/img.png \"T\") and again ![b](/work/docs/relative/img.png)"
    );
    assert!(diagnostics.is_empty());
}

#[tokio::test]
async fn missing_local_image_becomes_a_marker() {
    let mut probe = MockImageProbe::new();
    probe.expect_local_exists().returning(|_| false);

    let mut diagnostics = Diagnostics::new();
    let out = resolve_images(
        "before ![x](missing_1.png) after",
        Path::new("a.md"),
        &options(BrokenImagePolicy::Marker),
        &probe,
        &mut diagnostics,
    )
    .await;

    assert_eq!(out, format!("before {} after", broken_image_marker("missing_1.png")));
    assert_eq!(diagnostics.count(DiagnosticKind::BrokenImage), 1);
    assert!(diagnostics.entries()[0]
        .message
        .contains("Ignoring local image not found [missing_1.png] in file [a.md]"));
}

#[tokio::test]
async fn remove_policy_leaves_a_space() {
    let mut probe = MockImageProbe::new();
    probe.expect_local_exists().returning(|_| false);

    let mut diagnostics = Diagnostics::new();
    let out = resolve_images(
        "a![x](gone.png)b",
        Path::new("a.md"),
        &options(BrokenImagePolicy::Remove),
        &probe,
        &mut diagnostics,
    )
    .await;
    assert_eq!(out, "a b");
}

#[tokio::test]
async fn remote_images_are_probed_but_not_rewritten() {
    let mut probe = MockImageProbe::new();
    probe
        .expect_remote_reachable()
        .withf(|url| url.starts_with("http://www.example.org/") || url.starts_with("https://example.org/"))
        .returning(|url| url.ends_with("ok.png"));

    let mut diagnostics = Diagnostics::new();
    let out = resolve_images(
        "![ok](www.example.org/ok.png) ![dead](https://example.org/dead.png)",
        Path::new("a.md"),
        &options(BrokenImagePolicy::Marker),
        &probe,
        &mut diagnostics,
    )
    .await;

    assert!(out.starts_with("![ok](www.example.org/ok.png) "), "{out}");
    assert!(out.ends_with(&broken_image_marker("https://example.org/dead.png")));
    assert_eq!(diagnostics.count(DiagnosticKind::BrokenImage), 1);
}

#[tokio::test]
async fn svg_is_unsupported_without_probing() {
    let mut probe = MockImageProbe::new();
    probe.expect_local_exists().never();
    probe.expect_remote_reachable().never();

    let mut diagnostics = Diagnostics::new();
    let out = resolve_images(
        "![diagram](arch.SVG) ![remote](https://x.org/a.svg?raw=true)",
        Path::new("a.md"),
        &options(BrokenImagePolicy::Remove),
        &probe,
        &mut diagnostics,
    )
    .await;

    assert_eq!(out, "   ");
    assert_eq!(diagnostics.count(DiagnosticKind::UnsupportedImage), 2);
}

#[tokio::test]
async fn images_in_code_are_ignored() {
    let probe = MockImageProbe::new();
    let mut diagnostics = Diagnostics::new();
    let md = "`![x](y.png)`\n```\n![x](y.png)\n```";
    let out = resolve_images(
        md,
        Path::new("a.md"),
        &options(BrokenImagePolicy::Marker),
        &probe,
        &mut diagnostics,
    )
    .await;
    assert_eq!(out, md);
}
