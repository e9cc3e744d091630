use crate::config::CoverMetadata;
use crate::fixups::escape_latex;

const COVER_TEMPLATE: &str = include_str!("../assets/cover_template.md");

/// Markdown of the cover page: the bundled template with `<title>` filled in
/// (LaTeX-escaped, it lands in a raw LaTeX block),
/// followed by one `**key**: value` line per remaining metadata entry.
pub fn cover_markdown(metadata: &CoverMetadata) -> String {
    let mut out = COVER_TEMPLATE.replace(
        "<title>",
        &escape_latex(metadata.title.as_deref().unwrap_or("")),
    );
    for (key, value) in &metadata.fields {
        // Three trailing spaces force a line break.
        out.push_str(&format!("\n**{key}**: {value}   "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetadataValue;

    #[test]
    fn title_and_fields() {
        let mut metadata = CoverMetadata {
            title: Some("User Guide".to_string()),
            ..Default::default()
        };
        metadata
            .fields
            .insert("version".to_string(), MetadataValue::Text("1.2".to_string()));
        metadata
            .fields
            .insert("author".to_string(), MetadataValue::Text("Docs".to_string()));

        let md = cover_markdown(&metadata);
        assert!(md.contains("User Guide"));
        assert!(!md.contains("<title>"));
        assert!(md.ends_with("\n**author**: Docs   \n**version**: 1.2   "));
    }

    #[test]
    fn missing_title_leaves_it_blank() {
        let md = cover_markdown(&CoverMetadata::default());
        assert!(!md.contains("<title>"));
    }
}
