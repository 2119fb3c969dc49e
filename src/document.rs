//! One Markdown file → one [`Document`].
//!
//! ```text
//! raw text ─ split_front_matter ─┬─ block ─ build_metadata ─┐
//!                                └─ body ── convention::infer ┴─ apply
//!                                                             │
//!        resolve_language ◄───────────────────────────────────┘
//!        normalize images (promo first)
//!        Markdown → HTML (+ typography)
//! ```
//!
//! Everything here is a pure function of the file content, its source path
//! and the injected [`SiteConfig`]; no I/O happens in this module.

use crate::config::SiteConfig;
use crate::convention::{self, ImageRef};
use crate::imaging::paths;
use crate::metadata::{self, MetadataError};
use crate::naming;
use crate::types::{Document, Image};
use crate::typography;
use pulldown_cmark::{Options, Parser, html};

/// Parse a source file. `Ok(None)` means the document is a draft and drafts
/// are not being built.
pub fn parse_document(
    source: &str,
    content: &str,
    config: &SiteConfig,
) -> Result<Option<Document>, MetadataError> {
    let (block, body) = metadata::split_front_matter(content);
    let mut meta = metadata::build_metadata(block)?;
    if meta.draft && !config.show_drafts {
        return Ok(None);
    }

    let inferred = convention::infer(body);
    convention::apply(&mut meta, &inferred);

    let (id, language) = naming::resolve_language(source, &meta.language, &config.default_language);

    let document_dir = source.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let thumb_dir = config.thumbnails.path.as_str();
    let promo = (!meta.image.trim().is_empty()).then(|| ImageRef {
        src: meta.image.trim().to_string(),
        alt: meta.title.clone(),
        title: String::new(),
    });
    let images = promo
        .iter()
        .map(|r| (r, true))
        .chain(inferred.images.iter().map(|r| (r, false)))
        .filter(|(r, _)| !r.src.is_empty() && !paths::is_inline_data(&r.src))
        .map(|(r, promo)| {
            let normalized = paths::normalize(&r.src, document_dir, thumb_dir);
            Image {
                path: normalized.path,
                thumb_path: normalized.thumb_path,
                alt: r.alt.clone(),
                title: r.title.clone(),
                promo,
            }
        })
        .collect();

    let features = meta.resolve_features(&config.features);
    let mut body_html = markdown_to_html(&inferred.body);
    if features.typography {
        body_html = typography::apply(&body_html);
    }

    let path = naming::output_path(source);
    Ok(Some(Document {
        source: source.to_string(),
        canonical: naming::canonical_path(&path),
        path,
        id,
        language,
        meta,
        features,
        images,
        markdown: inferred.body,
        body: body_html,
    }))
}

/// Render a Markdown body with the extensions blog posts commonly rely on.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;

    fn parse(source: &str, content: &str) -> Document {
        parse_document(source, content, &SiteConfig::default())
            .unwrap()
            .expect("document should be published")
    }

    #[test]
    fn scenario_front_matter_and_title() {
        let doc = parse(
            "2006/blogpost.md",
            "---\ndate: 2006-01-02\n---\n# Blogpost\nPost body",
        );
        assert_eq!(doc.meta.title, "Blogpost");
        assert_eq!(doc.meta.date, "2006-01-02");
        assert_eq!(doc.language, "en");
        assert!(doc.meta.tags.is_empty());
        assert_eq!(doc.body, "<p>Post body</p>\n");
        assert_eq!(doc.path, "2006/blogpost.html");
        assert_eq!(doc.id, "2006/blogpost.md");
        assert_eq!(doc.canonical, "2006/blogpost.html");
    }

    #[test]
    fn scenario_language_suffix() {
        let doc = parse(
            "2006/blogpost_ru.md",
            "---\ndate: 2006-01-02\n---\n# Blogpost\nPost body",
        );
        assert_eq!(doc.id, "2006/blogpost.md");
        assert_eq!(doc.language, "ru");
        assert_eq!(doc.path, "2006/blogpost_ru.html");
        assert_eq!(doc.canonical, "2006/blogpost.html?lang=ru");
    }

    #[test]
    fn no_front_matter_gives_defaults() {
        let doc = parse("note.md", "plain text only");
        let expected = Metadata::default();
        assert_eq!(doc.meta, expected);
        assert_eq!(doc.markdown, "plain text only\n");
        assert_eq!(doc.language, "en");
    }

    #[test]
    fn empty_file() {
        let doc = parse("empty.md", "");
        assert_eq!(doc.body, "");
        assert!(doc.meta.tags.is_empty());
        assert!(doc.images.is_empty());
    }

    #[test]
    fn scenario_tags() {
        let doc = parse("t.md", "...\n#tagA #tagB");
        assert_eq!(doc.meta.tags, vec!["tagA", "tagB"]);
    }

    #[test]
    fn scenario_markdown_image() {
        let doc = parse("2022/post.md", r#"![Alt](Path "Title")"#);
        assert_eq!(
            doc.images,
            vec![Image {
                path: "2022/Path".into(),
                thumb_path: "thumb/2022/Path".into(),
                alt: "Alt".into(),
                title: "Title".into(),
                promo: false,
            }]
        );
    }

    #[test]
    fn scenario_remote_image() {
        let doc = parse("2022/post.md", "![x](https://example.com/path.png)");
        assert_eq!(doc.images[0].path, "https://example.com/path.png");
        assert_eq!(
            doc.images[0].thumb_path,
            "thumb/2022/d8b3c394439d1ab84724f824fdad0c876d41395c.png"
        );
    }

    #[test]
    fn promo_image_comes_first() {
        let doc = parse(
            "2022/post.md",
            "---\nimage: Path\ntitle: T\n---\n![a](other.png)\n![b](Path)",
        );
        let paths: Vec<(&str, bool)> = doc
            .images
            .iter()
            .map(|i| (i.path.as_str(), i.promo))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("2022/Path", true),
                ("2022/other.png", false),
                ("2022/Path", false)
            ]
        );
        assert_eq!(doc.images[0].alt, "T");
    }

    #[test]
    fn data_uri_images_skipped() {
        let doc = parse("p.md", "![dot](data:image/png;base64,AAAA)");
        assert!(doc.images.is_empty());
    }

    #[test]
    fn explicit_language_keeps_suffix_in_id() {
        let doc = parse("a/post_ru.md", "---\nlanguage: DE\n---\ntext");
        assert_eq!(doc.language, "de");
        assert_eq!(doc.id, "a/post_ru.md");
    }

    #[test]
    fn draft_skipped_by_default() {
        let result =
            parse_document("d.md", "---\ndraft: true\n---\nwip", &SiteConfig::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn draft_built_when_enabled() {
        let config = SiteConfig {
            show_drafts: true,
            ..SiteConfig::default()
        };
        let result = parse_document("d.md", "---\ndraft: true\n---\nwip", &config).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn malformed_front_matter_is_error() {
        let result = parse_document("bad.md", "---\ntitle: [oops\n---\n", &SiteConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn comments_toggle_inherits_and_overrides() {
        let mut config = SiteConfig::default();
        config.features.comments_enabled = false;

        let inherited = parse_document("a.md", "text", &config).unwrap().unwrap();
        assert!(!inherited.features.comments);

        let overridden = parse_document("b.md", "---\ncomments_enabled: true\n---\ntext", &config)
            .unwrap()
            .unwrap();
        assert!(overridden.features.comments);
    }

    #[test]
    fn typography_applied_when_enabled() {
        let doc = parse("t.md", "---\ntypography_enabled: true\n---\nwait...");
        assert_eq!(doc.body, "<p>wait…</p>\n");
    }

    #[test]
    fn typography_off_by_default() {
        let doc = parse("t.md", "wait...");
        assert_eq!(doc.body, "<p>wait...</p>\n");
    }

    #[test]
    fn markdown_tables_enabled() {
        let html = markdown_to_html("| a |\n|---|\n| b |\n");
        assert!(html.contains("<table>"));
    }
}
