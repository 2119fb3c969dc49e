//! Metadata inferred from the Markdown body itself.
//!
//! Authors rarely fill in front matter for short posts, so the body is scanned
//! once, line by line, for three conventions:
//!
//! ```text
//! # Lisbon, *finally*         ← title line (first `# ` line)
//! #travel #food, #portugal    ← tag line (first other `#` line)
//! ![Tram](tram.jpg "No. 28")  ← images, Markdown or <img>, any line
//! ```
//!
//! The title and tag lines are removed from the body that gets rendered.
//! Lines inside fenced code blocks are never taken as title or tag lines, so
//! a shell comment in a code sample stays where it is. The fence rule is
//! applied to the title on purpose, not only to tags: a `# ` line inside a
//! fence is code, and the title comes from the first `# ` line after it.
//!
//! Only the first tag line counts. Any later `#` line, including a second
//! `# ` heading or a `## ` subheading, stays in the body. If such a heading
//! comes before the intended tag line, it is the one taken as tags.

use crate::metadata::Metadata;
use pulldown_cmark::{Parser, html};
use regex::Regex;
use std::sync::LazyLock;

static MARKDOWN_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[(.*?)\]\(([^\s)]*)\s*"?([^"]*?)?"?\)"#).expect("valid image regex")
});
static HTML_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<img(.*?)>").expect("valid img tag regex"));
static HTML_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\S+)\s*=\s*"?(.*?)""#).expect("valid attribute regex"));

const FENCE: &str = "```";

/// An image reference as written in the body, before path normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
    pub title: String,
}

/// Everything the body scan found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inferred {
    /// Title line rendered to inline HTML.
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub images: Vec<ImageRef>,
    /// Trimmed body without the title and tag lines, one `\n` per line.
    pub body: String,
}

/// Scan a Markdown body once.
pub fn infer(body: &str) -> Inferred {
    let mut out = Inferred::default();
    let mut in_fence = false;

    for line in body.trim().lines() {
        if line.trim_start().starts_with(FENCE) {
            in_fence = !in_fence;
        } else if !in_fence {
            if out.title.is_none() && line.starts_with("# ") {
                out.title = Some(inline_html(&line[2..]));
                continue;
            }
            if out.tags.is_none() && line.starts_with('#') {
                out.tags = Some(parse_tag_line(line));
                continue;
            }
        }

        out.images.extend(markdown_images(line));
        out.images.extend(html_images(line));

        out.body.push_str(line);
        out.body.push('\n');
    }

    out
}

/// Fold inferred values into decoded front matter.
///
/// The title fills the gap only when front matter set none. A tag line
/// replaces front-matter tags.
pub fn apply(meta: &mut Metadata, inferred: &Inferred) {
    if meta.title.is_empty() {
        if let Some(title) = &inferred.title {
            meta.title = title.clone();
        }
    }
    if let Some(tags) = &inferred.tags {
        meta.tags = tags.clone();
    }
}

/// Render one line of Markdown as inline HTML (no wrapping `<p>`).
fn inline_html(text: &str) -> String {
    let mut rendered = String::new();
    html::push_html(&mut rendered, Parser::new(text.trim()));
    let rendered = rendered.trim();
    rendered
        .strip_prefix("<p>")
        .and_then(|s| s.strip_suffix("</p>"))
        .unwrap_or(rendered)
        .to_string()
}

fn parse_tag_line(line: &str) -> Vec<String> {
    line.split_whitespace()
        .map(|token| token.trim_matches(|c| c == '#' || c == ','))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn markdown_images(line: &str) -> impl Iterator<Item = ImageRef> + '_ {
    MARKDOWN_IMAGE.captures_iter(line).map(|caps| ImageRef {
        alt: caps[1].to_string(),
        src: caps[2].to_string(),
        title: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
    })
}

fn html_images(line: &str) -> impl Iterator<Item = ImageRef> + '_ {
    HTML_IMAGE.captures_iter(line).map(|caps| {
        let mut image = ImageRef::default();
        for attr in HTML_ATTRIBUTE.captures_iter(&caps[1]) {
            let value = attr[2].to_string();
            match &attr[1] {
                "src" => image.src = value,
                "alt" => image.alt = value,
                "title" => image.title = value,
                _ => {}
            }
        }
        image
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Title
    // =========================================================================

    #[test]
    fn title_from_first_heading() {
        let inferred = infer("# Blogpost\nPost body");
        assert_eq!(inferred.title.as_deref(), Some("Blogpost"));
        assert_eq!(inferred.body, "Post body\n");
    }

    #[test]
    fn title_inline_markdown_becomes_html() {
        let inferred = infer("# Hello *world*");
        assert_eq!(inferred.title.as_deref(), Some("Hello <em>world</em>"));
    }

    #[test]
    fn no_heading_no_title() {
        let inferred = infer("just text\nmore text");
        assert_eq!(inferred.title, None);
        assert_eq!(inferred.body, "just text\nmore text\n");
    }

    #[test]
    fn second_level_heading_is_not_title() {
        let inferred = infer("## Section\ntext");
        assert_eq!(inferred.title, None);
    }

    #[test]
    fn front_matter_title_wins() {
        let mut meta = Metadata {
            title: "From YAML".into(),
            ..Metadata::default()
        };
        let inferred = infer("# From body\ntext");
        apply(&mut meta, &inferred);
        assert_eq!(meta.title, "From YAML");
        // The heading line is still consumed, not mistaken for tags.
        assert_eq!(inferred.tags, None);
        assert_eq!(inferred.body, "text\n");
    }

    #[test]
    fn heading_in_fence_is_not_title() {
        let inferred = infer("```\n# not a title\n```\n# Real");
        assert_eq!(inferred.title.as_deref(), Some("Real"));
        assert_eq!(inferred.body, "```\n# not a title\n```\n");
    }

    // =========================================================================
    // Tags
    // =========================================================================

    #[test]
    fn tags_from_trailing_line() {
        let inferred = infer("Text\n#tagA #tagB");
        assert_eq!(
            inferred.tags,
            Some(vec!["tagA".to_string(), "tagB".to_string()])
        );
        assert_eq!(inferred.body, "Text\n");
    }

    #[test]
    fn tags_after_header() {
        let inferred = infer("# Header\n#tvshow");
        assert_eq!(inferred.title.as_deref(), Some("Header"));
        assert_eq!(inferred.tags, Some(vec!["tvshow".to_string()]));
        assert_eq!(inferred.body, "");
    }

    #[test]
    fn tags_trim_commas_and_hashes() {
        let inferred = infer("#one, #two,, ##three");
        assert_eq!(
            inferred.tags,
            Some(vec!["one".to_string(), "two".to_string(), "three".to_string()])
        );
    }

    #[test]
    fn tag_line_in_fence_ignored() {
        let inferred = infer("Some text\n```\n# comment\n```\n---\n\n#cli\n\n");
        assert_eq!(inferred.tags, Some(vec!["cli".to_string()]));
        assert_eq!(inferred.title, None);
        assert!(inferred.body.contains("# comment\n"));
        assert!(!inferred.body.contains("#cli"));
    }

    #[test]
    fn only_first_tag_line_counts() {
        let inferred = infer("#first\ntext\n#second");
        assert_eq!(inferred.tags, Some(vec!["first".to_string()]));
        assert_eq!(inferred.body, "text\n#second\n");
    }

    #[test]
    fn subheading_before_tag_line_is_taken_as_tags() {
        let inferred = infer("# Title\n## Part one\ntext\n#real");
        assert_eq!(
            inferred.tags,
            Some(vec!["Part".to_string(), "one".to_string()])
        );
        assert!(inferred.body.contains("#real"));
    }

    #[test]
    fn tag_line_overrides_front_matter_tags() {
        let mut meta = Metadata {
            tags: vec!["yaml".into()],
            ..Metadata::default()
        };
        apply(&mut meta, &infer("text\n#body"));
        assert_eq!(meta.tags, vec!["body"]);
    }

    #[test]
    fn no_tag_line_keeps_front_matter_tags() {
        let mut meta = Metadata {
            tags: vec!["yaml".into()],
            ..Metadata::default()
        };
        apply(&mut meta, &infer("text only"));
        assert_eq!(meta.tags, vec!["yaml"]);
    }

    #[test]
    fn empty_body() {
        let inferred = infer("");
        assert_eq!(inferred, Inferred::default());
    }

    // =========================================================================
    // Images
    // =========================================================================

    #[test]
    fn markdown_image_with_title() {
        let inferred = infer(r#"![Alt](Path "Title")"#);
        assert_eq!(
            inferred.images,
            vec![ImageRef {
                src: "Path".into(),
                alt: "Alt".into(),
                title: "Title".into(),
            }]
        );
    }

    #[test]
    fn markdown_image_without_title() {
        let inferred = infer("see ![](pic.png) here");
        assert_eq!(inferred.images.len(), 1);
        assert_eq!(inferred.images[0].src, "pic.png");
        assert_eq!(inferred.images[0].alt, "");
        assert_eq!(inferred.images[0].title, "");
    }

    #[test]
    fn several_images_on_one_line_in_order() {
        let inferred = infer("![a](1.png) ![b](2.png)");
        let srcs: Vec<&str> = inferred.images.iter().map(|i| i.src.as_str()).collect();
        assert_eq!(srcs, vec!["1.png", "2.png"]);
    }

    #[test]
    fn html_image_attributes() {
        let inferred = infer(r#"<img src="a/b.jpg" alt="Alt text" title="T">"#);
        assert_eq!(
            inferred.images,
            vec![ImageRef {
                src: "a/b.jpg".into(),
                alt: "Alt text".into(),
                title: "T".into(),
            }]
        );
    }

    #[test]
    fn images_across_lines_in_document_order() {
        let inferred = infer("![one](1.png)\ntext\n<img src=\"2.png\">\n![three](3.png)");
        let srcs: Vec<&str> = inferred.images.iter().map(|i| i.src.as_str()).collect();
        assert_eq!(srcs, vec!["1.png", "2.png", "3.png"]);
    }

    #[test]
    fn image_lines_stay_in_body() {
        let inferred = infer("![a](1.png)");
        assert_eq!(inferred.body, "![a](1.png)\n");
    }
}
