//! Shared types passed between pipeline stages.
//!
//! A [`Document`] is built once by the parse worker that owns its source file
//! and never mutated afterwards. The coordinator collects them into a
//! [`PageSet`], which every later stage (navigation, rendering, tag counting,
//! search) only reads.

use crate::metadata::{Features, Metadata};
use serde::Serialize;

/// A picture referenced by a document.
///
/// `thumb_path` is derived from `path`, the document directory and the
/// configured thumbnail root. Local pictures always land on the same
/// thumbnail; a URL gets one copy per directory that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    /// Source location: a path relative to the source root, or a URL.
    pub path: String,
    /// Thumbnail location relative to the output root.
    pub thumb_path: String,
    pub alt: String,
    pub title: String,
    /// Declared in front matter rather than found in the body.
    pub promo: bool,
}

/// One page built from one Markdown source file.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Source path relative to the source root, `/`-separated.
    pub source: String,
    /// Output path relative to the output root (`post_ru.md` → `post_ru.html`).
    pub path: String,
    /// Language-neutral identity shared by all translations.
    pub id: String,
    /// Public URL shared by translations (`post_ru.html` → `post.html?lang=ru`).
    pub canonical: String,
    /// Lowercase language code.
    pub language: String,
    pub meta: Metadata,
    pub features: Features,
    pub images: Vec<Image>,
    /// Markdown body with the title and tag lines removed.
    pub markdown: String,
    /// Rendered HTML body.
    pub body: String,
}

/// All published documents, newest first.
pub type PageSet = Vec<Document>;
