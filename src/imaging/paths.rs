//! Image reference → (source path, thumbnail path).
//!
//! ```text
//! doc 2022/post.md, thumb root "thumb"
//!
//! Path                          → 2022/Path          thumb/2022/Path
//! ../2022/image.png             → 2022/image.png     thumb/2022/image.png
//! /static/logo.png              → static/logo.png    thumb/static/logo.png
//! https://example.com/path.png  → (unchanged)        thumb/2022/<sha1 of url>.png
//! ```
//!
//! The thumbnail path is a pure function of the reference, the document
//! directory and the thumbnail root. Equal inputs give equal outputs, which is
//! what lets the thumbnail stage de-duplicate by thumbnail path. A URL keeps
//! the document directory in its thumbnail path, so the same URL used from
//! two directories yields two thumbnails.

use sha1::{Digest, Sha1};

/// A reference after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    pub path: String,
    pub thumb_path: String,
}

/// `scheme://host...` with an alphabetic-first scheme and a non-empty host.
pub fn is_remote(reference: &str) -> bool {
    let Some((scheme, rest)) = reference.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    let scheme_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    scheme_ok && !host.is_empty()
}

/// Inline `data:` URIs have nothing to fetch or thumbnail.
pub fn is_inline_data(reference: &str) -> bool {
    reference
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("data:"))
}

/// Normalize one image reference found in a document living in `document_dir`.
pub fn normalize(reference: &str, document_dir: &str, thumb_dir: &str) -> NormalizedPath {
    if is_remote(reference) {
        let digest = Sha1::digest(reference.as_bytes());
        let file_name = match url_extension(reference) {
            Some(ext) => format!("{digest:x}.{ext}"),
            None => format!("{digest:x}"),
        };
        return NormalizedPath {
            path: reference.to_string(),
            thumb_path: join_segments(&[thumb_dir, document_dir, &file_name]),
        };
    }

    let path = match reference.strip_prefix('/') {
        Some(rooted) => clean_path(rooted),
        None => clean_path(&join_segments(&[document_dir, reference])),
    };
    let contained = path
        .split('/')
        .skip_while(|seg| *seg == "..")
        .collect::<Vec<_>>()
        .join("/");
    NormalizedPath {
        thumb_path: join_segments(&[thumb_dir, &contained]),
        path,
    }
}

/// Lexically collapse `.` and `..` segments and duplicate slashes.
///
/// `..` that would climb above the start is kept, so the result can still
/// point outside the tree; callers decide what that means.
pub fn clean_path(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match out.last() {
                Some(&last) if last != ".." => {
                    out.pop();
                }
                _ => out.push(".."),
            },
            s => out.push(s),
        }
    }
    out.join("/")
}

/// Extension of the last URL path segment, ignoring query and fragment.
///
/// `https://path.com` has no path, so the host's last label counts: `com`.
fn url_extension(url: &str) -> Option<&str> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = without_query.rsplit('/').next().unwrap_or("");
    let (_, ext) = last_segment.rsplit_once('.')?;
    (!ext.is_empty()).then_some(ext)
}

fn join_segments(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
