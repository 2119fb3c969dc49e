//! Centralized filename parsing for the `_xx` language-suffix convention.
//!
//! Translations of one logical page share a base name and differ by a
//! two-letter suffix right before the extension:
//!
//! ```text
//! 2024/lisbon.md      → id 2024/lisbon.md, language = default
//! 2024/lisbon_ru.md   → id 2024/lisbon.md, language = ru
//! index_de.html       → id index.html,     language = de
//! ```
//!
//! The same parser handles Markdown sources and hand-written templates, so
//! both group into language variants the same way. Only the file name is
//! inspected: a directory called `notes_ru/` does not make its contents
//! Russian.
//!
//! ## Public URLs
//!
//! A reverse proxy can serve `post_ru.html` under `post.html?lang=ru`.
//! [`lang_to_get_parameter`] and [`lang_get_parameter`] produce those URLs
//! for templates, and [`canonical_path`] stores the shared form on each
//! document.

/// Extensions that take part in the convention.
const LANGUAGE_EXTENSIONS: &[&str] = &["md", "html"];

/// Result of splitting a language suffix off a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSuffix {
    /// Path with the suffix removed, extension kept.
    pub id: String,
    /// The two-letter code.
    pub language: String,
}

/// Split a trailing `_xx` (two lowercase ASCII letters) off the file name.
///
/// - `"2006/blogpost_ru.md"` → id `"2006/blogpost.md"`, language `"ru"`
/// - `"index_de.html"` → id `"index.html"`, language `"de"`
/// - `"2006/blogpost.md"`, `"my_post.md"`, `"_ru.md"`, `"x_RU.md"` → `None`
pub fn parse_language_suffix(path: &str) -> Option<LanguageSuffix> {
    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    let name = &path[name_start..];
    let dot = name.rfind('.')?;
    let (stem, ext) = name.split_at(dot);
    if !LANGUAGE_EXTENSIONS.contains(&&ext[1..]) {
        return None;
    }

    // At least one byte of base name, then `_xx`.
    let bytes = stem.as_bytes();
    let n = bytes.len();
    if n < 4
        || bytes[n - 3] != b'_'
        || !bytes[n - 2].is_ascii_lowercase()
        || !bytes[n - 1].is_ascii_lowercase()
    {
        return None;
    }

    Some(LanguageSuffix {
        id: format!("{}{}{}", &path[..name_start], &stem[..n - 3], ext),
        language: stem[n - 2..].to_string(),
    })
}

/// Resolve `(id, language)` for a document.
///
/// Priority: explicit front-matter language (lowercased, id untouched) →
/// filename suffix → `default_language` with the id untouched.
pub fn resolve_language(source: &str, explicit: &str, default_language: &str) -> (String, String) {
    let explicit = explicit.trim();
    if !explicit.is_empty() {
        return (source.to_string(), explicit.to_lowercase());
    }
    match parse_language_suffix(source) {
        Some(parsed) => (parsed.id, parsed.language),
        None => (source.to_string(), default_language.to_lowercase()),
    }
}

/// Output path for a Markdown source: the extension becomes `.html`.
///
/// The language suffix is kept, so translations never collide.
pub fn output_path(source: &str) -> String {
    let name_start = source.rfind('/').map(|i| i + 1).unwrap_or(0);
    match source[name_start..].rfind('.') {
        Some(dot) => format!("{}.html", &source[..name_start + dot]),
        None => format!("{source}.html"),
    }
}

/// `?lang=xx` for a suffixed path, or `""` when unsuffixed or when the
/// suffix is the default language.
pub fn lang_get_parameter(path: &str, default_language: &str) -> String {
    match parse_language_suffix(path) {
        Some(parsed) if parsed.language != default_language => {
            format!("?lang={}", parsed.language)
        }
        _ => String::new(),
    }
}

/// Rewrite `/2021/post_ru.html` as `/2021/post.html?lang=ru`.
///
/// A suffixed `.md` path is rewritten the same way and ends in `.html`.
/// Anything else is returned unchanged.
pub fn lang_to_get_parameter(url: &str) -> String {
    match parse_language_suffix(url) {
        Some(parsed) => {
            let base = match parsed.id.rfind('.') {
                Some(dot) => &parsed.id[..dot],
                None => parsed.id.as_str(),
            };
            format!("{base}.html?lang={}", parsed.language)
        }
        None => url.to_string(),
    }
}

/// Shared public URL for a document's output path.
pub fn canonical_path(output_path: &str) -> String {
    lang_to_get_parameter(output_path)
}

/// Relative prefix from a site-relative path back to the site root.
///
/// `"a/b/c.html"` → `"../../"`, `"index.html"` → `""`.
pub fn back(path: &str) -> String {
    "../".repeat(path.matches('/').count())
}
