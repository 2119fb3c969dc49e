//! Per-language JSON search index.
//!
//! With `search.enabled`, one file per language is written under
//! `<output>/<search.directory>/`:
//!
//! ```json
//! [{"title": "Hello", "path": "2024/hello.html", "date": "2024-01-02",
//!   "tags": ["rust"], "description": "", "text": "Body without markup"}]
//! ```
//!
//! Entries follow page-set order (newest first), so the files are identical
//! across runs over the same input.

use crate::generate::strip_tags;
use crate::types::Document;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchEntry<'a> {
    pub title: String,
    pub path: &'a str,
    pub date: &'a str,
    pub tags: &'a [String],
    pub description: &'a str,
    pub text: String,
}

impl<'a> SearchEntry<'a> {
    fn from_document(doc: &'a Document) -> Self {
        Self {
            title: strip_tags(&doc.meta.title),
            path: &doc.path,
            date: &doc.meta.date,
            tags: &doc.meta.tags,
            description: &doc.meta.description,
            text: collapse_whitespace(&strip_tags(&doc.body)),
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Entries grouped by language.
pub fn build_index(pages: &[Document]) -> BTreeMap<&str, Vec<SearchEntry<'_>>> {
    let mut index: BTreeMap<&str, Vec<SearchEntry>> = BTreeMap::new();
    for doc in pages {
        index
            .entry(doc.language.as_str())
            .or_default()
            .push(SearchEntry::from_document(doc));
    }
    index
}

/// Write `<dir>/<lang>.json` for every language; returns the files written.
pub fn write_index(pages: &[Document], dir: &Path) -> Result<Vec<PathBuf>, SearchError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (language, entries) in build_index(pages) {
        let path = dir.join(format!("{language}.json"));
        std::fs::write(&path, serde_json::to_string(&entries)?)?;
        written.push(path);
    }
    Ok(written)
}
