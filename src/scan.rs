//! Source tree discovery.
//!
//! Walks the source directory in a fixed order (entries sorted by file name)
//! and classifies every file exactly once:
//!
//! ```text
//! blog/
//! ├── config.toml          → skipped (site config)
//! ├── README.md            → skipped (root only)
//! ├── .git/                → skipped (hidden)
//! ├── templates/           → skipped (loaded by the renderer)
//! ├── output/              → skipped (build output)
//! ├── i18n/ru.toml         → Bundle
//! ├── 2024/hello.md        → Markdown
//! ├── 2024/hello_ru.md     → Markdown
//! ├── 2024/cover.jpg       → Asset (allow-listed extension)
//! └── 2024/draft.psd       → ignored
//! ```
//!
//! Each yielded [`SourceFile`] carries its position in the walk. Results
//! finish in any order once fanned out to workers; the position is what
//! puts them back in a deterministic order.

use crate::config::SiteConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read source directory {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("source path {0} is not a directory")]
    NotADirectory(PathBuf),
}

/// How a discovered file is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Parsed into a document.
    Markdown,
    /// Localization messages.
    Bundle,
    /// Copied byte-for-byte.
    Asset,
}

/// A file found by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Position in walk order, starting at 0.
    pub seq: usize,
    pub path: PathBuf,
    /// Path relative to the source root, `/`-separated.
    pub relative: String,
    pub kind: FileKind,
}

/// Start walking `root`.
///
/// Fails up front if the root itself cannot be read; errors on individual
/// entries further down are logged and skipped.
pub fn discover<'a>(
    root: &'a Path,
    output_dir: &Path,
    config: &'a SiteConfig,
) -> Result<impl Iterator<Item = SourceFile> + 'a, ScanError> {
    let meta = std::fs::metadata(root).map_err(|source| ScanError::SourceUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    std::fs::read_dir(root).map_err(|source| ScanError::SourceUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let excluded_dirs: Vec<PathBuf> = [output_dir.to_path_buf(), root.join(&config.templates_dir)]
        .iter()
        .filter_map(|p| p.canonicalize().ok())
        .collect();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| keep_entry(entry, &excluded_dirs));

    let files = walker
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(move |entry| {
            let relative = relative_path(root, entry.path())?;
            match classify(&relative, config) {
                Some(kind) => Some((entry.into_path(), relative, kind)),
                None => {
                    debug!(path = %relative, "ignoring file");
                    None
                }
            }
        })
        .enumerate()
        .map(|(seq, (path, relative, kind))| SourceFile {
            seq,
            path,
            relative,
            kind,
        });

    Ok(files)
}

fn keep_entry(entry: &DirEntry, excluded_dirs: &[PathBuf]) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if entry.file_name().to_string_lossy().starts_with('.') {
        return false;
    }
    if entry.file_type().is_dir() && !excluded_dirs.is_empty() {
        if let Ok(canonical) = entry.path().canonicalize() {
            return !excluded_dirs.contains(&canonical);
        }
    }
    true
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Decide how a file is handled, by its source-relative path.
pub fn classify(relative: &str, config: &SiteConfig) -> Option<FileKind> {
    if relative == "README.md" || relative == "config.toml" {
        return None;
    }
    let name = relative.rsplit('/').next().unwrap_or(relative);
    let ext = name.rsplit_once('.').map(|(_, ext)| ext)?;
    if ext.eq_ignore_ascii_case("md") {
        Some(FileKind::Markdown)
    } else if ext.eq_ignore_ascii_case("toml") {
        Some(FileKind::Bundle)
    } else if config.is_allowed_extension(ext) {
        Some(FileKind::Asset)
    } else {
        None
    }
}
