//! Site configuration module.
//!
//! Handles loading, validating, and merging the `config.toml` that sits in the
//! source root. Stock defaults are the base layer; the user file overrides
//! only the keys it names. Command-line flags (and their `INPUT_*`
//! environment variables) are applied on top by the binary.
//!
//! ## Config File Location
//!
//! ```text
//! blog/
//! ├── config.toml              # Site config (never copied or rendered)
//! ├── templates/
//! │   ├── post.html
//! │   └── index.html
//! └── 2024/
//!     ├── hello.md
//!     └── hello_ru.md
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! templates_dir = "templates"
//! template_post = "post.html"
//! default_language = "en"
//! show_drafts = false
//! allowed_extensions = [".jpeg", ".jpg", ".png", ".mp4", ".pdf"]
//! comments_site_id = ""
//!
//! [site]
//! title = ""
//! short_description = ""
//! author = ""
//!
//! [features]
//! typography_enabled = false
//! comments_enabled = true
//! show_social_sharing_buttons = false
//!
//! [thumbnails]
//! path = "thumb"
//! max_width = 140
//! max_height = 140
//! quality = 85
//! fetch_timeout_secs = 30
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [search]
//! enabled = false
//! directory = "search"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Template directory, relative to the source root.
    pub templates_dir: String,
    /// Template used for every document without a `template` override.
    pub template_post: String,
    /// Language of documents that declare none and carry no `_xx` suffix.
    pub default_language: String,
    /// Render documents marked `draft: true`.
    pub show_drafts: bool,
    /// Extensions (with leading dot) of files copied verbatim to the output.
    pub allowed_extensions: Vec<String>,
    /// Identifier handed to the comments widget in templates.
    pub comments_site_id: String,
    /// Site identity exposed to templates.
    pub site: SiteInfo,
    /// Global defaults for the per-document toggles.
    pub features: FeaturesConfig,
    /// Thumbnail generation settings.
    pub thumbnails: ThumbnailsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Per-language JSON search index.
    pub search: SearchConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            templates_dir: "templates".to_string(),
            template_post: "post.html".to_string(),
            default_language: "en".to_string(),
            show_drafts: false,
            allowed_extensions: [".jpeg", ".jpg", ".png", ".mp4", ".pdf"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            comments_site_id: String::new(),
            site: SiteInfo::default(),
            features: FeaturesConfig::default(),
            thumbnails: ThumbnailsConfig::default(),
            processing: ProcessingConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_language.is_empty() {
            return Err(ConfigError::Validation(
                "default_language must not be empty".into(),
            ));
        }
        if self.template_post.trim().is_empty() {
            return Err(ConfigError::Validation(
                "template_post must not be empty".into(),
            ));
        }
        if self.thumbnails.max_width == 0 || self.thumbnails.max_height == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.max_width and thumbnails.max_height must be non-zero".into(),
            ));
        }
        if self.thumbnails.path.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation(
                "thumbnails.path must not be empty".into(),
            ));
        }
        if self.thumbnails.fetch_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.fetch_timeout_secs must be non-zero".into(),
            ));
        }
        if let Some(ext) = self
            .allowed_extensions
            .iter()
            .find(|e| !e.starts_with('.'))
        {
            return Err(ConfigError::Validation(format!(
                "allowed_extensions entries must start with '.', got {ext:?}"
            )));
        }
        Ok(())
    }

    /// Check the site identity a full build needs.
    ///
    /// Kept apart from [`validate`](Self::validate) so `check` and library
    /// callers can run against a bare source tree.
    pub fn require_site_info(&self) -> Result<(), ConfigError> {
        let missing: Vec<&str> = [
            ("site.title", &self.site.title),
            ("site.short_description", &self.site.short_description),
            ("site.author", &self.site.author),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(format!(
                "missing required keys: {}",
                missing.join(", ")
            )))
        }
    }

    /// Whether `ext` (with or without the leading dot) is copied verbatim.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.allowed_extensions
            .iter()
            .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Site identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    pub title: String,
    pub short_description: String,
    pub author: String,
}

/// Global defaults for the per-document toggles.
///
/// A document inherits these unless its front matter sets the same key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeaturesConfig {
    pub typography_enabled: bool,
    pub comments_enabled: bool,
    pub show_social_sharing_buttons: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            typography_enabled: false,
            comments_enabled: true,
            show_social_sharing_buttons: false,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parse workers and thumbnail threads.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Thumbnail root, relative to the output directory.
    pub path: String,
    /// Bounding box; images are fitted inside it and never upscaled.
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG/WebP encoding quality (1-100).
    pub quality: u32,
    /// Upper bound on a single remote image download.
    pub fetch_timeout_secs: u64,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            path: "thumb".to_string(),
            max_width: 140,
            max_height: 140,
            quality: 85,
            fetch_timeout_secs: 30,
        }
    }
}

/// Search index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub enabled: bool,
    /// Output subdirectory holding one `<lang>.json` per language.
    pub directory: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: "search".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Inkwell Configuration
# =====================
# Place this file in the root of your source directory. It is never copied
# to the output. Values shown below are the defaults, except for the [site]
# section, which `inkwell build` requires you to fill in.
# Unknown keys will cause an error.

# Template directory, relative to the source root.
templates_dir = "templates"

# Template for every post without a `template:` front matter override.
template_post = "post.html"

# Language of posts with no `language:` key and no `_xx` filename suffix.
default_language = "en"

# Render posts marked `draft: true`.
show_drafts = false

# Files with these extensions are copied verbatim to the output.
allowed_extensions = [".jpeg", ".jpg", ".png", ".mp4", ".pdf"]

# Identifier passed to the comments widget in templates.
comments_site_id = ""

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
title = ""
short_description = ""
author = ""

# ---------------------------------------------------------------------------
# Per-post toggles (front matter keys of the same name override these)
# ---------------------------------------------------------------------------
[features]
typography_enabled = false
comments_enabled = true
show_social_sharing_buttons = false

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Thumbnail root inside the output directory.
path = "thumb"

# Images are fitted inside this box and never upscaled.
max_width = 140
max_height = 140

# JPEG/WebP encoding quality (1 = worst, 100 = best).
quality = 85

# Give up on a remote image after this many seconds.
fetch_timeout_secs = 30

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Search index
# ---------------------------------------------------------------------------
[search]
# Write <directory>/<lang>.json for client-side search.
enabled = false
directory = "search"
"##
}
