//! Front matter: splitting it off the body and decoding it.
//!
//! A source file may start with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! date: 2024-03-01
//! tags: travel, food
//! comments_enabled: false
//! ---
//! # Lisbon
//! Body text.
//! ```
//!
//! Missing front matter is the common case, not an error: every field has a
//! default and the [convention inferencer](crate::convention) fills in the
//! title and tags from the body afterwards.
//!
//! ## Inheritable toggles
//!
//! `typography_enabled`, `comments_enabled` and `show_social_sharing_buttons`
//! are `Option<bool>`. `None` means the key was absent and the site-wide value
//! from [`FeaturesConfig`] applies. [`Metadata::resolve_features`] is the one
//! place that inheritance happens.

use crate::config::FeaturesConfig;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("invalid front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter must be a mapping, got {0}")]
    NotAMapping(&'static str),
}

const DELIMITER: &str = "---";

/// Split raw file content into `(front_matter, body)`.
///
/// Front matter is recognised only when the content starts with `---` and at
/// least one more `---` follows. The body is everything after that second
/// delimiter, untouched, so later `---` lines (horizontal rules) survive.
/// Anything else yields an empty block and the whole content as body.
pub fn split_front_matter(content: &str) -> (&str, &str) {
    if content.starts_with(DELIMITER) {
        let mut parts = content.splitn(3, DELIMITER);
        let _leading = parts.next();
        if let (Some(block), Some(body)) = (parts.next(), parts.next()) {
            return (block, body);
        }
    }
    ("", content)
}

/// Decoded front matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Free-form document kind; templates branch on it.
    #[serde(rename = "type", deserialize_with = "scalar_string")]
    pub kind: String,
    #[serde(deserialize_with = "scalar_string")]
    pub title: String,
    /// Kept as written; `YYYY-MM-DD` sorts correctly as text.
    #[serde(deserialize_with = "scalar_string")]
    pub date: String,
    #[serde(deserialize_with = "tag_list")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub language: String,
    #[serde(deserialize_with = "scalar_string")]
    pub slug: String,
    #[serde(deserialize_with = "scalar_string")]
    pub description: String,
    #[serde(deserialize_with = "scalar_string")]
    pub author: String,
    #[serde(deserialize_with = "scalar_string")]
    pub keywords: String,
    pub draft: bool,
    /// Template name overriding the post template.
    #[serde(deserialize_with = "scalar_string")]
    pub template: String,
    pub typography_enabled: Option<bool>,
    pub comments_enabled: Option<bool>,
    pub show_social_sharing_buttons: Option<bool>,
    /// Promo image reference.
    #[serde(deserialize_with = "scalar_string")]
    pub image: String,
    /// Keys this struct does not know, passed through to templates.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            kind: "post".to_string(),
            title: String::new(),
            date: String::new(),
            tags: Vec::new(),
            language: String::new(),
            slug: String::new(),
            description: String::new(),
            author: String::new(),
            keywords: String::new(),
            draft: false,
            template: String::new(),
            typography_enabled: None,
            comments_enabled: None,
            show_social_sharing_buttons: None,
            image: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// Per-document toggles after inheritance from the site defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Features {
    pub typography: bool,
    pub comments: bool,
    pub social_sharing: bool,
}

impl Metadata {
    pub fn resolve_features(&self, defaults: &FeaturesConfig) -> Features {
        Features {
            typography: self
                .typography_enabled
                .unwrap_or(defaults.typography_enabled),
            comments: self.comments_enabled.unwrap_or(defaults.comments_enabled),
            social_sharing: self
                .show_social_sharing_buttons
                .unwrap_or(defaults.show_social_sharing_buttons),
        }
    }
}

/// Decode a front-matter block.
///
/// An empty (or whitespace/comment-only) block yields [`Metadata::default`].
pub fn build_metadata(block: &str) -> Result<Metadata, MetadataError> {
    if block.trim().is_empty() {
        return Ok(Metadata::default());
    }
    let value: serde_yaml::Value = serde_yaml::from_str(block)?;
    match value {
        serde_yaml::Value::Null => Ok(Metadata::default()),
        serde_yaml::Value::Mapping(_) => Ok(serde_yaml::from_value(value)?),
        other => Err(MetadataError::NotAMapping(yaml_kind(&other))),
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

// ============================================================================
// Lenient field decoders
// ============================================================================

/// Accept any scalar as text: `date: 2024` and `title: 1984` are common.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Sequence(items) => items
            .into_iter()
            .filter_map(|v| match v {
                serde_yaml::Value::String(s) => Some(s),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a scalar, got {}",
                yaml_kind(&other)
            )));
        }
    })
}

/// Tags as a YAML sequence or a comma-separated string (`tags: a, b`).
fn tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    let raw: Vec<String> = match value {
        serde_yaml::Value::Null => Vec::new(),
        serde_yaml::Value::String(s) => s.split(',').map(str::to_string).collect(),
        serde_yaml::Value::Sequence(items) => items
            .into_iter()
            .filter_map(|v| match v {
                serde_yaml::Value::String(s) => Some(s),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                serde_yaml::Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "tags must be a list or a comma-separated string, got {}",
                yaml_kind(&other)
            )));
        }
    };
    Ok(raw
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}
