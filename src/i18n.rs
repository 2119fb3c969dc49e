//! Localization messages for templates.
//!
//! Message files are `.toml` files anywhere in the source tree. The language
//! is the last dot-separated part of the file stem:
//!
//! ```text
//! i18n/active.ru.toml   → ru
//! i18n/de.toml          → de
//! ```
//!
//! ```toml
//! read_more = "Читать дальше"
//!
//! [comments]
//! other = "Комментарии"
//! one = "Комментарий"
//!
//! [nav]
//! prev = "Назад"          # looked up as "nav.prev"
//! ```
//!
//! A key whose value is a table with an `other` (or `one`) string is a single
//! message; any other table is a group whose keys are joined with `.`.

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum I18nError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("cannot tell the language of message file {0:?}")]
    NoLanguage(String),
}

/// Messages of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBundle {
    pub language: String,
    pub messages: BTreeMap<String, String>,
}

/// Parse a message file; `file_name` decides the language.
pub fn parse_bundle(file_name: &str, content: &str) -> Result<MessageBundle, I18nError> {
    let language = bundle_language(file_name)
        .ok_or_else(|| I18nError::NoLanguage(file_name.to_string()))?;
    let table: toml::Table = toml::from_str(content)?;
    let mut messages = BTreeMap::new();
    collect_messages("", &table, &mut messages);
    Ok(MessageBundle { language, messages })
}

fn bundle_language(file_name: &str) -> Option<String> {
    let name = file_name.rsplit('/').next().unwrap_or(file_name);
    let stem = name.strip_suffix(".toml")?;
    let tag = stem.rsplit('.').next()?;
    let valid = !tag.is_empty()
        && tag.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
        && tag.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    valid.then(|| tag.to_ascii_lowercase())
}

fn collect_messages(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let id = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::String(s) => {
                out.insert(id, s.clone());
            }
            toml::Value::Table(t) => {
                let plural = ["other", "one"]
                    .iter()
                    .find_map(|k| t.get(*k).and_then(|v| v.as_str()));
                match plural {
                    Some(s) => {
                        out.insert(id, s.to_string());
                    }
                    None => collect_messages(&id, t, out),
                }
            }
            _ => {}
        }
    }
}

/// All loaded messages, by language.
#[derive(Debug, Clone, Default)]
pub struct Localization {
    default_language: String,
    messages: HashMap<String, HashMap<String, String>>,
}

impl Localization {
    pub fn new(default_language: &str) -> Self {
        Self {
            default_language: default_language.to_ascii_lowercase(),
            messages: HashMap::new(),
        }
    }

    /// Add a bundle; later bundles override earlier ones key by key.
    pub fn add(&mut self, bundle: MessageBundle) {
        self.messages
            .entry(bundle.language)
            .or_default()
            .extend(bundle.messages);
    }

    pub fn message_count(&self) -> usize {
        self.messages.values().map(HashMap::len).sum()
    }

    /// Requested language, then the default language, then the key itself.
    pub fn lookup(&self, key: &str, language: &str) -> String {
        let language = language.to_ascii_lowercase();
        [language.as_str(), self.default_language.as_str()]
            .iter()
            .find_map(|lang| self.messages.get(*lang).and_then(|m| m.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
