//! HTML rendering with minijinja templates.
//!
//! Templates live in `templates_dir` under the source root and are loaded
//! once, by their `/`-separated path relative to that directory. Files
//! ending in `.html` are auto-escaped, so templates print the rendered body
//! with `{{ current.body|safe }}`.
//!
//! ## What gets rendered
//!
//! ```text
//! templates/
//! ├── post.html          → every document without a `template` override
//! ├── page.html          → documents with `template: page.html`
//! ├── index.html         → output/index.html
//! ├── index_ru.html      → output/index_ru.html   (same group as index.html)
//! ├── feed.xml           → output/feed.xml
//! ├── _base.html         → never rendered directly (leading `_`)
//! └── partials/nav.html  → never rendered directly (not top-level)
//! ```
//!
//! ## Context
//!
//! | Variable | Content |
//! |---|---|
//! | `current` | The document (or, for standalone templates, `{id, path, language}`) |
//! | `all` | Every published document, newest first |
//! | `prev`, `next` | Chronological neighbours in the same language, or none |
//! | `language_variations` | Everything sharing `current.id`, language descending |
//! | `default_language`, `comments_site_id` | From the config |
//! | `site` | `{title, short_description, author}` |
//! | `tags` | `[{tag, count}]`, most used first |
//!
//! ## Helpers
//!
//! | Name | Kind | Example |
//! |---|---|---|
//! | `back(path)` | function | `back("2024/post.html")` → `../` |
//! | `year(date)` | function | `year("2006-01-02")` → `2006` |
//! | `join(list, sep)` | function | `join(current.meta.tags, ", ")` |
//! | `strip_tags(html)` | function, filter | `<p>a</p>` → `a` |
//! | `lang_get_parameter(path)` | function | `post_ru.html` → `?lang=ru` |
//! | `lang_to_get_parameter(url)` | function | `post_ru.html` → `post.html?lang=ru` |
//! | `i18n(key, lang)` | function | message lookup with fallback |
//! | `debug_json` | filter | pretty JSON of any value |
//!
//! Documents and standalone templates render in parallel on the rayon pool.
//! A page that fails to render is logged and skipped; a missing post
//! template stops the build before anything is written.

use crate::config::SiteConfig;
use crate::i18n::Localization;
use crate::naming;
use crate::navigation::{self, Localized, PageLinks};
use crate::tags::TagCount;
use crate::types::Document;
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, ErrorKind, context};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, OnceLock};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("templates directory {0} not found")]
    TemplatesDirMissing(PathBuf),
    #[error("post template {0:?} not found")]
    MissingPostTemplate(String),
}

/// A standalone template as seen by itself through `current`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplatePage {
    pub id: String,
    pub path: String,
    pub language: String,
}

impl Localized for TemplatePage {
    fn language(&self) -> &str {
        &self.language
    }
}

/// Outcome of one rendering pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Output paths written, in page-set order.
    pub rendered: Vec<String>,
    pub failed: usize,
}

impl RenderReport {
    fn collect(results: Vec<Option<String>>) -> Self {
        let failed = results.iter().filter(|r| r.is_none()).count();
        Self {
            rendered: results.into_iter().flatten().collect(),
            failed,
        }
    }
}

/// Loaded templates plus the helpers they call.
pub struct Renderer {
    env: Environment<'static>,
    l10n: Arc<OnceLock<Localization>>,
    names: Vec<String>,
    post_template: String,
    default_language: String,
    comments_site_id: String,
    site: Value,
}

impl Renderer {
    /// Load every file under `templates_dir`.
    pub fn load(templates_dir: &Path, config: &SiteConfig) -> Result<Self, GenerateError> {
        if !templates_dir.is_dir() {
            return Err(GenerateError::TemplatesDirMissing(templates_dir.to_path_buf()));
        }
        let mut templates = Vec::new();
        for entry in WalkDir::new(templates_dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file()
                || entry.file_name().to_string_lossy().starts_with('.')
            {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(templates_dir) else {
                continue;
            };
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let source = std::fs::read_to_string(entry.path())?;
            templates.push((name, source));
        }
        Self::from_templates(templates, config)
    }

    /// Build from in-memory `(name, source)` pairs.
    pub fn from_templates(
        templates: Vec<(String, String)>,
        config: &SiteConfig,
    ) -> Result<Self, GenerateError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|name| {
            if name.ends_with(".html") || name.ends_with(".htm") {
                AutoEscape::Html
            } else {
                AutoEscape::None
            }
        });
        let l10n = Arc::new(OnceLock::new());
        register_helpers(&mut env, &config.default_language, Arc::clone(&l10n));

        let mut names = Vec::with_capacity(templates.len());
        for (name, source) in templates {
            debug!(template = %name, "loading template");
            names.push(name.clone());
            env.add_template_owned(name, source)?;
        }
        names.sort();

        if env.get_template(&config.template_post).is_err() {
            return Err(GenerateError::MissingPostTemplate(
                config.template_post.clone(),
            ));
        }

        Ok(Self {
            env,
            l10n,
            names,
            post_template: config.template_post.clone(),
            default_language: config.default_language.clone(),
            comments_site_id: config.comments_site_id.clone(),
            site: Value::from_serialize(&config.site),
        })
    }

    pub fn template_names(&self) -> &[String] {
        &self.names
    }

    /// Messages for the `i18n` helper. Only the first call takes effect;
    /// until then every lookup returns its key.
    pub fn set_localization(&self, l10n: Localization) {
        if self.l10n.set(l10n).is_err() {
            warn!("localization already set, ignoring");
        }
    }

    /// Render every document to `<output>/<path>`.
    pub fn render_documents(
        &self,
        pages: &[Document],
        links: &[PageLinks<'_>],
        tags: &[TagCount],
        output_dir: &Path,
    ) -> RenderReport {
        let all = Value::from_serialize(pages);
        let tags = Value::from_serialize(tags);

        let results: Vec<Option<String>> = pages
            .par_iter()
            .zip(links.par_iter())
            .map(|(doc, link)| {
                let name = if doc.meta.template.is_empty() {
                    self.post_template.as_str()
                } else {
                    doc.meta.template.as_str()
                };
                let ctx = context! {
                    current => doc,
                    all => all.clone(),
                    prev => link.prev,
                    next => link.next,
                    language_variations => &link.language_variations,
                    default_language => &self.default_language,
                    comments_site_id => &self.comments_site_id,
                    site => self.site.clone(),
                    tags => tags.clone(),
                };
                match self.render_to(name, ctx, output_dir, &doc.path) {
                    Ok(()) => Some(doc.path.clone()),
                    Err(err) => {
                        warn!(path = %doc.source, template = name, error = %err, "page not rendered");
                        None
                    }
                }
            })
            .collect();
        RenderReport::collect(results)
    }

    /// Top-level templates rendered on their own, grouped into language
    /// variants by file name.
    ///
    /// Skips partials (leading `_`), the post template and any template a
    /// document uses as its override.
    pub fn standalone_templates(&self, pages: &[Document]) -> Vec<Vec<TemplatePage>> {
        let overrides: HashSet<&str> = pages
            .iter()
            .map(|d| d.meta.template.as_str())
            .filter(|t| !t.is_empty())
            .collect();

        let mut groups: BTreeMap<String, Vec<TemplatePage>> = BTreeMap::new();
        for name in &self.names {
            if name.contains('/')
                || name.starts_with('_')
                || *name == self.post_template
                || overrides.contains(name.as_str())
            {
                continue;
            }
            let (id, language) = match naming::parse_language_suffix(name) {
                Some(suffix) => (suffix.id, suffix.language),
                None => (name.clone(), self.default_language.clone()),
            };
            groups.entry(id.clone()).or_default().push(TemplatePage {
                id,
                path: name.clone(),
                language,
            });
        }
        groups
            .into_values()
            .map(|mut group| {
                navigation::stable_sort(&mut group, navigation::by_language_desc);
                group
            })
            .collect()
    }

    /// Render every standalone template to `<output>/<name>`.
    pub fn render_templates(
        &self,
        pages: &[Document],
        tags: &[TagCount],
        output_dir: &Path,
    ) -> RenderReport {
        let groups = self.standalone_templates(pages);
        let all = Value::from_serialize(pages);
        let tags = Value::from_serialize(tags);

        let jobs: Vec<(&TemplatePage, &Vec<TemplatePage>)> = groups
            .iter()
            .flat_map(|group| group.iter().map(move |page| (page, group)))
            .collect();

        let results: Vec<Option<String>> = jobs
            .par_iter()
            .map(|(page, group)| {
                let ctx = context! {
                    current => page,
                    all => all.clone(),
                    prev => (),
                    next => (),
                    language_variations => group,
                    default_language => &self.default_language,
                    comments_site_id => &self.comments_site_id,
                    site => self.site.clone(),
                    tags => tags.clone(),
                };
                match self.render_to(&page.path, ctx, output_dir, &page.path) {
                    Ok(()) => Some(page.path.clone()),
                    Err(err) => {
                        warn!(template = %page.path, error = %err, "template not rendered");
                        None
                    }
                }
            })
            .collect();
        RenderReport::collect(results)
    }

    fn render_to(
        &self,
        template: &str,
        ctx: Value,
        output_dir: &Path,
        rel_path: &str,
    ) -> Result<(), GenerateError> {
        let html = self.env.get_template(template)?.render(ctx)?;
        let target = output_dir.join(rel_path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, html)?;
        Ok(())
    }
}

fn register_helpers(
    env: &mut Environment<'static>,
    default_language: &str,
    l10n: Arc<OnceLock<Localization>>,
) {
    env.add_function("back", |path: &str| naming::back(path));
    env.add_function("year", |date: &str| year(date).to_string());
    env.add_function("join", join);
    env.add_function("strip_tags", |html: &str| strip_tags(html));
    env.add_filter("strip_tags", |html: &str| strip_tags(html));
    let default = default_language.to_string();
    env.add_function("lang_get_parameter", move |path: &str| {
        naming::lang_get_parameter(path, &default)
    });
    env.add_function("lang_to_get_parameter", |url: &str| {
        naming::lang_to_get_parameter(url)
    });
    let default = default_language.to_string();
    env.add_function("i18n", move |key: &str, lang: Option<String>| match l10n.get() {
        Some(messages) => messages.lookup(key, lang.as_deref().unwrap_or(&default)),
        None => key.to_string(),
    });
    env.add_filter("debug_json", debug_json);
}

/// First four characters of a date, or empty when it is shorter.
pub fn year(date: &str) -> &str {
    date.get(..4).unwrap_or("")
}

/// Remove everything that looks like a tag.
pub fn strip_tags(html: &str) -> String {
    HTML_TAG.replace_all(html, "").into_owned()
}

fn join(items: Value, sep: Option<String>) -> Result<String, minijinja::Error> {
    if items.is_undefined() || items.is_none() {
        return Ok(String::new());
    }
    let parts: Vec<String> = items.try_iter()?.map(|v| v.to_string()).collect();
    Ok(parts.join(sep.as_deref().unwrap_or("")))
}

fn debug_json(value: Value) -> Result<String, minijinja::Error> {
    serde_json::to_string_pretty(&value)
        .map_err(|e| {
            minijinja::Error::new(ErrorKind::InvalidOperation, "cannot serialize value")
                .with_source(e)
        })
}
