//! Build coordinator.
//!
//! Runs the stages of a build and owns their lifecycle:
//!
//! ```text
//!                ┌──────────── parse worker ─┐
//! walk ─► files ─┼──────────── parse worker ─┼─► join ─► sort ─► links ─► render ─► search
//!    (bounded)   └──────────── parse worker ─┘                                       │
//!                       │ image jobs (bounded)                                       │
//!                       ▼                                                            ▼
//!                  dispatcher (seen set) ─► rayon thumbnail tasks ─────────────► join
//! ```
//!
//! - The walk runs on the coordinating thread and feeds a bounded queue, so
//!   parsing starts before discovery finishes.
//! - Each parse worker keeps everything it produces (documents, message
//!   bundles, tag counts, stats) and hands it back through its join handle.
//! - The last image-job sender is dropped only after the walk has ended and
//!   every parse worker has been joined; the dispatcher then drains what is
//!   left and waits for its tasks.
//! - Completion order never reaches the output: every file carries its walk
//!   position, documents are ordered by it before the stable date sort, and
//!   bundles are merged in the same order.

use crate::config::{self, SiteConfig};
use crate::document;
use crate::generate::{GenerateError, RenderReport, Renderer};
use crate::i18n::{self, Localization, MessageBundle};
use crate::imaging::ImageBackend;
use crate::navigation;
use crate::process::{self, ImageJob, ProcessConfig, ThumbnailStats};
use crate::scan::{self, FileKind, ScanError, SourceFile};
use crate::search::{self, SearchError};
use crate::tags::{TagCount, TagCounter};
use crate::types::{Document, PageSet};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Files waiting for a parse worker.
const FILE_QUEUE_DEPTH: usize = 64;
/// Image jobs waiting for the dispatcher.
const IMAGE_QUEUE_DEPTH: usize = 100;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("search index: {0}")]
    Search(#[from] SearchError),
    #[error("{0} thread panicked")]
    Panicked(&'static str),
}

/// Per-file outcome counts of the parse stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub documents: usize,
    pub drafts: usize,
    pub bundles: usize,
    pub assets: usize,
    pub failed: usize,
}

impl AddAssign for ParseStats {
    fn add_assign(&mut self, other: Self) {
        self.documents += other.documents;
        self.drafts += other.drafts;
        self.bundles += other.bundles;
        self.assets += other.assets;
        self.failed += other.failed;
    }
}

/// Everything one parse worker produced.
#[derive(Debug, Default)]
struct WorkerOutput {
    documents: Vec<(usize, Document)>,
    bundles: Vec<(usize, MessageBundle)>,
    tags: TagCounter,
    stats: ParseStats,
}

impl WorkerOutput {
    fn merge(&mut self, other: WorkerOutput) {
        self.documents.extend(other.documents);
        self.bundles.extend(other.bundles);
        self.tags.merge(other.tags);
        self.stats += other.stats;
    }
}

/// Result of the parse stage, in deterministic order.
#[derive(Debug)]
pub struct ParsedSite {
    /// Newest first; equal dates keep walk order.
    pub pages: PageSet,
    pub l10n: Localization,
    pub tags: Vec<TagCount>,
    pub stats: ParseStats,
}

/// What a full build did.
#[derive(Debug)]
pub struct BuildSummary {
    pub parse: ParseStats,
    pub languages: Vec<String>,
    pub messages: usize,
    pub tags: Vec<TagCount>,
    pub pages: RenderReport,
    pub templates: RenderReport,
    pub search_files: Vec<PathBuf>,
    pub thumbnails: ThumbnailStats,
}

/// What `check` found.
#[derive(Debug)]
pub struct CheckSummary {
    pub parse: ParseStats,
    pub languages: Vec<String>,
    pub messages: usize,
    pub tags: Vec<TagCount>,
    pub standalone_templates: usize,
}

struct WorkerContext<'a> {
    source_root: &'a Path,
    output_dir: &'a Path,
    config: &'a SiteConfig,
    copy_assets: bool,
}

/// Full build: parse, thumbnail, render and index into `output_dir`.
pub fn build(
    source_root: &Path,
    output_dir: &Path,
    config: &SiteConfig,
    backend: &impl ImageBackend,
) -> Result<BuildSummary, PipelineError> {
    std::fs::create_dir_all(output_dir)?;
    let renderer = Renderer::load(&source_root.join(&config.templates_dir), config)?;
    info!(templates = renderer.template_names().len(), "templates loaded");

    let process_config = ProcessConfig::from_site_config(config);
    let process_config = &process_config;

    thread::scope(|s| -> Result<BuildSummary, PipelineError> {
        let (image_tx, image_rx) = mpsc::sync_channel::<ImageJob>(IMAGE_QUEUE_DEPTH);
        let dispatcher = s.spawn(move || {
            process::run_dispatcher(image_rx, backend, source_root, output_dir, process_config)
        });

        let ctx = WorkerContext {
            source_root,
            output_dir,
            config,
            copy_assets: true,
        };
        let site = parse_site(&ctx, Some(image_tx))?;

        let links = navigation::build_links(&site.pages);
        let languages = languages(&site.pages);
        let messages = site.l10n.message_count();
        renderer.set_localization(site.l10n);
        let pages = renderer.render_documents(&site.pages, &links, &site.tags, output_dir);
        let templates = renderer.render_templates(&site.pages, &site.tags, output_dir);

        let search_files = if config.search.enabled {
            search::write_index(&site.pages, &output_dir.join(&config.search.directory))?
        } else {
            Vec::new()
        };

        let thumbnails = dispatcher
            .join()
            .map_err(|_| PipelineError::Panicked("thumbnail dispatcher"))?;

        Ok(BuildSummary {
            parse: site.stats,
            languages,
            messages,
            tags: site.tags,
            pages,
            templates,
            search_files,
            thumbnails,
        })
    })
}

/// Parse everything and load the templates without writing anything.
pub fn check(
    source_root: &Path,
    output_dir: &Path,
    config: &SiteConfig,
) -> Result<CheckSummary, PipelineError> {
    let renderer = Renderer::load(&source_root.join(&config.templates_dir), config)?;
    let ctx = WorkerContext {
        source_root,
        output_dir,
        config,
        copy_assets: false,
    };
    let site = parse_site(&ctx, None)?;
    let links = navigation::build_links(&site.pages);
    debug!(pages = links.len(), "navigation built");

    Ok(CheckSummary {
        parse: site.stats,
        languages: languages(&site.pages),
        messages: site.l10n.message_count(),
        standalone_templates: renderer.standalone_templates(&site.pages).len(),
        tags: site.tags,
    })
}

/// Walk, parse on a worker pool, and put the results in order.
///
/// Takes the image sender by value so it is dropped once all workers have
/// been joined.
fn parse_site(
    ctx: &WorkerContext<'_>,
    image_tx: Option<SyncSender<ImageJob>>,
) -> Result<ParsedSite, PipelineError> {
    let files = scan::discover(ctx.source_root, ctx.output_dir, ctx.config)?;
    let workers = config::effective_threads(&ctx.config.processing);
    debug!(workers, "starting parse workers");

    let (file_tx, file_rx) = mpsc::sync_channel::<SourceFile>(FILE_QUEUE_DEPTH);
    let file_rx = Arc::new(Mutex::new(file_rx));

    let merged = thread::scope(|s| -> Result<WorkerOutput, PipelineError> {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let file_rx = Arc::clone(&file_rx);
                let image_tx = image_tx.clone();
                s.spawn(move || parse_worker(ctx, &file_rx, image_tx.as_ref()))
            })
            .collect();
        drop(file_rx);

        for file in files {
            if file_tx.send(file).is_err() {
                warn!("all parse workers stopped, ending walk early");
                break;
            }
        }
        drop(file_tx);

        let mut merged = WorkerOutput::default();
        for handle in handles {
            let output = handle
                .join()
                .map_err(|_| PipelineError::Panicked("parse worker"))?;
            merged.merge(output);
        }
        Ok(merged)
    })?;
    drop(image_tx);

    let WorkerOutput {
        mut documents,
        mut bundles,
        tags,
        stats,
    } = merged;

    documents.sort_by_key(|(seq, _)| *seq);
    let mut pages: PageSet = documents.into_iter().map(|(_, doc)| doc).collect();
    navigation::stable_sort(&mut pages, navigation::by_date_desc);

    bundles.sort_by_key(|(seq, _)| *seq);
    let mut l10n = Localization::new(&ctx.config.default_language);
    for (_, bundle) in bundles {
        l10n.add(bundle);
    }

    info!(
        documents = stats.documents,
        drafts = stats.drafts,
        bundles = stats.bundles,
        assets = stats.assets,
        failed = stats.failed,
        "parse stage finished"
    );

    Ok(ParsedSite {
        pages,
        l10n,
        tags: tags.sorted(),
        stats,
    })
}

fn parse_worker(
    ctx: &WorkerContext<'_>,
    files: &Mutex<Receiver<SourceFile>>,
    image_tx: Option<&SyncSender<ImageJob>>,
) -> WorkerOutput {
    let mut out = WorkerOutput::default();
    loop {
        let next = {
            let rx = match files.lock() {
                Ok(rx) => rx,
                Err(poisoned) => poisoned.into_inner(),
            };
            rx.recv()
        };
        let Ok(file) = next else { break };
        match file.kind {
            FileKind::Markdown => parse_markdown(ctx, &file, image_tx, &mut out),
            FileKind::Bundle => load_bundle(&file, &mut out),
            FileKind::Asset => copy_asset(ctx, &file, &mut out),
        }
    }
    out
}

fn parse_markdown(
    ctx: &WorkerContext<'_>,
    file: &SourceFile,
    image_tx: Option<&SyncSender<ImageJob>>,
    out: &mut WorkerOutput,
) {
    let content = match std::fs::read_to_string(&file.path) {
        Ok(content) => content,
        Err(err) => {
            warn!(path = %file.relative, error = %err, "cannot read document");
            out.stats.failed += 1;
            return;
        }
    };
    let doc = match document::parse_document(&file.relative, &content, ctx.config) {
        Ok(Some(doc)) => doc,
        Ok(None) => {
            debug!(path = %file.relative, "skipping draft");
            out.stats.drafts += 1;
            return;
        }
        Err(err) => {
            warn!(path = %file.relative, error = %err, "cannot parse front matter");
            out.stats.failed += 1;
            return;
        }
    };

    if doc.language == ctx.config.default_language {
        out.tags.add(&doc.meta.tags);
    }
    if let Some(tx) = image_tx {
        for image in &doc.images {
            let job = ImageJob {
                path: image.path.clone(),
                thumb_path: image.thumb_path.clone(),
            };
            if tx.send(job).is_err() {
                warn!(path = %image.path, "thumbnail dispatcher gone, image dropped");
            }
        }
    }
    debug!(path = %file.relative, language = %doc.language, "parsed");
    out.stats.documents += 1;
    out.documents.push((file.seq, doc));
}

fn load_bundle(file: &SourceFile, out: &mut WorkerOutput) {
    let result = std::fs::read_to_string(&file.path)
        .map_err(i18n::I18nError::from)
        .and_then(|content| i18n::parse_bundle(&file.relative, &content));
    match result {
        Ok(bundle) => {
            debug!(path = %file.relative, language = %bundle.language, "message file loaded");
            out.stats.bundles += 1;
            out.bundles.push((file.seq, bundle));
        }
        Err(err) => {
            warn!(path = %file.relative, error = %err, "cannot load message file");
            out.stats.failed += 1;
        }
    }
}

fn copy_asset(ctx: &WorkerContext<'_>, file: &SourceFile, out: &mut WorkerOutput) {
    if !ctx.copy_assets {
        out.stats.assets += 1;
        return;
    }
    let target = ctx.output_dir.join(&file.relative);
    let result = target
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|()| std::fs::copy(&file.path, &target));
    match result {
        Ok(_) => out.stats.assets += 1,
        Err(err) => {
            warn!(path = %file.relative, error = %err, "cannot copy asset");
            out.stats.failed += 1;
        }
    }
}

/// Distinct languages of the page set, sorted.
fn languages(pages: &[Document]) -> Vec<String> {
    let mut langs: Vec<String> = pages.iter().map(|d| d.language.clone()).collect();
    langs.sort();
    langs.dedup();
    langs
}
