//! Thumbnail stage.
//!
//! Parse workers emit one [`ImageJob`] per image reference. A single
//! dispatcher ([`run_dispatcher`]) drains the job queue, keeps the only
//! "seen" set, and hands each unique thumbnail to the rayon pool exactly once:
//!
//! ```text
//! worker ─┐                      ┌─ rayon task ─ load ─ fit ─ write
//! worker ─┼─► bounded queue ─► dispatcher ─┼─ rayon task ─ ...
//! worker ─┘     (ImageJob)    (seen set)   └─ rayon task ─ ...
//! ```
//!
//! A local image has exactly one thumbnail path. A URL gets a thumbnail under
//! the directory of every document that uses it, so downloads are shared
//! through a per-URL slot and each URL is fetched at most once.
//!
//! ## Sources
//!
//! | Reference | Loaded from |
//! |---|---|
//! | `2024/cover.jpg` | `<source>/2024/cover.jpg` |
//! | `https://host/a.png` | HTTP GET via `ureq`, bounded by `fetch_timeout_secs` |
//!
//! Thumbnails are written to `<output>/<thumb_path>`. A failure on one image
//! is logged with its path and never stops the others.

use crate::config::SiteConfig;
use crate::imaging::{BackendError, ImageBackend, Quality, ThumbnailConfig, create_thumbnail, paths};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Largest remote image accepted, in bytes.
const MAX_REMOTE_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("fetching {url} failed: {source}")]
    Fetch {
        url: String,
        source: Box<ureq::Error>,
    },
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("fetching {url} failed: {reason}")]
    Unavailable { url: String, reason: String },
}

/// Download outcome of one URL, shared by every thumbnail made from it.
type Fetched = Result<Arc<[u8]>, String>;
type RemoteSlot = Arc<OnceLock<Fetched>>;

/// One image to thumbnail, as emitted by a parse worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    /// Source-relative path or URL.
    pub path: String,
    /// Output-relative thumbnail path; the de-duplication key.
    pub thumb_path: String,
}

/// Settings for the thumbnail stage.
#[derive(Debug, Clone, Copy)]
pub struct ProcessConfig {
    pub thumbnail: ThumbnailConfig,
    pub fetch_timeout: Duration,
}

impl ProcessConfig {
    /// Build a ProcessConfig from SiteConfig values.
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self {
            thumbnail: ThumbnailConfig {
                max_width: config.thumbnails.max_width,
                max_height: config.thumbnails.max_height,
                quality: Quality::new(config.thumbnails.quality),
            },
            fetch_timeout: Duration::from_secs(config.thumbnails.fetch_timeout_secs),
        }
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::from_site_config(&SiteConfig::default())
    }
}

/// Outcome counts for the thumbnail stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThumbnailStats {
    /// Jobs received, duplicates included.
    pub requested: usize,
    pub created: usize,
    pub failed: usize,
}

impl ThumbnailStats {
    pub fn duplicates(&self) -> usize {
        self.requested - self.created - self.failed
    }
}

impl std::fmt::Display for ThumbnailStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} failed, {} duplicate references",
            self.created,
            self.failed,
            self.duplicates()
        )
    }
}

/// Drain `jobs` until every sender is gone, writing each unique thumbnail
/// once and fetching each URL at most once.
///
/// Returns after all spawned work has finished.
pub fn run_dispatcher(
    jobs: Receiver<ImageJob>,
    backend: &impl ImageBackend,
    source_root: &Path,
    output_dir: &Path,
    config: &ProcessConfig,
) -> ThumbnailStats {
    let mut seen: HashSet<String> = HashSet::new();
    let mut remote: HashMap<String, RemoteSlot> = HashMap::new();
    let mut requested = 0;
    let created = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    rayon::scope(|s| {
        for job in jobs {
            requested += 1;
            if !seen.insert(job.thumb_path.clone()) {
                debug!(path = %job.path, thumb = %job.thumb_path, "thumbnail already scheduled");
                continue;
            }
            let slot = paths::is_remote(&job.path)
                .then(|| Arc::clone(remote.entry(job.path.clone()).or_default()));
            let (created, failed) = (&created, &failed);
            s.spawn(move |_| {
                let result = match slot {
                    Some(slot) => thumbnail_shared(backend, &job, &slot, output_dir, config),
                    None => thumbnail(backend, &job, source_root, output_dir, config),
                };
                match result {
                    Ok((w, h)) => {
                        debug!(path = %job.path, thumb = %job.thumb_path, w, h, "thumbnail written");
                        created.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        warn!(path = %job.path, error = %err, "thumbnail failed");
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    ThumbnailStats {
        requested,
        created: created.into_inner(),
        failed: failed.into_inner(),
    }
}

/// Load one image and write its thumbnail.
pub fn thumbnail(
    backend: &impl ImageBackend,
    job: &ImageJob,
    source_root: &Path,
    output_dir: &Path,
    config: &ProcessConfig,
) -> Result<(u32, u32), ProcessError> {
    let data = load_source(&job.path, source_root, config.fetch_timeout)?;
    let output = output_dir.join(&job.thumb_path);
    Ok(create_thumbnail(
        backend,
        &job.path,
        &data,
        &output,
        &config.thumbnail,
    )?)
}

/// Write a thumbnail for a URL whose bytes may already have been fetched for
/// another thumbnail.
fn thumbnail_shared(
    backend: &impl ImageBackend,
    job: &ImageJob,
    slot: &OnceLock<Fetched>,
    output_dir: &Path,
    config: &ProcessConfig,
) -> Result<(u32, u32), ProcessError> {
    let fetched = slot.get_or_init(|| {
        fetch_remote(&job.path, config.fetch_timeout)
            .map(Arc::from)
            .map_err(|e| e.to_string())
    });
    let data = fetched
        .as_ref()
        .map_err(|reason| ProcessError::Unavailable {
            url: job.path.clone(),
            reason: reason.clone(),
        })?;
    let output = output_dir.join(&job.thumb_path);
    Ok(create_thumbnail(
        backend,
        &job.path,
        data,
        &output,
        &config.thumbnail,
    )?)
}

/// Read a local image or download a remote one.
pub fn load_source(
    reference: &str,
    source_root: &Path,
    timeout: Duration,
) -> Result<Vec<u8>, ProcessError> {
    if paths::is_remote(reference) {
        fetch_remote(reference, timeout)
    } else {
        Ok(std::fs::read(source_root.join(reference))?)
    }
}

fn fetch_remote(url: &str, timeout: Duration) -> Result<Vec<u8>, ProcessError> {
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let response = agent.get(url).call().map_err(|e| ProcessError::Fetch {
        url: url.to_string(),
        source: Box::new(e),
    })?;
    let mut data = Vec::new();
    response
        .into_reader()
        .take(MAX_REMOTE_BYTES)
        .read_to_end(&mut data)?;
    Ok(data)
}
