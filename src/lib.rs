//! # Inkwell
//!
//! A static site generator for multilingual Markdown blogs. Every `.md` file
//! under the source directory becomes a page; translations are ordinary
//! files with a two-letter suffix (`hello_ru.md`) and are tied to their
//! original through a shared id.
//!
//! # Architecture: One Concurrent Pass
//!
//! ```text
//! walk ─► parse workers ─► sort ─► navigation ─► render ─► search index
//!               │
//!               └─► image jobs ─► thumbnail dispatcher ─► rayon
//! ```
//!
//! Discovery, parsing and thumbnailing overlap; rendering waits for every
//! document. Output is a pure function of the input tree: repeated runs
//! produce identical files regardless of how work was scheduled.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Coordinator: worker pool, queues, joins, build/check entry points |
//! | [`scan`] | Sorted walk of the source tree and per-file classification |
//! | [`document`] | One Markdown file → one [`types::Document`] |
//! | [`metadata`] | Front-matter splitting and decoding |
//! | [`convention`] | Title, tag line and image references inferred from the body |
//! | [`naming`] | `_xx` language suffixes, output paths, URL helpers |
//! | [`imaging`] | Image reference normalization and thumbnail generation |
//! | [`process`] | Thumbnail stage: de-duplicating dispatcher and loaders |
//! | [`navigation`] | Sorting, prev/next links and language variants |
//! | [`generate`] | minijinja rendering of documents and standalone templates |
//! | [`i18n`] | Template messages loaded from `.toml` files |
//! | [`tags`] | Tag usage counts |
//! | [`typography`] | Optional typographic clean-up of rendered HTML |
//! | [`search`] | Per-language JSON search index |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`types`] | Shared types (`Document`, `Image`, `PageSet`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Files Carry Their Language
//!
//! A translation needs no registry entry: `post_ru.md` is the Russian
//! variant of `post.md` because the names say so. An explicit `language`
//! key in the front matter wins over the suffix. Templates follow the same
//! rule, so `index_ru.html` is the Russian front page.
//!
//! ## Conventions Over Front Matter
//!
//! Front matter is optional. The first `# ` heading is the title and a line
//! like `#rust #web` is the tag list, so a plain Markdown note is already a
//! valid post.
//!
//! ## Runtime Templates
//!
//! Templates are read from the source tree at build time and rendered with
//! minijinja. Changing the look of a site never requires rebuilding the
//! binary.
//!
//! ## Determinism
//!
//! Every discovered file gets its walk position before work fans out.
//! Documents and message files are put back in that order before anything
//! depends on it, and dates are sorted with a stable sort, so completion
//! order on the worker pool never shows in the output.

pub mod config;
pub mod convention;
pub mod document;
pub mod generate;
pub mod i18n;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod navigation;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod scan;
pub mod search;
pub mod tags;
pub mod types;
pub mod typography;

#[cfg(test)]
pub(crate) mod test_helpers;
