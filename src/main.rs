use clap::{Parser, Subcommand};
use inkwell::imaging::RustBackend;
use inkwell::{config, output, pipeline};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "inkwell")]
#[command(about = "Static site generator for multilingual Markdown blogs")]
#[command(long_about = "\
Static site generator for multilingual Markdown blogs

Every .md file becomes a page. Translations sit next to the original with a
two-letter suffix and are linked to each other automatically.

Source structure:

  blog/
  ├── config.toml                  # Site config (optional)
  ├── templates/
  │   ├── post.html                # Renders every document
  │   ├── index.html               # Rendered once → output/index.html
  │   ├── index_ru.html            # Russian variant of index.html
  │   └── _base.html               # Leading underscore: include-only
  ├── i18n/ru.toml                 # Template messages for `ru`
  └── 2024/
      ├── hello.md                 # English (default language)
      ├── hello_ru.md              # Russian translation, same id
      └── cover.jpg                # Copied; thumbnailed when referenced

Metadata resolution (first available wins):
  Title:     front matter → first `# ` heading
  Tags:      first `#tag #tag` line → front matter
  Language:  front matter → `_xx` file suffix → default_language

Run 'inkwell gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Source directory
    #[arg(long, env = "INPUT_SOURCE_DIRECTORY", default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, env = "INPUT_OUTPUT_DIRECTORY", default_value = "./output", global = true)]
    output: PathBuf,

    /// Templates directory, relative to the source directory
    #[arg(long, env = "INPUT_TEMPLATES_DIRECTORY", global = true)]
    templates: Option<String>,

    /// Language of documents without a language or file suffix
    #[arg(long, env = "INPUT_DEFAULT_LANGUAGE", global = true)]
    default_language: Option<String>,

    /// Render documents marked `draft: true`
    #[arg(long, env = "INPUT_SHOW_DRAFTS", global = true)]
    show_drafts: bool,

    /// Site title
    #[arg(long, env = "INPUT_TITLE", global = true)]
    title: Option<String>,

    /// Site short description
    #[arg(long, env = "INPUT_SHORT_DESCRIPTION", global = true)]
    short_description: Option<String>,

    /// Site author
    #[arg(long, env = "INPUT_AUTHOR", global = true)]
    author: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: parse → thumbnail → render
    Build,
    /// Parse every source file and load templates without writing output
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            let config = load_site_config(&cli)?;
            config.require_site_info()?;
            init_thread_pool(&config.processing);

            println!(
                "==> Building {} → {}",
                cli.source.display(),
                cli.output.display()
            );
            let started = Instant::now();
            let summary = pipeline::build(&cli.source, &cli.output, &config, &RustBackend::new())?;
            output::print_build_output(&summary, &cli.output);
            info!(elapsed_ms = started.elapsed().as_millis() as u64, "build finished");
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            let config = load_site_config(&cli)?;
            init_thread_pool(&config.processing);

            println!("==> Checking {}", cli.source.display());
            let summary = pipeline::check(&cli.source, &cli.output, &config)?;
            output::print_check_output(&summary);
            if summary.parse.failed > 0 {
                return Err(format!("{} source files could not be processed", summary.parse.failed).into());
            }
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `config.toml` from the source root, then command-line overrides.
fn load_site_config(cli: &Cli) -> Result<config::SiteConfig, config::ConfigError> {
    let mut config = config::load_config(&cli.source)?;
    if let Some(templates) = &cli.templates {
        config.templates_dir = templates.clone();
    }
    if let Some(language) = &cli.default_language {
        config.default_language = language.to_ascii_lowercase();
    }
    if cli.show_drafts {
        config.show_drafts = true;
    }
    if let Some(title) = &cli.title {
        config.site.title = title.clone();
    }
    if let Some(description) = &cli.short_description {
        config.site.short_description = description.clone();
    }
    if let Some(author) = &cli.author {
        config.site.author = author.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
