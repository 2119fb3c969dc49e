//! End-to-end builds over a temporary source tree.

use inkwell::config::SiteConfig;
use inkwell::imaging::RustBackend;
use inkwell::pipeline::{self, PipelineError};
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn write_png(root: &Path, rel: &str, width: u32, height: u32) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::from_pixel(width, height, image::Rgb([10, 120, 200]))
        .save(path)
        .unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel))
        .unwrap_or_else(|e| panic!("cannot read {rel}: {e}"))
}

/// Every file under `root` with its bytes.
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
            (rel, std::fs::read(e.path()).unwrap())
        })
        .collect()
}

fn blog(src: &Path) {
    write(
        src,
        "templates/post.html",
        "{{ current.meta.title }}\
         |{% if prev %}{{ prev.canonical|safe }}{% endif %}\
         |{% if next %}{{ next.canonical|safe }}{% endif %}\
         |{% for v in language_variations %}{{ v.language }}{% endfor %}\
         |{{ i18n(\"read\", current.language) }}",
    );
    write(
        src,
        "templates/index.html",
        "{% for p in all %}{{ p.meta.title }};{% endfor %}",
    );
    write(
        src,
        "templates/index_ru.html",
        "{{ current.language }}|{% for v in language_variations %}{{ v.path }};{% endfor %}",
    );
    write(src, "templates/_base.html", "never rendered");

    write(
        src,
        "2024/a.md",
        "---\ndate: 2024-01-02\n---\n# Alpha\n#rust #web\n![pic](pic.png \"Pic\")\nAlpha body",
    );
    write(
        src,
        "2024/a_ru.md",
        "---\ndate: 2024-01-02\n---\n# Альфа\n![pic](pic.png)\nтекст",
    );
    write(
        src,
        "2023/b.md",
        "---\ndate: 2023-05-01\ntags: rust\n---\n# Beta\n![pic](../2024/pic.png)\nBeta body",
    );
    write(src, "2022/wip.md", "---\ndraft: true\n---\n# WIP");
    write(src, "README.md", "# not a post");
    write(src, "notes.txt", "ignored");
    write_png(src, "2024/pic.png", 400, 300);
    write(src, "i18n/en.toml", "read = \"Read\"");
    write(src, "i18n/ru.toml", "read = \"Читать\"");
}

fn config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.search.enabled = true;
    config
}

#[test]
fn builds_a_multilingual_site() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let out = tmp.path().join("out");
    blog(&src);

    let summary = pipeline::build(&src, &out, &config(), &RustBackend::new()).unwrap();

    assert_eq!(summary.parse.documents, 3);
    assert_eq!(summary.parse.drafts, 1);
    assert_eq!(summary.parse.bundles, 2);
    assert_eq!(summary.parse.assets, 1);
    assert_eq!(summary.parse.failed, 0);
    assert_eq!(summary.languages, vec!["en", "ru"]);
    assert_eq!(
        summary.pages.rendered,
        vec!["2024/a.html", "2024/a_ru.html", "2023/b.html"]
    );

    // Pages and navigation
    assert_eq!(read(&out, "2024/a.html"), "Alpha||2023/b.html|ruen|Read");
    assert_eq!(read(&out, "2024/a_ru.html"), "Альфа|||ruen|Читать");
    assert_eq!(read(&out, "2023/b.html"), "Beta|2024/a.html||en|Read");
    assert!(!out.join("2022/wip.html").exists());
    assert!(!out.join("README.html").exists());

    // Standalone templates
    assert_eq!(read(&out, "index.html"), "Alpha;Альфа;Beta;");
    assert_eq!(read(&out, "index_ru.html"), "ru|index_ru.html;index.html;");
    assert!(!out.join("_base.html").exists());
    assert!(!out.join("post.html").exists());

    // Assets and thumbnails
    assert!(out.join("2024/pic.png").is_file());
    assert!(!out.join("notes.txt").exists());
    assert!(!out.join("i18n/ru.toml").exists());
    let thumb = image::open(out.join("thumb/2024/pic.png")).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (140, 105));
    assert_eq!(summary.thumbnails.requested, 3);
    assert_eq!(summary.thumbnails.created, 1);
    assert_eq!(summary.thumbnails.failed, 0);

    // Tags count default-language documents only
    let tags: Vec<(&str, usize)> = summary
        .tags
        .iter()
        .map(|t| (t.tag.as_str(), t.count))
        .collect();
    assert_eq!(tags, vec![("rust", 2), ("web", 1)]);

    // Search index
    let en: serde_json::Value = serde_json::from_str(&read(&out, "search/en.json")).unwrap();
    let titles: Vec<&str> = en
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Alpha", "Beta"]);
    let ru: serde_json::Value = serde_json::from_str(&read(&out, "search/ru.json")).unwrap();
    assert_eq!(ru[0]["text"], "текст");
}

#[test]
fn repeated_builds_are_identical() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let out = tmp.path().join("out");
    blog(&src);

    pipeline::build(&src, &out, &config(), &RustBackend::new()).unwrap();
    let first = snapshot(&out);
    pipeline::build(&src, &out, &config(), &RustBackend::new()).unwrap();
    let second = snapshot(&out);

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn output_does_not_depend_on_worker_count() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    blog(&src);
    for i in 0..6 {
        write(
            &src,
            &format!("2021/same-day-{i}.md"),
            &format!("---\ndate: 2021-01-01\n---\n# Same {i}\n#tag{i}"),
        );
    }

    let mut snapshots = Vec::new();
    for workers in [1, 8] {
        let out = tmp.path().join(format!("out-{workers}"));
        let mut config = config();
        config.processing.max_processes = Some(workers);
        pipeline::build(&src, &out, &config, &RustBackend::new()).unwrap();
        snapshots.push(snapshot(&out));
    }
    assert_eq!(snapshots[0], snapshots[1]);

    let index = std::str::from_utf8(&snapshots[0]["index.html"]).unwrap().to_string();
    assert_eq!(
        index,
        "Alpha;Альфа;Beta;Same 0;Same 1;Same 2;Same 3;Same 4;Same 5;"
    );
}

#[test]
fn output_inside_source_is_not_walked() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path();
    blog(src);
    let out = src.join("output");

    pipeline::build(src, &out, &config(), &RustBackend::new()).unwrap();
    let second = pipeline::build(src, &out, &config(), &RustBackend::new()).unwrap();

    assert_eq!(second.parse.documents, 3);
    assert_eq!(second.parse.assets, 1);
    assert!(!out.join("output").exists());
}

#[test]
fn missing_source_root_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let templates = tmp.path().join("templates");
    write(&templates, "post.html", "x");
    let mut config = SiteConfig::default();
    config.templates_dir = templates.to_string_lossy().into_owned();

    let result = pipeline::build(
        &tmp.path().join("missing"),
        &tmp.path().join("out"),
        &config,
        &RustBackend::new(),
    );
    assert!(matches!(result, Err(PipelineError::Scan(_))));
}

#[test]
fn check_reports_without_writing() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let out = tmp.path().join("out");
    blog(&src);

    let summary = pipeline::check(&src, &out, &config()).unwrap();
    assert_eq!(summary.parse.documents, 3);
    assert_eq!(summary.messages, 2);
    assert_eq!(summary.standalone_templates, 1);
    assert!(!out.exists());
}
