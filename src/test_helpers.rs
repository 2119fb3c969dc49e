//! Shared test utilities.
//!
//! Builds throwaway source trees inside a `TempDir`:
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! minimal_templates(tmp.path());
//! write_file(tmp.path(), "2024/post.md", "# Post\ntext");
//! write_png(tmp.path(), "2024/pic.png", 400, 300);
//! ```

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
}

/// Write a solid-colour PNG of the given size to `root/rel`.
pub fn write_png(root: &Path, rel: &str, width: u32, height: u32) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 80, 40]));
    img.save(&path).unwrap();
}

/// `templates/post.html` and `templates/index.html` under `root`.
pub fn minimal_templates(root: &Path) {
    write_file(
        root,
        "templates/post.html",
        "<title>{{ current.meta.title }}</title>{{ current.body|safe }}",
    );
    write_file(
        root,
        "templates/index.html",
        "{% for p in all %}{{ p.meta.title }};{% endfor %}",
    );
}

/// Serve `body` to every request on a local port.
///
/// Returns the base URL and the number of requests answered so far. The
/// server thread lives until the test process exits.
pub fn serve_bytes(body: Vec<u8>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if line == "\r\n" => break,
                    Ok(_) => {}
                }
            }
            counter.fetch_add(1, Ordering::SeqCst);
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
        }
    });
    (base, hits)
}
