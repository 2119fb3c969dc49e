//! Typographic clean-up of rendered HTML.
//!
//! Applied to a document's body when its `typography_enabled` toggle resolves
//! to true. Only text between tags is touched; markup, and everything inside
//! `<pre>`, `<code>`, `<script>` and `<style>`, passes through verbatim.
//!
//! | Input | Output |
//! |---|---|
//! | `"quoted"` | `«quoted»` |
//! | `word - word` | `word&nbsp;— word` |
//! | `...` | `…` |
//! | `a word` (1–2 letter word) | `a&nbsp;word` |

const NBSP: char = '\u{a0}';
const VERBATIM_TAGS: &[&str] = &["pre", "code", "script", "style"];

/// Apply all rules to an HTML fragment.
pub fn apply(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut verbatim_depth = 0usize;
    let mut quote_open = false;
    let mut rest = html;

    while !rest.is_empty() {
        match rest.find('<') {
            Some(0) => {
                let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
                let tag = &rest[..end];
                match tag_name(tag) {
                    Some((name, closing)) if VERBATIM_TAGS.contains(&name.as_str()) => {
                        if closing {
                            verbatim_depth = verbatim_depth.saturating_sub(1);
                        } else {
                            verbatim_depth += 1;
                        }
                    }
                    _ => {}
                }
                out.push_str(tag);
                rest = &rest[end..];
            }
            found => {
                let end = found.unwrap_or(rest.len());
                let text = &rest[..end];
                if verbatim_depth > 0 {
                    out.push_str(text);
                } else {
                    out.push_str(&typeset_text(text, &mut quote_open));
                }
                rest = &rest[end..];
            }
        }
    }
    out
}

/// Lowercased element name and whether the tag is a closing one.
fn tag_name(tag: &str) -> Option<(String, bool)> {
    let inner = tag.strip_prefix('<')?;
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    (!name.is_empty()).then_some((name, closing))
}

/// Quote state carries across text nodes: `"a <em>b</em>"` pairs correctly.
fn typeset_text(text: &str, quote_open: &mut bool) -> String {
    let text = text
        .replace("&quot;", "\"")
        .replace("...", "…")
        .replace(" - ", &format!("{NBSP}— "));

    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut word_len = 0usize;
    let mut word_is_fresh = true;

    for c in text.chars() {
        match c {
            '"' => {
                out.push(if *quote_open { '»' } else { '«' });
                *quote_open = !*quote_open;
                word_len = 0;
                word_is_fresh = true;
            }
            ' ' if (1..=2).contains(&word_len) && word_is_fresh => {
                out.push(NBSP);
                word_len = 0;
            }
            c if c.is_alphabetic() => {
                if word_len == 0 {
                    word_is_fresh = prev.is_none_or(|p| {
                        p.is_whitespace() || matches!(p, '«' | '(' | '"' | '>')
                    });
                }
                word_len += 1;
                out.push(c);
            }
            c => {
                word_len = 0;
                word_is_fresh = true;
                out.push(c);
            }
        }
        prev = Some(c);
    }
    out
}
