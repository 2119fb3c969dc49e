//! Prev/next links and language variants over the sorted [`PageSet`].
//!
//! The page set is ordered newest first, so "next" walks towards older
//! posts and "prev" towards newer ones:
//!
//! ```text
//! index:    0          1          2          3
//!           c (en)     c_ru (ru)  b (en)     a (en)
//!
//! links of b:  prev = c   (c_ru: other language, skipped)
//!              next = a
//! ```
//!
//! Translations of the current document share its `id` and are never its
//! chronological neighbours.
//!
//! [`PageSet`]: crate::types::PageSet

use crate::types::Document;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Something carrying a language code.
pub trait Localized {
    fn language(&self) -> &str;
}

impl Localized for Document {
    fn language(&self) -> &str {
        &self.language
    }
}

impl<T: Localized + ?Sized> Localized for &T {
    fn language(&self) -> &str {
        (**self).language()
    }
}

/// Stable in-place sort; equal items keep their current order.
pub fn stable_sort<T>(items: &mut [T], cmp: impl FnMut(&T, &T) -> Ordering) {
    items.sort_by(cmp);
}

/// Newest first. Dates compare as text, which orders ISO dates correctly.
pub fn by_date_desc(a: &Document, b: &Document) -> Ordering {
    b.meta.date.cmp(&a.meta.date)
}

pub fn by_language_desc<T: Localized>(a: &T, b: &T) -> Ordering {
    b.language().cmp(a.language())
}

/// Navigation for one page.
#[derive(Debug, Clone, Default)]
pub struct PageLinks<'a> {
    pub prev: Option<&'a Document>,
    pub next: Option<&'a Document>,
    /// All documents sharing the page's `id`, the page itself included.
    pub language_variations: Vec<&'a Document>,
}

/// Nearest older document in the same language, skipping translations.
pub fn next(pages: &[Document], index: usize) -> Option<&Document> {
    let current = pages.get(index)?;
    pages[index + 1..]
        .iter()
        .find(|d| is_neighbour(current, d))
}

/// Nearest newer document in the same language, skipping translations.
pub fn prev(pages: &[Document], index: usize) -> Option<&Document> {
    let current = pages.get(index)?;
    pages[..index]
        .iter()
        .rev()
        .find(|d| is_neighbour(current, d))
}

fn is_neighbour(current: &Document, candidate: &Document) -> bool {
    candidate.language == current.language && candidate.id != current.id
}

/// Documents with the given `id`, language descending.
pub fn language_variations<'a>(pages: &'a [Document], id: &str) -> Vec<&'a Document> {
    let mut variants: Vec<&Document> = pages.iter().filter(|d| d.id == id).collect();
    stable_sort(&mut variants, by_language_desc);
    variants
}

/// Links for every page of a sorted page set, computed once.
pub fn build_links(pages: &[Document]) -> Vec<PageLinks<'_>> {
    let mut groups: HashMap<&str, Vec<&Document>> = HashMap::new();
    for doc in pages {
        groups.entry(doc.id.as_str()).or_default().push(doc);
    }
    for variants in groups.values_mut() {
        stable_sort(variants, by_language_desc);
    }

    (0..pages.len())
        .map(|i| PageLinks {
            prev: prev(pages, i),
            next: next(pages, i),
            language_variations: groups
                .get(pages[i].id.as_str())
                .cloned()
                .unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::document::parse_document;

    fn doc(source: &str, date: &str) -> Document {
        let content = format!("---\ndate: {date}\n---\n# {source}\n");
        parse_document(source, &content, &SiteConfig::default())
            .unwrap()
            .unwrap()
    }

    fn sorted(mut pages: Vec<Document>) -> Vec<Document> {
        stable_sort(&mut pages, by_date_desc);
        pages
    }

    fn sources(docs: &[&Document]) -> Vec<String> {
        docs.iter().map(|d| d.source.clone()).collect()
    }

    fn source_of(doc: Option<&Document>) -> Option<&str> {
        doc.map(|d| d.source.as_str())
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    #[test]
    fn date_sort_is_stable() {
        let pages = sorted(vec![
            doc("a.md", "2020-01-01"),
            doc("b.md", "2021-01-01"),
            doc("c.md", "2020-01-01"),
            doc("d.md", "2021-01-01"),
        ]);
        let order: Vec<&str> = pages.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(order, vec!["b.md", "d.md", "a.md", "c.md"]);
    }

    #[test]
    fn language_sort_descending() {
        let pages = vec![doc("p.md", "2020"), doc("p_de.md", "2020"), doc("p_ru.md", "2020")];
        let mut refs: Vec<&Document> = pages.iter().collect();
        stable_sort(&mut refs, by_language_desc);
        let langs: Vec<&str> = refs.iter().map(|d| d.language.as_str()).collect();
        assert_eq!(langs, vec!["ru", "en", "de"]);
    }

    // =========================================================================
    // Prev / next
    // =========================================================================

    #[test]
    fn three_documents_chain() {
        let pages = sorted(vec![
            doc("old.md", "2020-01-01"),
            doc("mid.md", "2021-01-01"),
            doc("new.md", "2022-01-01"),
        ]);
        assert_eq!(source_of(prev(&pages, 0)), None);
        assert_eq!(source_of(next(&pages, 0)), Some("mid.md"));
        assert_eq!(source_of(prev(&pages, 1)), Some("new.md"));
        assert_eq!(source_of(next(&pages, 1)), Some("old.md"));
        assert_eq!(source_of(prev(&pages, 2)), Some("mid.md"));
        assert_eq!(source_of(next(&pages, 2)), None);
    }

    #[test]
    fn other_languages_and_translations_skipped() {
        let pages = sorted(vec![
            doc("a.md", "2020-01-01"),
            doc("b.md", "2021-01-01"),
            doc("b_ru.md", "2021-01-01"),
            doc("x_ru.md", "2020-06-01"),
            doc("c.md", "2022-01-01"),
        ]);
        let b = pages.iter().position(|d| d.source == "b.md").unwrap();
        assert_eq!(source_of(prev(&pages, b)), Some("c.md"));
        assert_eq!(source_of(next(&pages, b)), Some("a.md"));

        let b_ru = pages.iter().position(|d| d.source == "b_ru.md").unwrap();
        assert_eq!(source_of(prev(&pages, b_ru)), None);
        assert_eq!(source_of(next(&pages, b_ru)), Some("x_ru.md"));
    }

    #[test]
    fn lone_language_has_no_neighbours() {
        let pages = sorted(vec![
            doc("a.md", "2020-01-01"),
            doc("b_de.md", "2021-01-01"),
            doc("c.md", "2022-01-01"),
        ]);
        let de = pages.iter().position(|d| d.language == "de").unwrap();
        assert!(prev(&pages, de).is_none());
        assert!(next(&pages, de).is_none());
    }

    #[test]
    fn out_of_range_index() {
        let pages = vec![doc("a.md", "2020")];
        assert!(next(&pages, 5).is_none());
        assert!(prev(&pages, 5).is_none());
    }

    // =========================================================================
    // Language variations
    // =========================================================================

    #[test]
    fn variations_share_id() {
        let pages = sorted(vec![
            doc("p.md", "2020"),
            doc("p_ru.md", "2020"),
            doc("q.md", "2020"),
            doc("p_de.md", "2020"),
        ]);
        let variants = language_variations(&pages, "p.md");
        assert_eq!(sources(&variants), vec!["p_ru.md", "p.md", "p_de.md"]);
    }

    #[test]
    fn build_links_matches_individual_functions() {
        let pages = sorted(vec![
            doc("a.md", "2020-01-01"),
            doc("a_ru.md", "2020-01-01"),
            doc("b.md", "2021-01-01"),
        ]);
        let links = build_links(&pages);
        assert_eq!(links.len(), pages.len());
        for (i, link) in links.iter().enumerate() {
            assert_eq!(source_of(link.prev), source_of(prev(&pages, i)));
            assert_eq!(source_of(link.next), source_of(next(&pages, i)));
            assert_eq!(
                sources(&link.language_variations),
                sources(&language_variations(&pages, &pages[i].id))
            );
        }
        let a = pages.iter().position(|d| d.source == "a.md").unwrap();
        assert_eq!(sources(&links[a].language_variations), vec!["a_ru.md", "a.md"]);
    }
}
