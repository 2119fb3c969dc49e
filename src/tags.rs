//! Tag usage counts.
//!
//! Each parse worker keeps its own [`TagCounter`] for the documents it owns;
//! the coordinator merges them after the join. Only documents in the default
//! language are counted, so a post and its translations count once.

use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCounter {
    counts: HashMap<String, usize>,
}

/// One row of the final tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

impl TagCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every tag of one document. Repeated tags count each time.
    pub fn add<'a>(&mut self, tags: impl IntoIterator<Item = &'a String>) {
        for tag in tags {
            *self.counts.entry(tag.clone()).or_default() += 1;
        }
    }

    pub fn merge(&mut self, other: TagCounter) {
        for (tag, n) in other.counts {
            *self.counts.entry(tag).or_default() += n;
        }
    }

    /// Most used first; ties by tag name.
    pub fn sorted(&self) -> Vec<TagCount> {
        let mut rows: Vec<TagCount> = self
            .counts
            .iter()
            .map(|(tag, &count)| TagCount {
                tag: tag.clone(),
                count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        rows
    }
}
