use std::collections::BTreeSet;

/// Maximum tag length in characters.
pub const MAX_TAG_LEN: usize = 64;

/// Normalize a user-supplied tag.
///
/// Tags are trimmed and lower-cased, and must consist of `[a-z0-9._-]` with
/// a length between 1 and 64. Returns `None` for anything else.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().to_lowercase();
    if tag.is_empty() || tag.chars().count() > MAX_TAG_LEN {
        return None;
    }
    let valid = tag
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'));
    valid.then_some(tag)
}

/// Sorted set of normalized tags, persisted one per line as `.bundle/TAGS.txt`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tags {
    tags: BTreeSet<String>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the line-based text format, dropping invalid entries.
    pub fn parse(text: &str) -> Self {
        let mut tags = Self::new();
        tags.add(text.lines());
        tags
    }

    /// Render the line-based text format: sorted, one tag per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for tag in &self.tags {
            out.push_str(tag);
            out.push('\n');
        }
        out
    }

    /// Add tags, returning how many were new. Invalid tags are ignored.
    pub fn add<I, S>(&mut self, tags: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter()
            .filter_map(|t| normalize_tag(t.as_ref()))
            .filter(|t| self.tags.insert(t.clone()))
            .count()
    }

    /// Remove tags, returning how many were present.
    pub fn remove<I, S>(&mut self, tags: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter()
            .filter_map(|t| normalize_tag(t.as_ref()))
            .filter(|t| self.tags.remove(t))
            .count()
    }

    pub fn contains(&self, tag: &str) -> bool {
        normalize_tag(tag).is_some_and(|t| self.tags.contains(&t))
    }

    pub fn list(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
