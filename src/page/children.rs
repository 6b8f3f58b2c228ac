use super::{MergedPage, Page};
use std::collections::HashMap;

/// Children of a page keyed by normalized name.
///
/// Names that occur more than once are merged into one `MergedPage` at the
/// position of their first occurrence.
#[derive(Debug, Clone, Default)]
pub struct Children {
    entries: Vec<(String, Page)>,
}

impl Children {
    /// Build from raw `traverse` output
    pub fn collect(raw: Vec<(String, Page)>) -> Self {
        let mut entries: Vec<(String, Page)> = Vec::with_capacity(raw.len());
        let mut index: HashMap<String, usize> = HashMap::new();

        for (name, page) in raw {
            let Some(&at) = index.get(&name) else {
                index.insert(name.clone(), entries.len());
                entries.push((name, page));
                continue;
            };

            let existing = &entries[at].1;
            let duplicate = match existing.as_merged() {
                Some(merged) => merged.pages().iter().any(|p| p.same_source(&page)),
                None => existing.same_source(&page),
            };
            if !duplicate {
                let merged = MergedPage::new([existing.clone(), page]);
                entries[at].1 = merged.into();
            }
        }

        Self { entries }
    }

    /// Look up a child by normalized name
    pub fn get(&self, name: &str) -> Option<&Page> {
        self.entries
            .iter()
            .find(|(child, _)| child == name)
            .map(|(_, page)| page)
    }

    /// Child names in discovery order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Page)> {
        self.entries.iter().map(|(name, page)| (name.as_str(), page))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Child pages in discovery order
    pub fn pages(&self) -> Vec<Page> {
        self.entries.iter().map(|(_, page)| page.clone()).collect()
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.entries.into_iter().map(|(_, page)| page).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::VariablePage;

    fn var(name: &str, text: &str) -> Page {
        VariablePage::new(name, text).into()
    }

    #[test]
    fn test_distinct_names_keep_order() {
        let children = Children::collect(vec![
            ("b".to_string(), var("b", "1")),
            ("a".to_string(), var("a", "2")),
        ]);
        assert_eq!(children.names(), vec!["b", "a"]);
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn test_collision_is_merged() {
        let children = Children::collect(vec![
            ("x".to_string(), var("x", "first")),
            ("y".to_string(), var("y", "other")),
            ("x".to_string(), var("X", "second")),
            ("x".to_string(), var("_x", "third")),
        ]);

        assert_eq!(children.names(), vec!["x", "y"]);
        let merged = children.get("x").and_then(Page::as_merged).unwrap();
        assert_eq!(merged.pages().len(), 3);
        assert!(merged.pages().iter().all(|p| p.as_merged().is_none()));
    }

    #[test]
    fn test_get_missing() {
        let children = Children::collect(vec![("x".to_string(), var("x", "1"))]);
        assert!(children.get("y").is_none());
        assert!(!children.is_empty());
        assert!(Children::default().is_empty());
    }
}
