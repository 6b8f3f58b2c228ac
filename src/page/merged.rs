use super::{Page, PageKind};
use crate::error::{Error, Result};

/// Union of pages that resolved to the same name at one level.
///
/// Never contains another `MergedPage`: nested merges are absorbed on
/// construction, so merge depth stays at one.
#[derive(Debug, Clone, Default)]
pub struct MergedPage {
    pages: Vec<Page>,
}

impl MergedPage {
    pub fn new(pages: impl IntoIterator<Item = Page>) -> Self {
        let mut flat = Vec::new();
        for page in pages {
            match page.kind {
                PageKind::Merged(merged) => flat.extend(merged.pages),
                _ => flat.push(page),
            }
        }
        Self { pages: flat }
    }

    /// Constituent pages in discovery order
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn name(&self) -> String {
        self.pages.first().map(Page::name).unwrap_or_default()
    }

    /// Text of every readable constituent, separated by a blank line.
    ///
    /// Unreadable constituents are skipped; the merge only fails when none of
    /// them can be read.
    pub fn read(&self) -> Result<String> {
        let mut texts = Vec::new();
        for page in &self.pages {
            match page.read() {
                Ok(text) => texts.push(text.trim_end_matches('\n').to_string()),
                Err(e) => {
                    tracing::debug!(page = %page.name(), error = %e, "skipping unreadable page")
                }
            }
        }

        if texts.is_empty() {
            return Err(Error::unreadable(self.name(), "no readable pages to merge"));
        }
        Ok(texts.join("\n\n"))
    }

    /// Children of every constituent, concatenated
    pub fn traverse(&self) -> Vec<(String, Page)> {
        let mut children = Vec::new();
        for page in &self.pages {
            match page.traverse() {
                Ok(found) => children.extend(found),
                Err(e) => tracing::warn!(page = %page.name(), error = %e, "cannot list children"),
            }
        }
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::page::VariablePage;

    fn var(name: &str, text: &str) -> Page {
        VariablePage::new(name, text).into()
    }

    #[test]
    fn test_read_joins_with_blank_line() {
        let merged = MergedPage::new([var("x", "first\n"), var("x", "second")]);
        assert_eq!(merged.read().unwrap(), "first\n\nsecond");
    }

    #[test]
    fn test_unreadable_constituent_is_skipped() {
        let broken: Page =
            VariablePage::evaluated("x", Err(EvalError::UnknownName("y".to_string()))).into();
        let merged = MergedPage::new([broken, var("x", "works")]);
        assert_eq!(merged.read().unwrap(), "works");
    }

    #[test]
    fn test_all_unreadable_fails() {
        let broken: Page =
            VariablePage::evaluated("x", Err(EvalError::UnknownName("y".to_string()))).into();
        let merged = MergedPage::new([broken]);
        assert!(merged.read().is_err());
        assert!(MergedPage::default().read().is_err());
    }

    #[test]
    fn test_nested_merge_is_flattened() {
        let inner: Page = MergedPage::new([var("x", "a"), var("x", "b")]).into();
        let outer = MergedPage::new([inner, var("x", "c")]);

        assert_eq!(outer.pages().len(), 3);
        assert!(outer.pages().iter().all(|p| p.as_merged().is_none()));
        assert_eq!(outer.read().unwrap(), "a\n\nb\n\nc");
    }

    #[test]
    fn test_leaves_have_no_children() {
        let merged = MergedPage::new([var("x", "a"), var("y", "b")]);
        assert!(merged.traverse().is_empty());
        assert_eq!(merged.name(), "x");
    }
}
