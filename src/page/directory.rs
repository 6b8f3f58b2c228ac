use super::{read_from_children, Children, FilePage, MarkdownFilePage, Page, PythonFilePage};
use crate::error::{Error, Result};
use crate::loader::Loader;
use crate::normalize::normalize;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use walkdir::WalkDir;

/// Module whose members are shown as if they lived in the directory itself
pub const PAGES_MODULE: &str = "pages.py";

/// A directory of pages
#[derive(Debug, Clone)]
pub struct DirectoryPage {
    path: PathBuf,
    loader: Rc<Loader>,
}

impl DirectoryPage {
    pub fn new(path: impl Into<PathBuf>, loader: Rc<Loader>) -> Self {
        Self {
            path: path.into(),
            loader,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => self.path.display().to_string(),
        }
    }

    pub fn read(&self) -> Result<String> {
        read_from_children(&self.name(), Children::collect(self.traverse()?))
    }

    /// Entries sorted by file name, hidden and private ones skipped.
    ///
    /// `pages.py` is listed as its own page, immediately followed by its
    /// members.
    pub fn traverse(&self) -> Result<Vec<(String, Page)>> {
        if !self.path.is_dir() {
            return Err(Error::PathNotFound(self.path.clone()));
        }

        let mut children = Vec::new();
        let entries = WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(dir = %self.path.display(), error = %e, "skipping entry");
                    continue;
                }
            };

            let file_name = entry.file_name().to_string_lossy();
            if file_name.starts_with('.') || file_name.starts_with('_') {
                continue;
            }
            if self.loader.is_ignored(&file_name) {
                tracing::debug!(entry = %file_name, "ignored");
                continue;
            }

            let path = entry.into_path();
            let page = self.entry_page(&path);
            let name = normalize(&page.name());
            let augments = path.file_name().is_some_and(|n| n == PAGES_MODULE);
            children.push((name, page.clone()));

            if augments {
                match page.traverse() {
                    Ok(members) => children.extend(members),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "cannot load pages module")
                    }
                }
            }
        }

        Ok(children)
    }

    fn entry_page(&self, path: &Path) -> Page {
        let loader = Rc::clone(&self.loader);
        if path.is_dir() {
            return DirectoryPage::new(path, loader).into();
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") => PythonFilePage::new(path, loader).into(),
            Some("md") => MarkdownFilePage::new(path).into(),
            _ => FilePage::new(path).into(),
        }
    }
}
