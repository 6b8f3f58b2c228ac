// Page tree
//
// Every content source (variable, function, file, module, directory) is a
// `Page`. Composite pages discover their children lazily on `traverse`;
// children that collide on their normalized name are merged, never dropped.

mod children;
mod directory;
mod function;
mod leaf;
mod merged;
mod python_file;

pub use children::Children;
pub use directory::DirectoryPage;
pub use function::FunctionPage;
pub use leaf::{FilePage, MarkdownFilePage, VariablePage};
pub use merged::MergedPage;
pub use python_file::PythonFilePage;

use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::parser::PageStyle;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};

/// The concrete source behind a page
#[derive(Debug, Clone)]
pub enum PageKind {
    Variable(VariablePage),
    Function(FunctionPage),
    File(FilePage),
    Markdown(MarkdownFilePage),
    PythonFile(PythonFilePage),
    Directory(DirectoryPage),
    Merged(MergedPage),
}

/// An addressable, readable unit of content
#[derive(Debug, Clone)]
pub struct Page {
    kind: PageKind,
    readable: OnceCell<bool>,
}

impl Page {
    pub fn new(kind: PageKind) -> Self {
        Self {
            kind,
            readable: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> &PageKind {
        &self.kind
    }

    /// Display name, before normalization
    pub fn name(&self) -> String {
        match &self.kind {
            PageKind::Variable(p) => p.name().to_string(),
            PageKind::Function(p) => p.name().to_string(),
            PageKind::File(p) => p.name(),
            PageKind::Markdown(p) => p.name(),
            PageKind::PythonFile(p) => p.name(),
            PageKind::Directory(p) => p.name(),
            PageKind::Merged(p) => p.name(),
        }
    }

    /// Produce the page text
    pub fn read(&self) -> Result<String> {
        match &self.kind {
            PageKind::Variable(p) => p.read(),
            PageKind::Function(p) => p.read(),
            PageKind::File(p) => p.read(),
            PageKind::Markdown(p) => p.read(),
            PageKind::PythonFile(p) => p.read(),
            PageKind::Directory(p) => p.read(),
            PageKind::Merged(p) => p.read(),
        }
    }

    /// Whether `read` succeeds. Computed on first use.
    pub fn readable(&self) -> bool {
        *self.readable.get_or_init(|| match self.read() {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(page = %self.name(), error = %e, "page is not readable");
                false
            }
        })
    }

    /// Immediate children as discovered, duplicates included
    pub fn traverse(&self) -> Result<Vec<(String, Page)>> {
        match &self.kind {
            PageKind::Variable(_) | PageKind::File(_) | PageKind::Markdown(_) => Ok(Vec::new()),
            PageKind::Function(p) => Ok(p.traverse()),
            PageKind::PythonFile(p) => p.traverse(),
            PageKind::Directory(p) => p.traverse(),
            PageKind::Merged(p) => Ok(p.traverse()),
        }
    }

    /// Immediate children with name collisions merged
    pub fn children(&self) -> Result<Children> {
        Ok(Children::collect(self.traverse()?))
    }

    /// Whether the page can have children at all
    pub fn is_composite(&self) -> bool {
        !matches!(
            self.kind,
            PageKind::Variable(_) | PageKind::File(_) | PageKind::Markdown(_)
        )
    }

    /// Distinct child names, in discovery order
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.children()?.names())
    }

    /// Highlighting style of the function behind this page, if any
    pub fn style(&self) -> Option<&PageStyle> {
        match &self.kind {
            PageKind::Function(p) => Some(p.style()),
            PageKind::Merged(p) => p.pages().iter().find_map(Page::style),
            _ => None,
        }
    }

    /// File or directory the page was discovered in
    pub fn location(&self) -> Option<&Path> {
        match &self.kind {
            PageKind::Variable(_) => None,
            PageKind::Function(p) => Some(p.path()),
            PageKind::File(p) => Some(p.path()),
            PageKind::Markdown(p) => Some(p.path()),
            PageKind::PythonFile(p) => Some(p.path()),
            PageKind::Directory(p) => Some(p.path()),
            PageKind::Merged(p) => p.pages().first().and_then(Page::location),
        }
    }

    /// Canonical path of a module or directory page.
    ///
    /// Re-exports can make the same module reachable from inside itself, so
    /// walks over the whole tree expand each of these sources once.
    pub fn expansion_key(&self) -> Option<PathBuf> {
        let path = match &self.kind {
            PageKind::PythonFile(p) => p.path(),
            PageKind::Directory(p) => p.path(),
            _ => return None,
        };
        Some(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()))
    }

    pub fn as_function(&self) -> Option<&FunctionPage> {
        match &self.kind {
            PageKind::Function(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_merged(&self) -> Option<&MergedPage> {
        match &self.kind {
            PageKind::Merged(p) => Some(p),
            _ => None,
        }
    }

    /// Whether two pages are backed by the same source
    pub fn same_source(&self, other: &Page) -> bool {
        match (&self.kind, &other.kind) {
            (PageKind::Function(a), PageKind::Function(b)) => a.same_function(b),
            (PageKind::File(a), PageKind::File(b)) => a.path() == b.path(),
            (PageKind::Markdown(a), PageKind::Markdown(b)) => a.path() == b.path(),
            (PageKind::PythonFile(a), PageKind::PythonFile(b)) => a.path() == b.path(),
            (PageKind::Directory(a), PageKind::Directory(b)) => a.path() == b.path(),
            _ => false,
        }
    }
}

macro_rules! impl_from_kind {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Page {
                fn from(page: $ty) -> Self {
                    Page::new(PageKind::$variant(page))
                }
            }
        )*
    };
}

impl_from_kind!(
    Variable(VariablePage),
    Function(FunctionPage),
    File(FilePage),
    Markdown(MarkdownFilePage),
    PythonFile(PythonFilePage),
    Directory(DirectoryPage),
    Merged(MergedPage),
);

/// Read a composite page that has no text of its own.
///
/// Delegates to the child named like the page itself when there is one,
/// otherwise merges every readable child.
fn read_from_children(name: &str, children: Children) -> Result<String> {
    if let Some(own) = children.get(&normalize(name)) {
        return own.read();
    }
    if children.is_empty() {
        return Err(Error::unreadable(name, "page has no content"));
    }
    MergedPage::new(children.into_pages()).read()
}
