// Leaf pages: variables and plain files

use crate::error::{Error, EvalError, Result};
use crate::eval::cleandoc;
use std::fs;
use std::path::{Path, PathBuf};

/// A literal value bound to a name in a module or function body
#[derive(Debug, Clone)]
pub struct VariablePage {
    name: String,
    value: std::result::Result<String, EvalError>,
}

impl VariablePage {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: Ok(value.into()),
        }
    }

    /// Wrap the outcome of evaluating the bound expression.
    ///
    /// A failed evaluation yields a page that exists but is not readable.
    pub fn evaluated(name: &str, value: std::result::Result<String, EvalError>) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw value, before the indentation of source literals is removed
    pub fn value(&self) -> std::result::Result<&str, &EvalError> {
        self.value.as_deref()
    }

    pub fn read(&self) -> Result<String> {
        match &self.value {
            Ok(text) => Ok(cleandoc(text)),
            Err(e) => Err(Error::unreadable(&self.name, e.to_string())),
        }
    }
}

/// A file shown verbatim
#[derive(Debug, Clone)]
pub struct FilePage {
    path: PathBuf,
}

impl FilePage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        file_stem(&self.path)
    }

    pub fn read(&self) -> Result<String> {
        read_file(&self.path)
    }
}

/// A Markdown file
#[derive(Debug, Clone)]
pub struct MarkdownFilePage {
    path: PathBuf,
}

impl MarkdownFilePage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        file_stem(&self.path)
    }

    pub fn read(&self) -> Result<String> {
        read_file(&self.path)
    }
}

pub(super) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}
