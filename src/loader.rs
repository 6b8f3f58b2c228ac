// Lazy module loading shared by every page of one wiki
//
// Each Python file is parsed at most once. The loader is created by `Wiki`
// and handed to the pages it builds; it is not a process-wide registry.

use crate::error::Result;
use crate::parser::{ParsedModule, PythonParser};
use glob::Pattern;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Parses and caches page modules, and holds directory listing rules
pub struct Loader {
    parser: RefCell<PythonParser>,
    modules: RefCell<HashMap<PathBuf, Rc<ParsedModule>>>,
    in_progress: RefCell<Vec<PathBuf>>,
    ignore: Vec<Pattern>,
}

impl Loader {
    /// Create a loader with no ignore patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: RefCell::new(PythonParser::new()?),
            modules: RefCell::new(HashMap::new()),
            in_progress: RefCell::new(Vec::new()),
            ignore: Vec::new(),
        })
    }

    /// Skip directory entries whose name matches any of `patterns`
    pub fn with_ignore(mut self, patterns: &[String]) -> Result<Self> {
        self.ignore = patterns
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<std::result::Result<_, _>>()?;
        Ok(self)
    }

    /// Check an entry name against the ignore patterns
    pub fn is_ignored(&self, file_name: &str) -> bool {
        self.ignore.iter().any(|p| p.matches(file_name))
    }

    /// Parse `path`, or return the cached module
    pub fn load(&self, path: &Path) -> Result<Rc<ParsedModule>> {
        let key = path.canonicalize()?;
        if let Some(module) = self.modules.borrow().get(&key) {
            return Ok(Rc::clone(module));
        }

        tracing::debug!(path = %key.display(), "parsing page module");
        let module = Rc::new(self.parser.borrow_mut().parse_file(&key)?);
        self.modules.borrow_mut().insert(key, Rc::clone(&module));
        Ok(module)
    }

    /// Number of modules parsed so far
    pub fn cached(&self) -> usize {
        self.modules.borrow().len()
    }

    /// Mark `path` as being traversed.
    ///
    /// Returns `None` if the module is already being traversed further up the
    /// stack, which happens with cyclic re-exports.
    pub fn enter(&self, path: &Path) -> Option<TraversalGuard<'_>> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let mut in_progress = self.in_progress.borrow_mut();
        if in_progress.contains(&key) {
            return None;
        }
        in_progress.push(key.clone());
        Some(TraversalGuard { loader: self, path: key })
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("cached", &self.cached())
            .field("ignore", &self.ignore)
            .finish()
    }
}

/// Clears the in-progress mark of a module when dropped
pub struct TraversalGuard<'a> {
    loader: &'a Loader,
    path: PathBuf,
}

impl Drop for TraversalGuard<'_> {
    fn drop(&mut self) {
        self.loader
            .in_progress
            .borrow_mut()
            .retain(|p| p != &self.path);
    }
}
