use super::leaf::file_stem;
use super::{read_from_children, Children, DirectoryPage, FunctionPage, Page, VariablePage};
use crate::error::Result;
use crate::eval::{Scope, Value};
use crate::loader::Loader;
use crate::normalize::normalize;
use crate::parser::{ParsedModule, ReExport, Statement};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A page module. Children are its top-level functions, assignments and
/// relative re-exports.
#[derive(Debug, Clone)]
pub struct PythonFilePage {
    path: PathBuf,
    loader: Rc<Loader>,
}

impl PythonFilePage {
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
        file_stem(&self.path)
    }

    pub fn read(&self) -> Result<String> {
        read_from_children(&self.name(), Children::collect(self.traverse()?))
    }

    pub fn traverse(&self) -> Result<Vec<(String, Page)>> {
        let module = self.loader.load(&self.path)?;
        let Some(_guard) = self.loader.enter(&self.path) else {
            tracing::warn!(path = %self.path.display(), "cyclic re-export, skipping module");
            return Ok(Vec::new());
        };

        let globals = Scope::module(&module);
        let mut children = Vec::new();
        let mut binding = 0;

        for stmt in &module.statements {
            match stmt {
                Statement::Function(def) => {
                    let page = FunctionPage::new(Rc::clone(def), Rc::clone(&module));
                    children.push((normalize(&def.name), page.clone().into()));
                    for alias in &def.aliases {
                        children.push((normalize(alias), page.clone().into()));
                    }
                }
                Statement::Assign { targets, .. } => {
                    for target in targets {
                        let value = globals.eval_binding(binding).and_then(Value::into_text);
                        binding += 1;
                        children.push((normalize(target), VariablePage::evaluated(target, value).into()));
                    }
                }
                Statement::ReExport(export) => children.extend(self.re_export(&module, export)),
                Statement::Import { .. } | Statement::Docstring(_) => {}
                Statement::Expr { line, .. } | Statement::Return { line, .. } => {
                    tracing::warn!(path = %self.path.display(), line, "ignoring top-level expression");
                }
                Statement::Other { kind, line } => {
                    tracing::warn!(path = %self.path.display(), line, kind = %kind, "ignoring statement");
                }
            }
        }

        Ok(children)
    }

    /// Pages exposed by one `from .x import ...` statement
    fn re_export(&self, module: &ParsedModule, export: &ReExport) -> Vec<(String, Page)> {
        let Some(base) = ancestor(&module.path, export.level) else {
            tracing::warn!(line = export.line, "relative import goes above the wiki root");
            return Vec::new();
        };

        let target = match &export.module {
            Some(dotted) => {
                let relative: PathBuf = dotted.split('.').collect();
                match self.sibling(&base.join(relative)) {
                    Some(page) => page,
                    None => {
                        tracing::warn!(
                            path = %self.path.display(),
                            line = export.line,
                            module = %dotted,
                            "cannot resolve re-exported module"
                        );
                        return Vec::new();
                    }
                }
            }
            None => {
                return export
                    .names
                    .iter()
                    .filter_map(|name| {
                        let page = self.sibling(&base.join(&name.name));
                        if page.is_none() {
                            tracing::warn!(line = export.line, name = %name.name, "cannot resolve re-exported page");
                        }
                        Some((normalize(name.used_name()), page?))
                    })
                    .collect();
            }
        };

        let children = match target.children() {
            Ok(children) => children,
            Err(e) => {
                tracing::warn!(line = export.line, error = %e, "cannot read re-exported module");
                return Vec::new();
            }
        };

        if export.wildcard {
            return children
                .iter()
                .map(|(name, page)| (name.to_string(), page.clone()))
                .collect();
        }

        export
            .names
            .iter()
            .filter_map(|name| match children.get(&normalize(&name.name)) {
                Some(page) => Some((normalize(name.used_name()), page.clone())),
                None => {
                    tracing::warn!(line = export.line, name = %name.name, "re-exported name not found");
                    None
                }
            })
            .collect()
    }

    /// Page for `path` without extension: a `.py` module or a directory.
    ///
    /// Directories containing this module are refused, their traversal would
    /// come back here.
    fn sibling(&self, path: &Path) -> Option<Page> {
        let module = path.with_extension("py");
        if module.is_file() {
            return Some(PythonFilePage::new(module, Rc::clone(&self.loader)).into());
        }
        if path.is_dir() && !self.is_inside(path) {
            return Some(DirectoryPage::new(path, Rc::clone(&self.loader)).into());
        }
        None
    }

    fn is_inside(&self, dir: &Path) -> bool {
        match (self.path.canonicalize(), dir.canonicalize()) {
            (Ok(own), Ok(dir)) => own.starts_with(dir),
            _ => self.path.starts_with(dir),
        }
    }
}

/// Directory that `level` leading dots refer to, relative to `file`
fn ancestor(file: &Path, level: usize) -> Option<PathBuf> {
    let mut dir = file.parent()?;
    for _ in 1..level {
        dir = dir.parent()?;
    }
    Some(dir.to_path_buf())
}
