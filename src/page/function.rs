use super::{read_from_children, Page, VariablePage};
use crate::error::{Error, Result};
use crate::eval::{cleandoc, Scope, Value};
use crate::normalize::normalize;
use crate::parser::{FunctionDef, PageStyle, ParsedModule, Statement};
use std::path::Path;
use std::rc::Rc;

/// A page-defining function.
///
/// Its text is the value of its `return` expression. Its children are the
/// local assignments of its body, plus one page named after the function for
/// a bare value statement or the returned value.
#[derive(Debug, Clone)]
pub struct FunctionPage {
    def: Rc<FunctionDef>,
    module: Rc<ParsedModule>,
}

impl FunctionPage {
    pub fn new(def: Rc<FunctionDef>, module: Rc<ParsedModule>) -> Self {
        Self { def, module }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn def(&self) -> &Rc<FunctionDef> {
        &self.def
    }

    /// Source file defining the function
    pub fn path(&self) -> &Path {
        &self.module.path
    }

    pub fn style(&self) -> &PageStyle {
        &self.def.style
    }

    pub fn aliases(&self) -> &[String] {
        &self.def.aliases
    }

    /// Whether both pages wrap the same definition
    pub fn same_function(&self, other: &FunctionPage) -> bool {
        Rc::ptr_eq(&self.def, &other.def)
    }

    pub fn read(&self) -> Result<String> {
        let globals = Scope::module(&self.module);
        let locals = Scope::function(&self.def, &globals);

        if let Some(expr) = self.def.return_expr() {
            match locals.eval(expr).map_err(|e| Error::unreadable(self.name(), e.to_string()))? {
                Value::None => {}
                value => {
                    let text = value
                        .into_text()
                        .map_err(|e| Error::unreadable(self.name(), e.to_string()))?;
                    return Ok(cleandoc(&text));
                }
            }
        }

        read_from_children(self.name(), Page::from(self.clone()).children()?)
    }

    pub fn traverse(&self) -> Vec<(String, Page)> {
        let globals = Scope::module(&self.module);
        let locals = Scope::function(&self.def, &globals);
        let own_name = normalize(self.name());

        let mut children = Vec::new();
        // Local bindings are numbered in statement order
        let mut binding = 0;

        for stmt in &self.def.body {
            match stmt {
                Statement::Assign { targets, .. } => {
                    for target in targets {
                        let value = locals.eval_binding(binding).and_then(Value::into_text);
                        binding += 1;
                        children.push((normalize(target), VariablePage::evaluated(target, value).into()));
                    }
                }
                Statement::Expr { value, .. }
                | Statement::Return {
                    value: Some(value), ..
                } => {
                    let value = match locals.eval(value) {
                        Ok(Value::None) => continue,
                        evaluated => evaluated.and_then(Value::into_text),
                    };
                    children.push((
                        own_name.clone(),
                        VariablePage::evaluated(self.name(), value).into(),
                    ));
                }
                _ => {}
            }
        }

        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PythonParser;
    use std::path::PathBuf;

    fn function_page(source: &str, name: &str) -> FunctionPage {
        let module = Rc::new(
            PythonParser::new()
                .unwrap()
                .parse_source(source, PathBuf::from("pages.py"))
                .unwrap(),
        );
        let def = Rc::clone(module.function(name).unwrap());
        FunctionPage::new(def, module)
    }

    fn child_names(page: &FunctionPage) -> Vec<String> {
        page.traverse().into_iter().map(|(name, _)| name).collect()
    }

    #[test]
    fn test_read_returns_value() {
        let page = function_page("def git():\n    return 'git help'\n", "git");
        assert_eq!(page.read().unwrap(), "git help");
    }

    #[test]
    fn test_read_resolves_locals() {
        let source = "def git():\n    commit = 'git commit'\n    return commit + ' -m'\n";
        let page = function_page(source, "git");
        assert_eq!(page.read().unwrap(), "git commit -m");
    }

    #[test]
    fn test_no_return_delegates_to_self_named_child() {
        let source = "def only_down():\n    _only_down = 'leaf'\n";
        let page = function_page(source, "only_down");
        assert_eq!(page.read().unwrap(), "leaf");
    }

    #[test]
    fn test_no_return_merges_all_children() {
        let source = "def no_return():\n    diet = '## Diet'\n    sleep = '## Sleep'\n";
        let page = function_page(source, "no_return");
        assert_eq!(page.read().unwrap(), "## Diet\n\n## Sleep");
    }

    #[test]
    fn test_return_none_falls_back() {
        let source = "def quiet():\n    text = 'fallback'\n    return None\n";
        let page = function_page(source, "quiet");
        assert_eq!(page.read().unwrap(), "fallback");
    }

    #[test]
    fn test_traverse_locals_and_default() {
        let source = "def git():\n    '''Git cheats'''\n    commit = 'c'\n    push = 'p'\n    return commit\n";
        let page = function_page(source, "git");
        assert_eq!(child_names(&page), vec!["git", "commit", "push", "git"]);
    }

    #[test]
    fn test_unreadable_return() {
        let page = function_page("def broken():\n    return missing\n", "broken");
        let err = page.read().unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_empty_function_is_unreadable() {
        let page = function_page("def empty():\n    pass\n", "empty");
        assert!(page.read().is_err());
        assert!(page.traverse().is_empty());
    }
}
