// Owned syntax model for page-defining Python sources
//
// tree-sitter trees borrow their source text, so the parser lowers them into
// these types once per file. Only the constructs that matter for page
// discovery are kept; everything else becomes `Statement::Other`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

/// A parsed Python module
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedModule {
    /// File the module was read from
    pub path: PathBuf,
    /// Module-level docstring
    pub docstring: Option<String>,
    /// Top-level statements in source order (docstring excluded)
    pub statements: Vec<Statement>,
}

impl ParsedModule {
    /// Create an empty module for `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            docstring: None,
            statements: Vec::new(),
        }
    }

    /// Top-level function definitions
    pub fn functions(&self) -> impl Iterator<Item = &Rc<FunctionDef>> {
        self.statements.iter().filter_map(|stmt| match stmt {
            Statement::Function(def) => Some(def),
            _ => None,
        })
    }

    /// Look up a top-level function by its exact name
    pub fn function(&self, name: &str) -> Option<&Rc<FunctionDef>> {
        self.functions().find(|def| def.name == name)
    }
}

/// One statement of a module or function body
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `def name(...): ...`, possibly decorated
    Function(Rc<FunctionDef>),
    /// `a = b = value`
    Assign {
        targets: Vec<String>,
        value: Expr,
        line: usize,
    },
    /// An absolute `import x` / `from x import y`
    Import { line: usize },
    /// A relative `from .x import y`, which re-exports pages
    ReExport(ReExport),
    /// The module docstring
    Docstring(String),
    /// A bare expression, e.g. a string in a function body
    Expr { value: Expr, line: usize },
    /// `return value`
    Return { value: Option<Expr>, line: usize },
    /// Anything the page model has no use for
    Other { kind: String, line: usize },
}

/// A function definition together with its page metadata
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Extra names registered with `@alias(...)`
    pub aliases: Vec<String>,
    /// Highlighting styles registered with `@style(...)`
    pub style: PageStyle,
    /// Body statements
    pub body: Vec<Statement>,
    /// Starting line number
    pub line_start: usize,
    /// Ending line number
    pub line_end: usize,
}

impl FunctionDef {
    pub fn new(name: &str, line_start: usize) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            style: PageStyle::default(),
            body: Vec::new(),
            line_start,
            line_end: line_start,
        }
    }

    /// Expression of the first top-level `return`, if any
    pub fn return_expr(&self) -> Option<&Expr> {
        self.body.iter().find_map(|stmt| match stmt {
            Statement::Return { value, .. } => Some(value.as_ref()),
            _ => None,
        })?
    }
}

/// Highlighting style attached to a page function
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStyle {
    /// Style used when no language override applies
    pub default: Option<String>,
    /// Per-language overrides, keyed by language name
    pub languages: BTreeMap<String, String>,
}

impl PageStyle {
    /// Style for a given code block language
    pub fn for_language(&self, language: &str) -> Option<&str> {
        self.languages
            .get(language)
            .or(self.default.as_ref())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.languages.is_empty()
    }
}

/// A relative import that exposes pages from a sibling module
#[derive(Debug, Clone, PartialEq)]
pub struct ReExport {
    /// Number of leading dots
    pub level: usize,
    /// Dotted module after the dots (`None` for `from . import x`)
    pub module: Option<String>,
    /// Imported names
    pub names: Vec<ImportedName>,
    /// `from .x import *`
    pub wildcard: bool,
    /// Line number
    pub line: usize,
}

/// A single imported name with optional alias
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedName {
    /// Original name
    pub name: String,
    /// Alias (from `as` clause)
    pub alias: Option<String>,
}

impl ImportedName {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
        }
    }

    pub fn with_alias(name: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: Some(alias.to_string()),
        }
    }

    /// Get the name as used in code (alias if present, otherwise original)
    pub fn used_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// The subset of Python expressions the evaluator understands
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    FString(Vec<FStringPart>),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    Name(String),
    List(Vec<Expr>),
    /// Implicit concatenation of adjacent string literals
    Concat(Vec<Expr>),
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: Callee,
        args: Vec<Expr>,
    },
    /// Node kind of an expression outside the supported subset
    Unsupported(String),
}

/// Piece of an f-string
#[derive(Debug, Clone, PartialEq)]
pub enum FStringPart {
    Literal(String),
    Field(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Mul,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Mul => "*",
        }
    }
}

/// Target of a call expression
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// A plain or module-qualified function, e.g. `dedent` or `textwrap.dedent`
    Function(String),
    /// A method called on a value, e.g. `text.strip()`
    Method { receiver: Box<Expr>, name: String },
}
