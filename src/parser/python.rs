// Python parser using tree-sitter

use crate::error::{Error, Result};
use crate::parser::ast::*;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tree_sitter::{Node, Parser};

/// Module-qualified helpers that are called like plain functions
const HELPER_MODULES: &[&str] = &["textwrap", "inspect"];

/// Parser for page-defining Python source files
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::Parser(format!("Failed to set Python language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse a Python file
    pub fn parse_file(&mut self, path: &Path) -> Result<ParsedModule> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;

        self.parse_source(&source, path.to_path_buf())
    }

    /// Parse Python source code
    pub fn parse_source(&mut self, source: &str, path: PathBuf) -> Result<ParsedModule> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::parse(&path, "tree-sitter returned no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            tracing::warn!(path = %path.display(), "syntax errors, some pages may be missing");
        }

        let mut module = ParsedModule::new(path);
        let mut statements = parse_block(&root, source.as_bytes());

        // A leading bare string is the module docstring, not a page
        if let Some(Statement::Expr { value, .. }) = statements.first() {
            if let Some(text) = literal_text(value) {
                module.docstring = Some(text);
                statements.remove(0);
            }
        }

        module.statements = statements;
        Ok(module)
    }
}

/// Text of a plain (non-interpolated) string literal
fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Str(s) => Some(s.clone()),
        Expr::Concat(parts) => parts.iter().map(literal_text).collect(),
        _ => None,
    }
}

fn line_of(node: &Node) -> usize {
    node.start_position().row + 1
}

fn text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Named children, skipping comments
fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Parse every statement of a module or block
fn parse_block(node: &Node, source: &[u8]) -> Vec<Statement> {
    named_children(node)
        .iter()
        .filter_map(|child| parse_statement(child, source))
        .collect()
}

/// Parse one statement. `None` means the statement is silently irrelevant.
fn parse_statement(node: &Node, source: &[u8]) -> Option<Statement> {
    let line = line_of(node);
    let stmt = match node.kind() {
        "function_definition" => Statement::Function(Rc::new(parse_function(node, source, None)?)),
        "decorated_definition" => parse_decorated(node, source)?,
        "import_statement" | "future_import_statement" => Statement::Import { line },
        "import_from_statement" => parse_import_from(node, source),
        "expression_statement" => parse_expression_statement(node, source)?,
        "return_statement" => Statement::Return {
            value: named_children(node).first().map(|expr| parse_expr(expr, source)),
            line,
        },
        "pass_statement" => return None,
        kind => Statement::Other {
            kind: kind.to_string(),
            line,
        },
    };
    Some(stmt)
}

fn parse_expression_statement(node: &Node, source: &[u8]) -> Option<Statement> {
    let line = line_of(node);
    let inner = named_children(node).into_iter().next()?;
    let stmt = match inner.kind() {
        "assignment" => parse_assignment(&inner, source),
        "augmented_assignment" => parse_augmented_assignment(&inner, source),
        _ => Statement::Expr {
            value: parse_expr(&inner, source),
            line,
        },
    };
    Some(stmt)
}

/// Parse `a = b = value`. Anything but plain names on the left is ignored.
fn parse_assignment(node: &Node, source: &[u8]) -> Statement {
    let line = line_of(node);
    let mut targets = Vec::new();
    let mut current = *node;

    loop {
        let Some(left) = current.child_by_field_name("left") else {
            break;
        };
        if left.kind() != "identifier" {
            return Statement::Other {
                kind: format!("assignment to {}", left.kind()),
                line,
            };
        }
        targets.push(text(&left, source).to_string());

        match current.child_by_field_name("right") {
            Some(right) if right.kind() == "assignment" => current = right,
            Some(right) => {
                return Statement::Assign {
                    targets,
                    value: parse_expr(&right, source),
                    line,
                };
            }
            None => break,
        }
    }

    // Annotation without a value, e.g. `x: str`
    Statement::Other {
        kind: "annotation".to_string(),
        line,
    }
}

/// Parse `x += value` as `x = x + value`
fn parse_augmented_assignment(node: &Node, source: &[u8]) -> Statement {
    let line = line_of(node);
    let fields = (
        node.child_by_field_name("left"),
        node.child_by_field_name("operator"),
        node.child_by_field_name("right"),
    );
    match fields {
        (Some(left), Some(operator), Some(right))
            if left.kind() == "identifier" && operator.kind() == "+=" =>
        {
            let name = text(&left, source).to_string();
            Statement::Assign {
                targets: vec![name.clone()],
                value: Expr::BinOp {
                    op: BinOp::Add,
                    left: Box::new(Expr::Name(name)),
                    right: Box::new(parse_expr(&right, source)),
                },
                line,
            }
        }
        _ => Statement::Other {
            kind: "augmented_assignment".to_string(),
            line,
        },
    }
}

/// Parse a decorated function, collecting `@alias` and `@style` metadata
fn parse_decorated(node: &Node, source: &[u8]) -> Option<Statement> {
    let definition = node.child_by_field_name("definition")?;
    if definition.kind() != "function_definition" {
        return Some(Statement::Other {
            kind: definition.kind().to_string(),
            line: line_of(node),
        });
    }

    let decorators: Vec<Node> = named_children(node)
        .into_iter()
        .filter(|child| child.kind() == "decorator")
        .collect();

    let mut func = parse_function(&definition, source, Some(line_of(node)))?;
    for decorator in &decorators {
        apply_decorator(&mut func, decorator, source);
    }
    Some(Statement::Function(Rc::new(func)))
}

fn parse_function(node: &Node, source: &[u8], decorated_at: Option<usize>) -> Option<FunctionDef> {
    let name = node.child_by_field_name("name")?;
    let mut func = FunctionDef::new(text(&name, source), decorated_at.unwrap_or(line_of(node)));
    func.line_end = node.end_position().row + 1;

    if let Some(body) = node.child_by_field_name("body") {
        func.body = parse_block(&body, source);
    }
    Some(func)
}

/// Record page metadata carried by a decorator call
fn apply_decorator(func: &mut FunctionDef, decorator: &Node, source: &[u8]) {
    let Some(call) = named_children(decorator).into_iter().next() else {
        return;
    };
    if call.kind() != "call" {
        return;
    }
    let Some(callee) = call.child_by_field_name("function") else {
        return;
    };
    let callee = text(&callee, source);
    let name = callee.rsplit('.').next().unwrap_or(callee);

    let (positional, keywords) = match call.child_by_field_name("arguments") {
        Some(args) => parse_arguments(&args, source),
        None => return,
    };

    match name {
        "alias" | "aliases" => {
            for arg in &positional {
                match arg {
                    Expr::List(items) => func.aliases.extend(items.iter().filter_map(literal_text)),
                    other => func.aliases.extend(literal_text(other)),
                }
            }
        }
        "style" => {
            func.style.default = positional.first().and_then(literal_text);
            for (language, value) in keywords {
                if let Some(style) = literal_text(&value) {
                    func.style.languages.insert(language, style);
                }
            }
        }
        _ => {}
    }
}

/// Split an argument list into positional and keyword arguments
fn parse_arguments(node: &Node, source: &[u8]) -> (Vec<Expr>, Vec<(String, Expr)>) {
    let mut positional = Vec::new();
    let mut keywords = Vec::new();

    for child in named_children(node) {
        if child.kind() == "keyword_argument" {
            if let (Some(name), Some(value)) = (
                child.child_by_field_name("name"),
                child.child_by_field_name("value"),
            ) {
                keywords.push((text(&name, source).to_string(), parse_expr(&value, source)));
            }
        } else {
            positional.push(parse_expr(&child, source));
        }
    }

    (positional, keywords)
}

/// Parse an import-from statement; relative ones become re-exports
fn parse_import_from(node: &Node, source: &[u8]) -> Statement {
    let line = line_of(node);
    let mut module = None;
    let mut names = Vec::new();
    let mut level = 0;
    let mut wildcard = false;
    let mut seen_import_keyword = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "relative_import" => {
                let mut inner_cursor = child.walk();
                for inner in child.children(&mut inner_cursor) {
                    match inner.kind() {
                        "import_prefix" => {
                            level = text(&inner, source).chars().filter(|c| *c == '.').count();
                        }
                        "dotted_name" => module = Some(text(&inner, source).to_string()),
                        _ => {}
                    }
                }
            }
            "dotted_name" => {
                if seen_import_keyword {
                    names.push(ImportedName::new(text(&child, source)));
                } else {
                    module = Some(text(&child, source).to_string());
                }
            }
            "import" => seen_import_keyword = true,
            "wildcard_import" => wildcard = true,
            "aliased_import" => {
                let name = child.child_by_field_name("name").map(|n| text(&n, source));
                let alias = child.child_by_field_name("alias").map(|n| text(&n, source));
                match (name, alias) {
                    (Some(name), Some(alias)) => names.push(ImportedName::with_alias(name, alias)),
                    (Some(name), None) => names.push(ImportedName::new(name)),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    if level == 0 {
        return Statement::Import { line };
    }

    Statement::ReExport(ReExport {
        level,
        module,
        names,
        wildcard,
        line,
    })
}

/// Lower an expression node into the supported subset
fn parse_expr(node: &Node, source: &[u8]) -> Expr {
    match node.kind() {
        "string" => parse_string(node, source),
        "concatenated_string" => Expr::Concat(
            named_children(node)
                .iter()
                .map(|part| parse_string(part, source))
                .collect(),
        ),
        "integer" => text(node, source)
            .replace('_', "")
            .parse()
            .map(Expr::Int)
            .unwrap_or_else(|_| Expr::Unsupported("integer".to_string())),
        "float" => text(node, source)
            .replace('_', "")
            .parse()
            .map(Expr::Float)
            .unwrap_or_else(|_| Expr::Unsupported("float".to_string())),
        "true" => Expr::Bool(true),
        "false" => Expr::Bool(false),
        "none" => Expr::None,
        "identifier" => Expr::Name(text(node, source).to_string()),
        "parenthesized_expression" => match named_children(node).first() {
            Some(inner) => parse_expr(inner, source),
            None => Expr::Unsupported("parenthesized_expression".to_string()),
        },
        "list" | "tuple" => Expr::List(
            named_children(node)
                .iter()
                .map(|item| parse_expr(item, source))
                .collect(),
        ),
        "binary_operator" => parse_binary(node, source),
        "call" => parse_call(node, source),
        kind => Expr::Unsupported(kind.to_string()),
    }
}

fn parse_binary(node: &Node, source: &[u8]) -> Expr {
    let (Some(left), Some(operator), Some(right)) = (
        node.child_by_field_name("left"),
        node.child_by_field_name("operator"),
        node.child_by_field_name("right"),
    ) else {
        return Expr::Unsupported("binary_operator".to_string());
    };

    let op = match operator.kind() {
        "+" => BinOp::Add,
        "*" => BinOp::Mul,
        other => return Expr::Unsupported(format!("operator {}", other)),
    };

    Expr::BinOp {
        op,
        left: Box::new(parse_expr(&left, source)),
        right: Box::new(parse_expr(&right, source)),
    }
}

fn parse_call(node: &Node, source: &[u8]) -> Expr {
    let Some(function) = node.child_by_field_name("function") else {
        return Expr::Unsupported("call".to_string());
    };
    let args = match node.child_by_field_name("arguments") {
        Some(args) if args.kind() == "argument_list" => parse_arguments(&args, source).0,
        _ => Vec::new(),
    };

    let callee = match function.kind() {
        "identifier" => Callee::Function(text(&function, source).to_string()),
        "attribute" => {
            let (Some(object), Some(attribute)) = (
                function.child_by_field_name("object"),
                function.child_by_field_name("attribute"),
            ) else {
                return Expr::Unsupported("call".to_string());
            };
            let attribute = text(&attribute, source).to_string();
            let object_name = text(&object, source);

            if object.kind() == "identifier" && HELPER_MODULES.contains(&object_name) {
                Callee::Function(format!("{}.{}", object_name, attribute))
            } else {
                Callee::Method {
                    receiver: Box::new(parse_expr(&object, source)),
                    name: attribute,
                }
            }
        }
        other => return Expr::Unsupported(format!("call on {}", other)),
    };

    Expr::Call { callee, args }
}

/// Parse a string literal, including prefixes and f-string fields
fn parse_string(node: &Node, source: &[u8]) -> Expr {
    let mut prefix = String::new();
    let mut saw_start = false;
    let mut parts = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "string_start" => {
                saw_start = true;
                prefix = text(&child, source)
                    .trim_end_matches(['"', '\''])
                    .to_lowercase();
            }
            "string_content" | "escape_sequence" => {
                let raw = prefix.contains('r');
                let fstring = prefix.contains('f');
                parts.push(FStringPart::Literal(decode_literal(
                    text(&child, source),
                    raw,
                    fstring,
                )));
            }
            "interpolation" => {
                let field = match child.child_by_field_name("expression") {
                    Some(expr) => parse_expr(&expr, source),
                    None => Expr::Unsupported("interpolation".to_string()),
                };
                parts.push(FStringPart::Field(field));
            }
            _ => {}
        }
    }

    if !saw_start {
        return parse_string_text(text(node, source));
    }

    if prefix.contains('f') {
        return Expr::FString(parts);
    }

    let literal = parts
        .into_iter()
        .map(|part| match part {
            FStringPart::Literal(s) => s,
            FStringPart::Field(_) => String::new(),
        })
        .collect();
    Expr::Str(literal)
}

/// Parse a string literal from its full source text
fn parse_string_text(literal: &str) -> Expr {
    let quote_at = literal.find(['"', '\'']).unwrap_or(0);
    let (prefix, rest) = literal.split_at(quote_at);
    let prefix = prefix.to_lowercase();

    let body = ["\"\"\"", "'''", "\"", "'"]
        .iter()
        .find_map(|quote| rest.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(rest);

    Expr::Str(decode_literal(body, prefix.contains('r'), prefix.contains('f')))
}

/// Decode escape sequences the way Python does for a non-raw literal
pub(crate) fn decode_literal(body: &str, raw: bool, fstring: bool) -> String {
    let body = if fstring {
        body.replace("{{", "{").replace("}}", "}")
    } else {
        body.to_string()
    };
    if raw {
        return body;
    }

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0C}'),
            Some('v') => out.push('\u{0B}'),
            Some('0') => out.push('\0'),
            Some('\n') => {}
            Some(kind @ ('x' | 'u' | 'U')) => {
                let width = match kind {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let hex: String = chars.by_ref().take(width).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParsedModule {
        let mut parser = PythonParser::new().unwrap();
        parser
            .parse_source(source, PathBuf::from("test.py"))
            .unwrap()
    }

    fn only_function(module: &ParsedModule) -> &FunctionDef {
        let funcs: Vec<_> = module.functions().collect();
        assert_eq!(funcs.len(), 1);
        funcs[0]
    }

    #[test]
    fn test_parser_new() {
        let parser = PythonParser::new();
        assert!(parser.is_ok());
    }

    #[test]
    fn test_empty_file() {
        let module = parse("");
        assert!(module.statements.is_empty());
        assert!(module.docstring.is_none());
    }

    #[test]
    fn test_module_docstring_is_not_a_statement() {
        let module = parse("\"\"\"Module docstring.\"\"\"\nx = 'a'\n");
        assert_eq!(module.docstring, Some("Module docstring.".to_string()));
        assert_eq!(module.statements.len(), 1);
    }

    #[test]
    fn test_simple_assignment() {
        let module = parse("diet = \"## Diet\\n- vegetables\"\n");
        match &module.statements[0] {
            Statement::Assign { targets, value, .. } => {
                assert_eq!(targets, &vec!["diet".to_string()]);
                assert_eq!(value, &Expr::Str("## Diet\n- vegetables".to_string()));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_assignment() {
        let module = parse("a = b = 'x'\n");
        match &module.statements[0] {
            Statement::Assign { targets, .. } => {
                assert_eq!(targets, &vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_augmented_assignment_extends_name() {
        let module = parse("text = 'a'\ntext += 'b'\n");
        match &module.statements[1] {
            Statement::Assign { targets, value: Expr::BinOp { left, .. }, .. } => {
                assert_eq!(targets, &vec!["text".to_string()]);
                assert_eq!(**left, Expr::Name("text".to_string()));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_tuple_assignment_is_other() {
        let module = parse("a, b = 'x', 'y'\n");
        assert!(matches!(module.statements[0], Statement::Other { .. }));
    }

    #[test]
    fn test_imports() {
        let module = parse("import os\nfrom textwrap import dedent\n");
        assert_eq!(module.statements.len(), 2);
        assert!(module
            .statements
            .iter()
            .all(|s| matches!(s, Statement::Import { .. })));
    }

    #[test]
    fn test_relative_import_is_reexport() {
        let module = parse("from ..git import commit as ci, push\n");
        match &module.statements[0] {
            Statement::ReExport(re) => {
                assert_eq!(re.level, 2);
                assert_eq!(re.module.as_deref(), Some("git"));
                assert_eq!(re.names.len(), 2);
                assert_eq!(re.names[0].used_name(), "ci");
                assert_eq!(re.names[1].used_name(), "push");
                assert!(!re.wildcard);
            }
            other => panic!("Expected re-export, got {:?}", other),
        }
    }

    #[test]
    fn test_wildcard_reexport() {
        let module = parse("from .git import *\n");
        match &module.statements[0] {
            Statement::ReExport(re) => assert!(re.wildcard),
            other => panic!("Expected re-export, got {:?}", other),
        }
    }

    #[test]
    fn test_function_body() {
        let module = parse("def git():\n    commit = 'c'\n    return commit\n");
        let func = only_function(&module);
        assert_eq!(func.name, "git");
        assert_eq!(func.body.len(), 2);
        assert_eq!(func.return_expr(), Some(&Expr::Name("commit".to_string())));
    }

    #[test]
    fn test_alias_decorator() {
        let module = parse("@alias('foo', 'bar')\ndef with_alias():\n    return 'x'\n");
        let func = only_function(&module);
        assert_eq!(func.aliases, vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn test_style_decorator() {
        let module = parse("@style('monokai', python='friendly')\ndef styled():\n    pass\n");
        let func = only_function(&module);
        assert_eq!(func.style.default.as_deref(), Some("monokai"));
        assert_eq!(func.style.for_language("python"), Some("friendly"));
        assert!(func.body.is_empty());
    }

    #[test]
    fn test_unknown_decorator_is_ignored() {
        let module = parse("@functools.cache\ndef cached():\n    return 'x'\n");
        let func = only_function(&module);
        assert!(func.aliases.is_empty());
        assert!(func.style.is_empty());
    }

    #[test]
    fn test_class_is_other() {
        let module = parse("class Cheat:\n    pass\n");
        assert!(matches!(&module.statements[0], Statement::Other { kind, .. } if kind == "class_definition"));
    }

    #[test]
    fn test_concatenated_and_binary_strings() {
        let module = parse("a = 'x' 'y'\nb = 'x' + name\n");
        match &module.statements[0] {
            Statement::Assign { value, .. } => assert_eq!(literal_text(value), Some("xy".to_string())),
            other => panic!("Expected assignment, got {:?}", other),
        }
        match &module.statements[1] {
            Statement::Assign { value: Expr::BinOp { op, .. }, .. } => assert_eq!(*op, BinOp::Add),
            other => panic!("Expected binary op, got {:?}", other),
        }
    }

    #[test]
    fn test_fstring_fields() {
        let module = parse("a = f'hello {name}!'\n");
        match &module.statements[0] {
            Statement::Assign { value: Expr::FString(parts), .. } => {
                assert!(parts.contains(&FStringPart::Field(Expr::Name("name".to_string()))));
            }
            other => panic!("Expected f-string, got {:?}", other),
        }
    }

    #[test]
    fn test_helper_module_call() {
        let module = parse("a = textwrap.dedent('x')\nb = a.strip()\n");
        match &module.statements[0] {
            Statement::Assign { value: Expr::Call { callee, .. }, .. } => {
                assert_eq!(callee, &Callee::Function("textwrap.dedent".to_string()));
            }
            other => panic!("Expected call, got {:?}", other),
        }
        match &module.statements[1] {
            Statement::Assign { value: Expr::Call { callee: Callee::Method { name, .. }, .. }, .. } => {
                assert_eq!(name, "strip");
            }
            other => panic!("Expected method call, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_literal() {
        assert_eq!(decode_literal("a\\nb", false, false), "a\nb");
        assert_eq!(decode_literal("a\\nb", true, false), "a\\nb");
        assert_eq!(decode_literal("\\x41\\u00e9", false, false), "Aé");
        assert_eq!(decode_literal("\\d+", false, false), "\\d+");
        assert_eq!(decode_literal("{{x}}", false, true), "{x}");
    }

    #[test]
    fn test_parse_string_text_fallback() {
        assert_eq!(parse_string_text("'''abc'''"), Expr::Str("abc".to_string()));
        assert_eq!(parse_string_text("r'\\n'"), Expr::Str("\\n".to_string()));
    }
}
