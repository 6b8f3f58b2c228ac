// Static evaluation of page values
//
// Page sources are never executed. Assignments and return expressions are
// evaluated over the parsed syntax model, resolving names against the
// bindings of the enclosing function and then the module.

use crate::error::EvalError;
use crate::parser::{BinOp, Callee, Expr, FStringPart, FunctionDef, ParsedModule, Statement};
use std::fmt;

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    List(Vec<Value>),
}

impl Value {
    /// Python-style type name, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "str",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::None => "NoneType",
            Value::List(_) => "list",
        }
    }

    /// Text of a value that can be shown as a page
    pub fn into_text(self) -> Result<String, EvalError> {
        match self {
            Value::Str(s) => Ok(s),
            Value::None | Value::List(_) => Err(EvalError::NotText(self.type_name().to_string())),
            other => Ok(other.to_string()),
        }
    }

    fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::None => write!(f, "None"),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(Value::repr).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// Ordered name bindings of a module or function body.
///
/// A name resolves to the latest binding before the point of use, then to the
/// enclosing scope. Later bindings are invisible to earlier ones, so
/// evaluation always terminates.
pub struct Scope<'a> {
    bindings: Vec<(&'a str, &'a Expr)>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    /// Module-level assignments
    pub fn module(module: &'a ParsedModule) -> Self {
        Self {
            bindings: collect_bindings(&module.statements),
            parent: None,
        }
    }

    /// Local assignments of a function, falling back to `parent`
    pub fn function(def: &'a FunctionDef, parent: &'a Scope<'a>) -> Self {
        Self {
            bindings: collect_bindings(&def.body),
            parent: Some(parent),
        }
    }

    /// Evaluate an expression with every binding of this scope visible
    pub fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        self.eval_at(expr, self.bindings.len())
    }

    /// Evaluate the value of the binding at `index`
    pub fn eval_binding(&self, index: usize) -> Result<Value, EvalError> {
        match self.bindings.get(index) {
            Some((_, expr)) => self.eval_at(expr, index),
            None => Err(EvalError::Unsupported(format!("binding #{}", index))),
        }
    }

    /// Bindings in source order
    pub fn bindings(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        self.bindings.iter().enumerate().map(|(i, (name, _))| (i, *name))
    }

    fn lookup(&self, name: &str, before: usize) -> Result<Value, EvalError> {
        let found = self.bindings[..before]
            .iter()
            .rposition(|(bound, _)| *bound == name);

        match (found, self.parent) {
            (Some(index), _) => self.eval_at(self.bindings[index].1, index),
            (None, Some(parent)) => parent.eval(&Expr::Name(name.to_string())),
            (None, None) => Err(EvalError::UnknownName(name.to_string())),
        }
    }

    fn eval_at(&self, expr: &Expr, before: usize) -> Result<Value, EvalError> {
        match expr {
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::FString(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        FStringPart::Literal(s) => out.push_str(s),
                        FStringPart::Field(field) => {
                            out.push_str(&self.eval_at(field, before)?.to_string())
                        }
                    }
                }
                Ok(Value::Str(out))
            }
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::Name(name) => self.lookup(name, before),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval_at(item, before))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    match self.eval_at(part, before)? {
                        Value::Str(s) => out.push_str(&s),
                        other => return Err(EvalError::NotText(other.type_name().to_string())),
                    }
                }
                Ok(Value::Str(out))
            }
            Expr::BinOp { op, left, right } => {
                let left = self.eval_at(left, before)?;
                let right = self.eval_at(right, before)?;
                binary(*op, left, right)
            }
            Expr::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval_at(arg, before))
                    .collect::<Result<Vec<_>, _>>()?;
                match callee {
                    Callee::Function(name) => call_function(name, args),
                    Callee::Method { receiver, name } => {
                        let receiver = self.eval_at(receiver, before)?;
                        call_method(receiver, name, args)
                    }
                }
            }
            Expr::Unsupported(kind) => Err(EvalError::Unsupported(kind.clone())),
        }
    }
}

fn collect_bindings(statements: &[Statement]) -> Vec<(&str, &Expr)> {
    statements
        .iter()
        .flat_map(|stmt| match stmt {
            Statement::Assign { targets, value, .. } => targets
                .iter()
                .map(|target| (target.as_str(), value))
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        })
        .collect()
}

/// Upper bound on text built by repetition
const MAX_REPEAT_LEN: usize = 1 << 20;

fn repeat(s: &str, n: i64) -> Result<Value, EvalError> {
    let times = usize::try_from(n.max(0)).unwrap_or(usize::MAX);
    match s.len().checked_mul(times) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::Str(s.repeat(times))),
        _ => Err(EvalError::Unsupported(format!(
            "string repeated {} times exceeds {} bytes",
            n, MAX_REPEAT_LEN
        ))),
    }
}

fn binary(op: BinOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (BinOp::Add, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
        (BinOp::Add, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (BinOp::Add, Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 + b)),
        (BinOp::Add, Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + b as f64)),
        (BinOp::Add, Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (BinOp::Mul, Value::Str(s), Value::Int(n)) | (BinOp::Mul, Value::Int(n), Value::Str(s)) => {
            repeat(&s, n)
        }
        (BinOp::Mul, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(b))),
        (op, left, right) => Err(EvalError::TypeMismatch {
            op: op.symbol().to_string(),
            left: left.type_name().to_string(),
            right: right.type_name().to_string(),
        }),
    }
}

fn single_str(name: &str, args: Vec<Value>) -> Result<String, EvalError> {
    match <[Value; 1]>::try_from(args) {
        Ok([Value::Str(s)]) => Ok(s),
        _ => Err(EvalError::Unsupported(format!("{}() arguments", name))),
    }
}

fn call_function(name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    match name {
        "dedent" | "textwrap.dedent" => Ok(Value::Str(dedent(&single_str(name, args)?))),
        "cleandoc" | "inspect.cleandoc" => Ok(Value::Str(cleandoc(&single_str(name, args)?))),
        "str" => match <[Value; 1]>::try_from(args) {
            Ok([value]) => Ok(Value::Str(value.to_string())),
            Err(_) => Err(EvalError::Unsupported("str() arguments".to_string())),
        },
        other => Err(EvalError::Unsupported(format!("call to {}()", other))),
    }
}

fn call_method(receiver: Value, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    let s = match receiver {
        Value::Str(s) => s,
        other => {
            return Err(EvalError::Unsupported(format!(
                "{}.{}()",
                other.type_name(),
                name
            )))
        }
    };

    match (name, args.as_slice()) {
        ("strip", []) => Ok(Value::Str(s.trim().to_string())),
        ("lstrip", []) => Ok(Value::Str(s.trim_start().to_string())),
        ("rstrip", []) => Ok(Value::Str(s.trim_end().to_string())),
        ("upper", []) => Ok(Value::Str(s.to_uppercase())),
        ("lower", []) => Ok(Value::Str(s.to_lowercase())),
        ("join", [Value::List(items)]) => {
            let parts = items
                .iter()
                .map(|item| match item {
                    Value::Str(part) => Ok(part.as_str()),
                    other => Err(EvalError::NotText(other.type_name().to_string())),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Str(parts.join(&s)))
        }
        _ => Err(EvalError::Unsupported(format!("str.{}()", name))),
    }
}

/// Remove the whitespace prefix common to every non-blank line
pub fn dedent(text: &str) -> String {
    let margin = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(|common, indent| {
            let shared = common
                .char_indices()
                .zip(indent.chars())
                .find(|((_, a), b)| a != b)
                .map(|((i, _), _)| i)
                .unwrap_or_else(|| common.len().min(indent.len()));
            &common[..shared]
        })
        .unwrap_or("");

    let mut out: Vec<&str> = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(margin).unwrap_or(line)
            }
        })
        .collect();
    if text.ends_with('\n') {
        out.push("");
    }
    out.join("\n")
}

/// Dedent everything after the first line and drop surrounding blank lines
pub fn cleandoc(text: &str) -> String {
    let (first, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first.trim(), dedent(rest)),
        None => (text.trim(), String::new()),
    };

    let lines: Vec<&str> = std::iter::once(first)
        .chain(rest.lines().map(str::trim_end))
        .collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}
