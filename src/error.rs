use std::path::PathBuf;
use thiserror::Error;

/// Pagewiki error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Page '{page}' is not readable: {reason}")]
    Unreadable { page: String, reason: String },

    #[error("Page not found: {query}")]
    PageNotFound {
        query: String,
        suggestions: Vec<String>,
    },

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),
}

/// Result type alias for Pagewiki operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to statically evaluate a page value.
///
/// Kept separate from [`Error`] because variable pages store their evaluation
/// outcome and must stay cheap to clone.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    UnknownName(String),

    #[error("unsupported expression: {0}")]
    Unsupported(String),

    #[error("cannot apply '{op}' to {left} and {right}")]
    TypeMismatch {
        op: String,
        left: String,
        right: String,
    },

    #[error("value of type {0} has no text")]
    NotText(String),
}

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Error::Parser(msg.into())
    }

    /// Create an unreadable-page error
    pub fn unreadable(page: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Unreadable {
            page: page.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error carrying "did you mean" candidates
    pub fn page_not_found(query: impl Into<String>, suggestions: Vec<String>) -> Self {
        Error::PageNotFound {
            query: query.into(),
            suggestions,
        }
    }
}
