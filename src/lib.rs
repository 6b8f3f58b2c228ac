//! Pagewiki - a command-line wiki of cheat-sheet pages
//!
//! Pages come from directories, Markdown and plain files, and Python modules
//! whose functions and assignments become addressable sub-pages. Queries are
//! resolved level by level with normalized names, falling back to a search of
//! all descendants and to fuzzy matching.

pub mod cli;
pub mod config;
pub mod error;
pub mod eval;
pub mod fuzzy;
pub mod loader;
pub mod normalize;
pub mod page;
pub mod parser;
pub mod render;
pub mod search;
pub mod wiki;

// Re-export main types
pub use config::Config;
pub use error::{Error, EvalError, Result};
pub use normalize::normalize;
pub use page::{MergedPage, Page, PageKind};
pub use search::{OnNotFound, SearchOptions};
pub use wiki::{Resolved, Wiki};
