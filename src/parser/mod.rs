// Parser module for extracting page sources from Python files

pub mod ast;
mod python;

pub use ast::*;
pub use python::PythonParser;
