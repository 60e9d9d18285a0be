//! Roux surface parser.
//!
//! Consumes *preprocessed* unit text (keywords substituted, annotations
//! stripped, `?` sites expanded) and produces the shallow syntax tree the
//! lowering passes rewrite. Parse failures are unit-level hard errors.

pub mod ast;
pub mod parser;

pub use ast::Module;
pub use parser::{ParseError, parse};
