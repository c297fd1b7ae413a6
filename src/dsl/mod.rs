//! Prompt DSL — source text → AST.
//!
//! The grammar embeds blending constructs in otherwise ordinary prompt
//! text: `(x:w)` attention weights, `[a:b:n]` step edits, `[a:b:s1,s2]`
//! interpolations, `[a|b]` alternations, and `$name = ...` declarations.
//! Parsing never needs the step count; everything step-dependent stays
//! symbolic in the AST until the build walks it.

pub mod ast;
pub mod cursor;
pub mod error;
pub mod parser;

pub use ast::*;
pub use error::{CompileError, ErrorKind};

use parser::Parser;

/// The prompt compiler front end.
pub struct Compiler;

impl Compiler {
    /// Parse prompt source into an expression AST.
    pub fn parse(source: &str) -> Result<Expr, CompileError> {
        Parser::new(source).parse()
    }
}
