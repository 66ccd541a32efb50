//! ECMAScript parser producing ESTree-shaped syntax trees.
//!
//! The parser enforces the language's early errors (reserved words,
//! redeclarations, invalid destructuring targets and so on) and stops at the
//! first one. Parsing is driven by a [`Context`] describing the goal symbol
//! and the options the caller opted into.
//!
//! ```
//! use esparse::{parse_script, Context};
//!
//! let program = parse_script("let [a, , b] = c;", Context::EMPTY).unwrap();
//! assert_eq!(program.body.len(), 1);
//! ```

pub mod ast;
pub mod context;
pub mod error;
pub mod lexer;
pub mod location;
pub mod parser;

use tracing::debug;

pub use ast::Program;
pub use context::Context;
pub use error::{ErrorKind, ParseError, ParseResult};

/// Parses `source` as a Script. A `MODULE` flag in `context` is ignored.
pub fn parse_script(source: &str, context: Context) -> ParseResult<Program> {
    run(source, context.without(Context::MODULE))
}

/// Parses `source` as a Module, which is always strict.
pub fn parse_module(source: &str, context: Context) -> ParseResult<Program> {
    run(source, context.with(Context::MODULE | Context::STRICT))
}

/// Parses as a Module when `context` has `MODULE`, otherwise as a Script.
pub fn parse(source: &str, context: Context) -> ParseResult<Program> {
    if context.is_module() {
        parse_module(source, context)
    } else {
        parse_script(source, context)
    }
}

fn run(source: &str, context: Context) -> ParseResult<Program> {
    let ctx = context.options();
    debug!(module = ctx.is_module(), strict = ctx.is_strict(), len = source.len(), "parse");
    let result = parser::Parser::new(source, ctx).and_then(|mut parser| parser.parse_program(ctx));
    match &result {
        Ok(program) => debug!(statements = program.body.len(), "parsed"),
        Err(err) => debug!(kind = %err.kind, index = err.index, "rejected"),
    }
    result
}
