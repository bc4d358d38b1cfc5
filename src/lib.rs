//! rispy is a small Scheme-family interpreter
//!
//! Source text is read into a [`Datum`] tree, rewritten into a canonical
//! core form by the syntax expander (resolving special forms, quasiquote
//! and user macros), and evaluated by a recursive tree walk over chained
//! environment frames. `call/cc` is provided as a one-shot escape
//! continuation bounded by its dynamic extent.
//!
//! ```
//! use rispy::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! let val = interp.run("(begin (define (cube x) (* x x x)) (cube 10))").unwrap();
//! assert_eq!(format!("{}", val), "1000");
//! ```

macro_rules! list {
    ($($x:expr),* $(,)?) => (
        $crate::datum::Datum::list(vec![$($x),*])
    )
}

macro_rules! sym {
    ($e:expr) => (
        $crate::datum::Datum::sym($e)
    )
}

macro_rules! num {
    ($e:expr) => (
        $crate::datum::Datum::Num($crate::number::Number::Int($e))
    )
}

/// Error values returned from the reader, the expander or the evaluator
pub mod error;
/// Basic datum types
pub mod datum;
/// Token stream over source text
pub mod lexer;
/// Reader building datum trees out of tokens
pub mod parser;
/// Int/Float/Complex scalars and their coercion rules
pub mod number;
/// Syntax expander rewriting parsed trees into the canonical core form
pub mod expander;
/// Tree-walking evaluator, environments and the interpreter context
pub mod runtime;
/// Primitive procedures of the base library
pub mod primitive;
/// The global environment
pub mod base;

pub use datum::{Datum, DatumType};
pub use error::{Error, ParserError, ParserErrorKind, RuntimeError, RuntimeErrorKind, SyntaxError};
pub use number::Number;
pub use runtime::{Env, Interpreter, Procedure};
