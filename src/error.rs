use thiserror::Error;

/// Token-level and reader-level failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParserErrorKind {
    /// End of input where a datum or a closing parenthesis was required
    #[error("unexpected end of input")]
    UnexpectedEOF,
    /// `)` with no matching `(`
    #[error("unexpected token {0}, expected {1}")]
    UnexpectedToken(String, String),
    #[error("invalid string escape `\\{0}`")]
    InvalidStringEscape(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error at {line}:{column}: {kind}")]
pub struct ParserError {
    pub line: usize,
    pub column: usize,
    pub kind: ParserErrorKind,
}

/// Malformed special forms detected by the syntax expander.
///
/// Carries a rendering of the offending form for diagnostics.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("syntax error in `{form}`: {desc}")]
pub struct SyntaxError {
    pub form: String,
    pub desc: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuntimeErrorKind {
    UnboundSymbol,
    InvalidType,
    NumArgs,
    NotApplicable,
    DivideByZero,
    /// An escape procedure was invoked after its `call/cc` returned
    DeadEscape,
    Io,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{desc}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub desc: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, desc: String) -> RuntimeError {
        RuntimeError { kind, desc }
    }

    pub fn unbound_symbol(name: &str) -> RuntimeError {
        RuntimeError::new(
            RuntimeErrorKind::UnboundSymbol,
            format!("unbound symbol `{}`", name),
        )
    }

    pub fn invalid_type(expected: &str, received: &str) -> RuntimeError {
        RuntimeError::new(
            RuntimeErrorKind::InvalidType,
            format!("expected {}, but received {}", expected, received),
        )
    }

    pub fn num_args(expected: usize, received: usize) -> RuntimeError {
        RuntimeError::new(
            RuntimeErrorKind::NumArgs,
            format!("expected {} arguments, received {}", expected, received),
        )
    }

    pub fn at_least_args(expected: usize, received: usize) -> RuntimeError {
        RuntimeError::new(
            RuntimeErrorKind::NumArgs,
            format!("expected at least {} arguments, received {}", expected, received),
        )
    }
}

/// Any failure a top-level evaluation can report
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParserError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
