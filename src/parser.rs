use std::sync::LazyLock;

use regex::Regex;

use crate::datum::Datum;
use crate::error::{ParserError, ParserErrorKind};
use crate::lexer::{Lexer, Token, TokenWrapper};
use crate::number::Number;

/// Parser reads a token stream into a Datum
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    token_buf: Option<TokenWrapper>,
}

fn unexpected_token(tok: &TokenWrapper, expected: &str) -> ParserError {
    ParserError {
        line: tok.line,
        column: tok.column,
        kind: ParserErrorKind::UnexpectedToken(format!("{:?}", tok.token), expected.to_string()),
    }
}

//                                     real part                            imaginary part, sign required
static COMPLEX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)([+-](?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)i$")
        .expect("complex literal pattern")
});

fn parse_complex(text: &str) -> Option<Number> {
    let caps = COMPLEX_PATTERN.captures(text)?;
    let re = caps[1].parse::<f64>().ok()?;
    let im = caps[2].parse::<f64>().ok()?;
    Some(Number::complex(re, im))
}

/// Classify raw atom text into a typed scalar.
///
/// Representations are tried in a fixed order: boolean, integer, float,
/// complex; whatever matches nothing becomes a symbol. Float and complex
/// forms are only attempted on text containing a digit, so that names
/// like `inf` stay symbols.
pub fn classify(text: &str) -> Datum {
    match text {
        "#t" => Datum::Bool(true),
        "#f" => Datum::Bool(false),
        _ => {
            if let Ok(n) = text.parse::<i64>() {
                return Datum::Num(Number::Int(n));
            }
            if text.bytes().any(|b| b.is_ascii_digit()) {
                if let Ok(f) = text.parse::<f64>() {
                    return Datum::Num(Number::Float(f));
                }
                if let Some(c) = parse_complex(text) {
                    return Datum::Num(c);
                }
            }
            Datum::sym(text)
        }
    }
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Parser<'a> {
        Parser {
            lexer: Lexer::new(source),
            token_buf: None,
        }
    }

    /// Parse the next datum, or `None` at a clean end of input
    pub fn parse_datum(&mut self) -> Result<Option<Datum>, ParserError> {
        let tok = self.consume_token()?;
        if tok.token == Token::EOF {
            Ok(None)
        } else {
            self.parse_form(tok).map(Some)
        }
    }

    /// Parse the next datum, treating end of input as an error
    pub fn parse_required(&mut self) -> Result<Datum, ParserError> {
        let tok = self.consume_token()?;
        self.parse_form(tok)
    }

    fn parse_form(&mut self, tok: TokenWrapper) -> Result<Datum, ParserError> {
        match tok.token {
            Token::OpenParen => self.parse_list(),
            Token::CloseParen => Err(unexpected_token(&tok, "datum")),
            Token::EOF => Err(ParserError {
                line: tok.line,
                column: tok.column,
                kind: ParserErrorKind::UnexpectedEOF,
            }),
            Token::Str(s) => Ok(Datum::string(&s)),
            Token::Atom(s) => Ok(classify(&s)),
            Token::Quote => self.parse_quoted("quote"),
            Token::QuasiQuote => self.parse_quoted("quasiquote"),
            Token::Unquote => self.parse_quoted("unquote"),
            Token::UnquoteSplicing => self.parse_quoted("unquote-splicing"),
        }
    }

    /// A quote shorthand wraps exactly one following form
    fn parse_quoted(&mut self, name: &'static str) -> Result<Datum, ParserError> {
        let quoted = self.parse_required()?;
        Ok(list![sym!(name), quoted])
    }

    fn parse_list(&mut self) -> Result<Datum, ParserError> {
        let mut elems = Vec::new();
        loop {
            let tok = self.consume_token()?;
            match tok.token {
                Token::CloseParen => return Ok(Datum::list(elems)),
                // end of input with the list still open
                Token::EOF => {
                    return Err(ParserError {
                        line: tok.line,
                        column: tok.column,
                        kind: ParserErrorKind::UnexpectedEOF,
                    })
                }
                _ => elems.push(self.parse_form(tok)?),
            }
        }
    }

    fn consume_token(&mut self) -> Result<TokenWrapper, ParserError> {
        match self.token_buf.take() {
            Some(t) => Ok(t),
            None => self.lexer.lex_token(),
        }
    }
}
