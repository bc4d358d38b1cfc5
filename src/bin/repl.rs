use std::io::{self, BufRead, Write};

use rispy::parser::Parser;
use rispy::{Datum, Error, Interpreter, ParserErrorKind};

/// Parse every form of the buffered input, or `None` when the reader ran
/// into the end of input with a form still open
fn read_forms(input: &str) -> Result<Option<Vec<Datum>>, Error> {
    let mut parser = Parser::new(input);
    let mut forms = Vec::new();
    loop {
        match parser.parse_datum() {
            Ok(Some(datum)) => forms.push(datum),
            Ok(None) => return Ok(Some(forms)),
            Err(e) if e.kind == ParserErrorKind::UnexpectedEOF => return Ok(None),
            Err(e) => return Err(e.into()),
        }
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = io::stdout().flush();
}

fn main() {
    let mut interp = Interpreter::new();
    let mut input = String::new();

    prompt(">> ");
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        input.push_str(&line);
        input.push('\n');

        match read_forms(&input) {
            // a form is still open, keep reading lines
            Ok(None) => {
                prompt(".. ");
                continue;
            }
            Ok(Some(forms)) => {
                for form in forms {
                    match interp.run_datum(form) {
                        Ok(Datum::Undefined) => (),
                        Ok(value) => println!("{}", value),
                        Err(e) => {
                            println!("error: {}", e);
                            break;
                        }
                    }
                }
            }
            Err(e) => println!("error: {}", e),
        }
        input.clear();
        prompt(">> ");
    }
}
