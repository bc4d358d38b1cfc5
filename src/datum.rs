use std::fmt;
use std::rc::Rc;

use crate::number::Number;
use crate::runtime::Procedure;

/// Datum is the primary data type of the interpreter.
///
/// The same representation serves as the abstract syntax tree and as the
/// runtime list type; `quote` simply hands a subtree back as data.
#[derive(Clone)]
pub enum Datum {
    /// `#t` or `#f`
    Bool(bool),
    /// Numeric scalar
    Num(Number),
    /// String literal
    Str(Rc<str>),
    /// Identifier, compared by name text
    Sym(Rc<str>),
    /// Ordered sequence, `()` included
    List(Rc<Vec<Datum>>),
    /// Callable value
    Proc(Procedure),
    /// The value of forms that return nothing useful, such as `define`
    Undefined,
}

/// Type tags of [`Datum`], used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatumType {
    Bool,
    Num,
    String,
    Sym,
    List,
    Proc,
    Undefined,
}

impl DatumType {
    pub fn of(datum: &Datum) -> DatumType {
        match datum {
            Datum::Bool(_) => DatumType::Bool,
            Datum::Num(_) => DatumType::Num,
            Datum::Str(_) => DatumType::String,
            Datum::Sym(_) => DatumType::Sym,
            Datum::List(_) => DatumType::List,
            Datum::Proc(_) => DatumType::Proc,
            Datum::Undefined => DatumType::Undefined,
        }
    }
}

impl Datum {
    pub fn sym(name: &str) -> Datum {
        Datum::Sym(Rc::from(name))
    }

    pub fn string(text: &str) -> Datum {
        Datum::Str(Rc::from(text))
    }

    pub fn list(elems: Vec<Datum>) -> Datum {
        Datum::List(Rc::new(elems))
    }

    pub fn nil() -> Datum {
        Datum::List(Rc::new(Vec::new()))
    }

    /// `#t` for `()`
    pub fn is_nil(&self) -> bool {
        matches!(self, Datum::List(l) if l.is_empty())
    }

    pub fn as_sym(&self) -> Option<&Rc<str>> {
        match self {
            Datum::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Datum]> {
        match self {
            Datum::List(l) => Some(l),
            _ => None,
        }
    }

    /// Render the type tag for an error message
    pub fn type_name(&self) -> String {
        format!("{:?}", DatumType::of(self))
    }
}

impl PartialEq for Datum {
    fn eq(&self, rhs: &Datum) -> bool {
        match (self, rhs) {
            (Datum::Bool(l), Datum::Bool(r)) => l == r,
            (Datum::Num(l), Datum::Num(r)) => l == r,
            (Datum::Str(l), Datum::Str(r)) => l == r,
            (Datum::Sym(l), Datum::Sym(r)) => l == r,
            (Datum::List(l), Datum::List(r)) => l == r,
            (Datum::Proc(l), Datum::Proc(r)) => l == r,
            (Datum::Undefined, Datum::Undefined) => true,
            _ => false,
        }
    }
}

fn write_list(f: &mut fmt::Formatter, elems: &[Datum], write_form: bool) -> fmt::Result {
    // `(quote x)` prints in its shorthand form
    if elems.len() == 2 {
        if let Datum::Sym(s) = &elems[0] {
            if &**s == "quote" {
                write!(f, "'")?;
                return write_datum(f, &elems[1], write_form);
            }
        }
    }

    write!(f, "(")?;
    for (i, d) in elems.iter().enumerate() {
        if i != 0 {
            write!(f, " ")?;
        }
        write_datum(f, d, write_form)?;
    }
    write!(f, ")")
}

fn write_string_escaped(f: &mut fmt::Formatter, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            _ => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

fn write_datum(f: &mut fmt::Formatter, datum: &Datum, write_form: bool) -> fmt::Result {
    match datum {
        Datum::Bool(true) => write!(f, "#t"),
        Datum::Bool(false) => write!(f, "#f"),
        Datum::Num(n) => write!(f, "{}", n),
        Datum::Str(s) => {
            if write_form {
                write_string_escaped(f, s)
            } else {
                write!(f, "{}", s)
            }
        }
        Datum::Sym(s) => write!(f, "{}", s),
        Datum::List(l) => write_list(f, l, write_form),
        Datum::Proc(p) => write!(f, "{:?}", p),
        Datum::Undefined => write!(f, "#<undefined>"),
    }
}

/// The display form: strings render bare
impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_datum(f, self, false)
    }
}

/// The write form: strings render quoted with escapes, and the output
/// reads back as an equal datum
impl fmt::Debug for Datum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_datum(f, self, true)
    }
}

#[cfg(test)]
mod test {
    use super::Datum;

    fn compare_fmt(s: &str, datum: Datum) {
        assert_eq!(s.to_string(), format!("{:?}", datum))
    }

    #[test]
    fn test_fmt() {
        compare_fmt("a", sym!("a"));
        compare_fmt("()", list!());
        compare_fmt("(a)", list!(sym!("a")));
        compare_fmt("(a b)", list!(sym!("a"), sym!("b")));
        compare_fmt("(1 (2 3))", list!(num!(1), list!(num!(2), num!(3))));
        compare_fmt("#t", Datum::Bool(true));
        compare_fmt("#<undefined>", Datum::Undefined);
    }

    #[test]
    fn test_quote_abbrev() {
        compare_fmt("'a", list!(sym!("quote"), sym!("a")));
        compare_fmt("'(a b)", list!(sym!("quote"), list!(sym!("a"), sym!("b"))));
    }

    #[test]
    fn test_string_forms() {
        let s = Datum::string("a\"b\n");
        assert_eq!(format!("{:?}", s), "\"a\\\"b\\n\"");
        assert_eq!(format!("{}", s), "a\"b\n");
    }

    #[test]
    fn test_eq() {
        assert_eq!(list!(num!(1), sym!("a")), list!(num!(1), sym!("a")));
        assert_ne!(sym!("a"), Datum::string("a"));
        assert_ne!(num!(2), Datum::Num(crate::number::Number::Float(2.0)));
    }
}
