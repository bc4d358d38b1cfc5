use std::cmp::Ordering;
use std::fs;

use log::debug;

use crate::datum::{Datum, DatumType};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::number::Number;
use crate::runtime::{DatumCast, Interpreter, NativeFn, PrimFn, Procedure, Signal};

/// `(+ n0 n1 ...)`
pub static PRIM_ADD: PrimFn = add;

fn add(args: &[Datum]) -> Result<Datum, RuntimeError> {
    let mut sum = Number::Int(0);
    for arg in args {
        let a: Number = DatumCast::unwrap(arg)?;
        sum = sum + a;
    }
    Ok(sum.wrap())
}

/// `(* n0 n1 ...)`
pub static PRIM_MUL: PrimFn = mul;

fn mul(args: &[Datum]) -> Result<Datum, RuntimeError> {
    let mut product = Number::Int(1);
    for arg in args {
        let a: Number = DatumCast::unwrap(arg)?;
        product = product * a;
    }
    Ok(product.wrap())
}

/// `(- n0 n1 ...)`
pub static PRIM_SUB: PrimFn = sub;

fn sub(args: &[Datum]) -> Result<Datum, RuntimeError> {
    let (first, rest) = match args {
        [] => return Err(RuntimeError::at_least_args(1, 0)),
        [only] => {
            let n: Number = DatumCast::unwrap(only)?;
            return Ok((-n).wrap());
        }
        [first, rest @ ..] => (first, rest),
    };

    let mut acc: Number = DatumCast::unwrap(first)?;
    for arg in rest {
        let a: Number = DatumCast::unwrap(arg)?;
        acc = acc - a;
    }
    Ok(acc.wrap())
}

/// `(/ n0 n1 ...)`
pub static PRIM_DIV: PrimFn = div;

fn div(args: &[Datum]) -> Result<Datum, RuntimeError> {
    fn check_divisor(n: &Number) -> Result<(), RuntimeError> {
        if n.is_exact() && n.is_zero() {
            Err(RuntimeError::new(
                RuntimeErrorKind::DivideByZero,
                "tried to divide by 0".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    let (first, rest) = match args {
        [] => return Err(RuntimeError::at_least_args(1, 0)),
        [only] => {
            let n: Number = DatumCast::unwrap(only)?;
            check_divisor(&n)?;
            return Ok((Number::Int(1) / n).wrap());
        }
        [first, rest @ ..] => (first, rest),
    };

    let mut acc: Number = DatumCast::unwrap(first)?;
    for arg in rest {
        let a: Number = DatumCast::unwrap(arg)?;
        check_divisor(&a)?;
        acc = acc / a;
    }
    Ok(acc.wrap())
}

fn compare_chain(args: &[Datum], accept: fn(Ordering) -> bool) -> Result<Datum, RuntimeError> {
    if args.len() < 2 {
        return Err(RuntimeError::at_least_args(2, args.len()));
    }
    for pair in args.windows(2) {
        let l: Number = DatumCast::unwrap(&pair[0])?;
        let r: Number = DatumCast::unwrap(&pair[1])?;
        match l.compare(&r) {
            Some(ord) if accept(ord) => (),
            Some(_) => return Ok(Datum::Bool(false)),
            // complex numbers have no ordering
            None => {
                return Err(RuntimeError::invalid_type("Real", &pair[0].type_name()))
            }
        }
    }
    Ok(Datum::Bool(true))
}

/// `(< n0 n1 ...)`
pub static PRIM_LT: PrimFn = lt;

fn lt(args: &[Datum]) -> Result<Datum, RuntimeError> {
    compare_chain(args, Ordering::is_lt)
}

/// `(> n0 n1 ...)`
pub static PRIM_GT: PrimFn = gt;

fn gt(args: &[Datum]) -> Result<Datum, RuntimeError> {
    compare_chain(args, Ordering::is_gt)
}

/// `(<= n0 n1 ...)`
pub static PRIM_LE: PrimFn = le;

fn le(args: &[Datum]) -> Result<Datum, RuntimeError> {
    compare_chain(args, Ordering::is_le)
}

/// `(>= n0 n1 ...)`
pub static PRIM_GE: PrimFn = ge;

fn ge(args: &[Datum]) -> Result<Datum, RuntimeError> {
    compare_chain(args, Ordering::is_ge)
}

/// `(= n0 n1 ...)`, numeric equality across representations
pub static PRIM_NUM_EQ: PrimFn = num_eq;

fn num_eq(args: &[Datum]) -> Result<Datum, RuntimeError> {
    if args.len() < 2 {
        return Err(RuntimeError::at_least_args(2, args.len()));
    }
    for pair in args.windows(2) {
        let l: Number = DatumCast::unwrap(&pair[0])?;
        let r: Number = DatumCast::unwrap(&pair[1])?;
        if !l.num_eq(&r) {
            return Ok(Datum::Bool(false));
        }
    }
    Ok(Datum::Bool(true))
}

/// `(abs n)`
pub static PRIM_ABS: PrimFn = abs;

fn abs(args: &[Datum]) -> Result<Datum, RuntimeError> {
    match args {
        [arg] => {
            let n: Number = DatumCast::unwrap(arg)?;
            Ok(n.abs().wrap())
        }
        _ => Err(RuntimeError::num_args(1, args.len())),
    }
}

/// `(expt base exp)`, always inexact
pub static PRIM_EXPT: PrimFn = expt;

fn expt(args: &[Datum]) -> Result<Datum, RuntimeError> {
    match args {
        [base, exp] => {
            let b: Number = DatumCast::unwrap(base)?;
            let e: Number = DatumCast::unwrap(exp)?;
            if !matches!(b, Number::Complex(_)) && !matches!(e, Number::Complex(_)) {
                Ok(Number::Float(b.to_f64().powf(e.to_f64())).wrap())
            } else {
                Err(RuntimeError::invalid_type("Real", &base.type_name()))
            }
        }
        _ => Err(RuntimeError::num_args(2, args.len())),
    }
}

/// `(round n)`
pub static PRIM_ROUND: PrimFn = round;

fn round(args: &[Datum]) -> Result<Datum, RuntimeError> {
    match args {
        [arg] => match DatumCast::unwrap(arg)? {
            Number::Int(n) => Ok(Number::Int(n).wrap()),
            Number::Float(f) => Ok(Number::Int(f.round() as i64).wrap()),
            Number::Complex(_) => Err(RuntimeError::invalid_type("Real", &arg.type_name())),
        },
        _ => Err(RuntimeError::num_args(1, args.len())),
    }
}

fn extremum(args: &[Datum], accept: fn(Ordering) -> bool) -> Result<Datum, RuntimeError> {
    let (first, rest) = match args {
        [] => return Err(RuntimeError::at_least_args(1, 0)),
        [first, rest @ ..] => (first, rest),
    };
    let mut best: Number = DatumCast::unwrap(first)?;
    for arg in rest {
        let a: Number = DatumCast::unwrap(arg)?;
        match a.compare(&best) {
            Some(ord) => {
                if accept(ord) {
                    best = a;
                }
            }
            None => return Err(RuntimeError::invalid_type("Real", &arg.type_name())),
        }
    }
    Ok(best.wrap())
}

/// `(max n0 n1 ...)`
pub static PRIM_MAX: PrimFn = max;

fn max(args: &[Datum]) -> Result<Datum, RuntimeError> {
    extremum(args, Ordering::is_gt)
}

/// `(min n0 n1 ...)`
pub static PRIM_MIN: PrimFn = min;

fn min(args: &[Datum]) -> Result<Datum, RuntimeError> {
    extremum(args, Ordering::is_lt)
}

/// `(car list)`
pub static PRIM_CAR: PrimFn = car;

fn car(args: &[Datum]) -> Result<Datum, RuntimeError> {
    match args {
        [Datum::List(l)] if !l.is_empty() => Ok(l[0].clone()),
        [other] => Err(RuntimeError::invalid_type(
            "non-empty List",
            &other.type_name(),
        )),
        _ => Err(RuntimeError::num_args(1, args.len())),
    }
}

/// `(cdr list)`
pub static PRIM_CDR: PrimFn = cdr;

fn cdr(args: &[Datum]) -> Result<Datum, RuntimeError> {
    match args {
        [Datum::List(l)] if !l.is_empty() => Ok(Datum::list(l[1..].to_vec())),
        [other] => Err(RuntimeError::invalid_type(
            "non-empty List",
            &other.type_name(),
        )),
        _ => Err(RuntimeError::num_args(1, args.len())),
    }
}

/// `(cons head list)`
pub static PRIM_CONS: PrimFn = cons;

fn cons(args: &[Datum]) -> Result<Datum, RuntimeError> {
    match args {
        [head, Datum::List(tail)] => {
            let mut elems = Vec::with_capacity(tail.len() + 1);
            elems.push(head.clone());
            elems.extend_from_slice(tail);
            Ok(Datum::list(elems))
        }
        [_, other] => Err(RuntimeError::invalid_type("List", &other.type_name())),
        _ => Err(RuntimeError::num_args(2, args.len())),
    }
}

/// `(list x0 x1 ...)`
pub static PRIM_LIST: PrimFn = list;

fn list(args: &[Datum]) -> Result<Datum, RuntimeError> {
    Ok(Datum::list(args.to_vec()))
}

/// `(length list)`
pub static PRIM_LENGTH: PrimFn = length;

fn length(args: &[Datum]) -> Result<Datum, RuntimeError> {
    match args {
        [Datum::List(l)] => Ok(Number::Int(l.len() as i64).wrap()),
        [other] => Err(RuntimeError::invalid_type("List", &other.type_name())),
        _ => Err(RuntimeError::num_args(1, args.len())),
    }
}

/// `(append l0 l1 ...)`
pub static PRIM_APPEND: PrimFn = append;

fn append(args: &[Datum]) -> Result<Datum, RuntimeError> {
    let mut elems = Vec::new();
    for arg in args {
        match arg {
            Datum::List(l) => elems.extend_from_slice(l),
            other => return Err(RuntimeError::invalid_type("List", &other.type_name())),
        }
    }
    Ok(Datum::list(elems))
}

/// `(begin e0 e1 ...)`: arguments arrive already evaluated in order, so
/// this only has to hand back the last one
pub static PRIM_BEGIN: PrimFn = begin;

fn begin(args: &[Datum]) -> Result<Datum, RuntimeError> {
    Ok(args.last().cloned().unwrap_or(Datum::Undefined))
}

/// `(not b)`
pub static PRIM_NOT: PrimFn = not;

fn not(args: &[Datum]) -> Result<Datum, RuntimeError> {
    match args {
        [arg] => {
            let b: bool = DatumCast::unwrap(arg)?;
            Ok((!b).wrap())
        }
        _ => Err(RuntimeError::num_args(1, args.len())),
    }
}

fn equality(args: &[Datum]) -> Result<Datum, RuntimeError> {
    match args {
        [l, r] => Ok(Datum::Bool(l == r)),
        _ => Err(RuntimeError::num_args(2, args.len())),
    }
}

fn type_predicate(args: &[Datum], expected: DatumType) -> Result<Datum, RuntimeError> {
    match args {
        [arg] => Ok(Datum::Bool(DatumType::of(arg) == expected)),
        _ => Err(RuntimeError::num_args(1, args.len())),
    }
}

fn null_p(args: &[Datum]) -> Result<Datum, RuntimeError> {
    match args {
        [arg] => Ok(Datum::Bool(arg.is_nil())),
        _ => Err(RuntimeError::num_args(1, args.len())),
    }
}

/// `(string-append s0 s1 ...)`
pub static PRIM_STRING_APPEND: PrimFn = string_append;

fn string_append(args: &[Datum]) -> Result<Datum, RuntimeError> {
    let mut out = String::new();
    for arg in args {
        match arg {
            Datum::Str(s) => out.push_str(s),
            other => return Err(RuntimeError::invalid_type("String", &other.type_name())),
        }
    }
    Ok(Datum::string(&out))
}

fn display(args: &[Datum]) -> Result<Datum, RuntimeError> {
    for arg in args {
        print!("{}", arg);
    }
    Ok(Datum::Undefined)
}

fn newline(args: &[Datum]) -> Result<Datum, RuntimeError> {
    if !args.is_empty() {
        return Err(RuntimeError::num_args(0, args.len()));
    }
    println!();
    Ok(Datum::Undefined)
}

/// Lists all pure primitive functions with their names
pub fn libprimitive() -> Vec<(&'static str, PrimFn)> {
    vec![
        ("+", PRIM_ADD),
        ("-", PRIM_SUB),
        ("*", PRIM_MUL),
        ("/", PRIM_DIV),
        ("<", PRIM_LT),
        (">", PRIM_GT),
        ("<=", PRIM_LE),
        (">=", PRIM_GE),
        ("=", PRIM_NUM_EQ),
        ("abs", PRIM_ABS),
        ("expt", PRIM_EXPT),
        ("round", PRIM_ROUND),
        ("max", PRIM_MAX),
        ("min", PRIM_MIN),
        ("car", PRIM_CAR),
        ("cdr", PRIM_CDR),
        ("cons", PRIM_CONS),
        ("list", PRIM_LIST),
        ("length", PRIM_LENGTH),
        ("append", PRIM_APPEND),
        ("begin", PRIM_BEGIN),
        ("not", PRIM_NOT),
        ("eq?", equality),
        ("equal?", equality),
        ("null?", null_p),
        ("list?", |args| type_predicate(args, DatumType::List)),
        ("number?", |args| type_predicate(args, DatumType::Num)),
        ("symbol?", |args| type_predicate(args, DatumType::Sym)),
        ("string?", |args| type_predicate(args, DatumType::String)),
        ("boolean?", |args| type_predicate(args, DatumType::Bool)),
        ("procedure?", |args| type_predicate(args, DatumType::Proc)),
        ("string-append", PRIM_STRING_APPEND),
        ("display", display),
        ("newline", newline),
    ]
}

/// `(call/cc proc)`: construct a fresh one-shot escape procedure and
/// hand it to `proc`; catch only the escape carrying our own id
fn call_cc(interp: &mut Interpreter, args: &[Datum]) -> Result<Datum, Signal> {
    let proc = match args {
        [Datum::Proc(p)] => p.clone(),
        [other] => {
            return Err(RuntimeError::invalid_type("Proc", &other.type_name()).into())
        }
        _ => return Err(RuntimeError::num_args(1, args.len()).into()),
    };

    let id = interp.fresh_escape();
    debug!("call/cc: escape {}", id);
    let escape = Datum::Proc(Procedure::Escape(id));
    match interp.apply(&proc, vec![escape]) {
        Err(Signal::Escape(raised, value)) if raised == id => Ok(value),
        // errors and foreign escapes keep unwinding
        other => other,
    }
}

/// `(load name)`: evaluate every form of the named file in the global
/// environment
fn load(interp: &mut Interpreter, args: &[Datum]) -> Result<Datum, Signal> {
    let path = match args {
        [Datum::Sym(s)] | [Datum::Str(s)] => s.to_string(),
        [other] => {
            return Err(RuntimeError::invalid_type("Sym or String", &other.type_name()).into())
        }
        _ => return Err(RuntimeError::num_args(1, args.len()).into()),
    };

    let source = fs::read_to_string(&path).map_err(|e| {
        Signal::from(RuntimeError::new(
            RuntimeErrorKind::Io,
            format!("cannot load `{}`: {}", path, e),
        ))
    })?;
    debug!("load: {} ({} bytes)", path, source.len());
    interp.run_all(&source).map_err(Signal::from)?;
    Ok(Datum::Undefined)
}

/// `(map proc l0 l1 ...)`: apply `proc` across the lists elementwise,
/// stopping at the shortest
fn map(interp: &mut Interpreter, args: &[Datum]) -> Result<Datum, Signal> {
    if args.len() < 2 {
        return Err(RuntimeError::at_least_args(2, args.len()).into());
    }
    let proc = match &args[0] {
        Datum::Proc(p) => p.clone(),
        other => {
            return Err(RuntimeError::invalid_type("Proc", &other.type_name()).into())
        }
    };
    let mut lists = Vec::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        match arg {
            Datum::List(l) => lists.push(l.clone()),
            other => {
                return Err(RuntimeError::invalid_type("List", &other.type_name()).into())
            }
        }
    }

    let rows = lists.iter().map(|l| l.len()).min().unwrap_or(0);
    let mut out = Vec::with_capacity(rows);
    for i in 0..rows {
        let row: Vec<Datum> = lists.iter().map(|l| l[i].clone()).collect();
        out.push(interp.apply(&proc, row)?);
    }
    Ok(Datum::list(out))
}

/// `(apply proc args)`
fn apply(interp: &mut Interpreter, args: &[Datum]) -> Result<Datum, Signal> {
    match args {
        [Datum::Proc(p), Datum::List(l)] => interp.apply(p, l.to_vec()),
        [_, other] => Err(RuntimeError::invalid_type("List", &other.type_name()).into()),
        _ => Err(RuntimeError::num_args(2, args.len()).into()),
    }
}

/// Lists all interpreter-aware natives with their names
pub fn libnative() -> Vec<(&'static str, NativeFn)> {
    vec![
        ("call/cc", call_cc),
        ("call-with-current-continuation", call_cc),
        ("load", load),
        ("map", map),
        ("apply", apply),
    ]
}

#[cfg(test)]
mod test {
    use super::{PRIM_ADD, PRIM_CAR, PRIM_CONS, PRIM_DIV, PRIM_LT, PRIM_NOT, PRIM_SUB};
    use crate::datum::Datum;
    use crate::error::RuntimeErrorKind;
    use crate::number::Number;

    #[test]
    fn test_add() {
        assert_eq!(PRIM_ADD(&[]), Ok(num!(0)));
        assert_eq!(PRIM_ADD(&[num!(1), num!(2), num!(3)]), Ok(num!(6)));
        assert_eq!(
            PRIM_ADD(&[num!(1), Datum::Num(Number::Float(0.5))]),
            Ok(Datum::Num(Number::Float(1.5)))
        );
        assert_eq!(
            PRIM_ADD(&[sym!("a")]).unwrap_err().kind,
            RuntimeErrorKind::InvalidType
        );
    }

    #[test]
    fn test_sub() {
        assert_eq!(PRIM_SUB(&[num!(3)]), Ok(num!(-3)));
        assert_eq!(PRIM_SUB(&[num!(10), num!(3), num!(2)]), Ok(num!(5)));
        assert_eq!(
            PRIM_SUB(&[]).unwrap_err().kind,
            RuntimeErrorKind::NumArgs
        );
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(
            PRIM_DIV(&[num!(1), num!(0)]).unwrap_err().kind,
            RuntimeErrorKind::DivideByZero
        );
        // inexact zero divides to infinity instead
        let inf = PRIM_DIV(&[num!(1), Datum::Num(Number::Float(0.0))]).unwrap();
        match inf {
            Datum::Num(Number::Float(f)) => assert!(f.is_infinite()),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_compare_chain() {
        assert_eq!(PRIM_LT(&[num!(1), num!(2), num!(3)]), Ok(Datum::Bool(true)));
        assert_eq!(PRIM_LT(&[num!(1), num!(3), num!(2)]), Ok(Datum::Bool(false)));
        assert_eq!(
            PRIM_LT(&[num!(1), Datum::Num(Number::complex(1.0, 1.0))])
                .unwrap_err()
                .kind,
            RuntimeErrorKind::InvalidType
        );
    }

    #[test]
    fn test_list_ops() {
        let l = list![num!(1), num!(2)];
        assert_eq!(PRIM_CAR(&[l.clone()]), Ok(num!(1)));
        assert_eq!(
            PRIM_CAR(&[Datum::nil()]).unwrap_err().kind,
            RuntimeErrorKind::InvalidType
        );
        assert_eq!(
            PRIM_CONS(&[num!(0), l]),
            Ok(list![num!(0), num!(1), num!(2)])
        );
        assert_eq!(
            PRIM_CONS(&[num!(0), num!(1)]).unwrap_err().kind,
            RuntimeErrorKind::InvalidType
        );
    }

    #[test]
    fn test_not_is_strict() {
        assert_eq!(PRIM_NOT(&[Datum::Bool(false)]), Ok(Datum::Bool(true)));
        assert_eq!(
            PRIM_NOT(&[num!(0)]).unwrap_err().kind,
            RuntimeErrorKind::InvalidType
        );
    }
}
