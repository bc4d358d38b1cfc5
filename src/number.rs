use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num::complex::Complex64;

/// Numeric scalars of the interpreter.
///
/// `Int` and `Float` are preferred by the reader; `Complex` only appears
/// when a literal carries an imaginary part or an operation mixes one in.
#[derive(Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
    Complex(Complex64),
}

impl Number {
    pub fn complex(re: f64, im: f64) -> Number {
        Number::Complex(Complex64::new(re, im))
    }

    /// Exact numbers are the integers; floats and complexes are inexact
    pub fn is_exact(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(n) => *n == 0,
            Number::Float(f) => *f == 0.0,
            Number::Complex(c) => c.re == 0.0 && c.im == 0.0,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Int(n) => *n as f64,
            Number::Float(f) => *f,
            Number::Complex(c) => c.re,
        }
    }

    fn to_complex(&self) -> Complex64 {
        match self {
            Number::Int(n) => Complex64::new(*n as f64, 0.0),
            Number::Float(f) => Complex64::new(*f, 0.0),
            Number::Complex(c) => *c,
        }
    }

    /// Numeric equality across representations: `2` equals `2.0`
    pub fn num_eq(&self, other: &Number) -> bool {
        coerce(
            self,
            other,
            |l, r| l == r,
            |l, r| l == r,
            |l, r| l == r,
        )
    }

    /// Ordering for the comparison operators; complex numbers have none
    pub fn compare(&self, other: &Number) -> Option<Ordering> {
        coerce(
            self,
            other,
            |l, r| Some(l.cmp(&r)),
            |l, r| l.partial_cmp(&r),
            |_, _| None,
        )
    }

    pub fn abs(&self) -> Number {
        match self {
            Number::Int(n) => Number::Int(n.wrapping_abs()),
            Number::Float(f) => Number::Float(f.abs()),
            Number::Complex(c) => Number::Float(c.norm()),
        }
    }
}

/// Dispatch a binary operation after coercing both operands to the wider
/// of the two representations
fn coerce<I, F, C, T>(lhs: &Number, rhs: &Number, i_op: I, f_op: F, c_op: C) -> T
where
    I: Fn(i64, i64) -> T,
    F: Fn(f64, f64) -> T,
    C: Fn(Complex64, Complex64) -> T,
{
    match (lhs, rhs) {
        (Number::Int(l), Number::Int(r)) => i_op(*l, *r),
        (Number::Complex(_), _) | (_, Number::Complex(_)) => {
            c_op(lhs.to_complex(), rhs.to_complex())
        }
        _ => f_op(lhs.to_f64(), rhs.to_f64()),
    }
}

// Integer results that overflow an i64 spill into floats rather than wrap
fn int_or_float(checked: Option<i64>, fallback: f64) -> Number {
    match checked {
        Some(n) => Number::Int(n),
        None => Number::Float(fallback),
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        coerce(
            &self,
            &rhs,
            |l, r| int_or_float(l.checked_add(r), l as f64 + r as f64),
            |l, r| Number::Float(l + r),
            |l, r| Number::Complex(l + r),
        )
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        coerce(
            &self,
            &rhs,
            |l, r| int_or_float(l.checked_sub(r), l as f64 - r as f64),
            |l, r| Number::Float(l - r),
            |l, r| Number::Complex(l - r),
        )
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Number) -> Number {
        coerce(
            &self,
            &rhs,
            |l, r| int_or_float(l.checked_mul(r), l as f64 * r as f64),
            |l, r| Number::Float(l * r),
            |l, r| Number::Complex(l * r),
        )
    }
}

impl Div for Number {
    type Output = Number;

    /// Integer division stays exact when it divides evenly.
    /// Callers must rule out an exact zero divisor beforehand.
    fn div(self, rhs: Number) -> Number {
        coerce(
            &self,
            &rhs,
            |l, r| {
                if r != 0 && l % r == 0 {
                    Number::Int(l / r)
                } else {
                    Number::Float(l as f64 / r as f64)
                }
            },
            |l, r| Number::Float(l / r),
            |l, r| Number::Complex(l / r),
        )
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Int(n) => int_or_float(n.checked_neg(), -(n as f64)),
            Number::Float(f) => Number::Float(-f),
            Number::Complex(c) => Number::Complex(-c),
        }
    }
}

impl PartialEq for Number {
    /// Strict equality: `2` and `2.0` are different datums.
    /// Use [`Number::num_eq`] for the coercing `=` comparison.
    fn eq(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::Int(l), Number::Int(r)) => l == r,
            (Number::Float(l), Number::Float(r)) => l == r,
            (Number::Complex(l), Number::Complex(r)) => l == r,
            _ => false,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(x) => write!(f, "{:?}", x),
            Number::Complex(c) => {
                if c.im.is_sign_negative() {
                    write!(f, "{:?}-{:?}i", c.re, -c.im)
                } else {
                    write!(f, "{:?}+{:?}i", c.re, c.im)
                }
            }
        }
    }
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::Number;

    #[test]
    fn test_coerced_arithmetic() {
        assert_eq!(Number::Int(1) + Number::Int(2), Number::Int(3));
        assert_eq!(Number::Int(1) + Number::Float(0.5), Number::Float(1.5));
        assert_eq!(
            Number::Int(1) + Number::complex(1.0, 2.0),
            Number::complex(2.0, 2.0)
        );
        assert_eq!(
            Number::Float(2.0) * Number::complex(0.0, 1.0),
            Number::complex(0.0, 2.0)
        );
    }

    #[test]
    fn test_int_division() {
        assert_eq!(Number::Int(6) / Number::Int(3), Number::Int(2));
        assert_eq!(Number::Int(7) / Number::Int(2), Number::Float(3.5));
    }

    #[test]
    fn test_overflow_spills_to_float() {
        let big = Number::Int(i64::MAX) + Number::Int(1);
        assert!(matches!(big, Number::Float(_)));
    }

    #[test]
    fn test_strict_vs_numeric_equality() {
        assert_ne!(Number::Int(2), Number::Float(2.0));
        assert!(Number::Int(2).num_eq(&Number::Float(2.0)));
        assert!(Number::Float(1.0).num_eq(&Number::complex(1.0, 0.0)));
    }

    #[test]
    fn test_compare() {
        use std::cmp::Ordering;
        assert_eq!(
            Number::Int(1).compare(&Number::Float(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Number::Int(3).compare(&Number::complex(1.0, 1.0)), None);
    }

    #[test]
    fn test_fmt() {
        assert_eq!(format!("{}", Number::Int(42)), "42");
        assert_eq!(format!("{}", Number::Float(1.0)), "1.0");
        assert_eq!(format!("{}", Number::Float(3.14)), "3.14");
        assert_eq!(format!("{}", Number::complex(1.0, 2.0)), "1.0+2.0i");
        assert_eq!(format!("{}", Number::complex(1.5, -0.5)), "1.5-0.5i");
    }
}
