use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::base::base_env;
use crate::datum::Datum;
use crate::error::{Error, ParserError, RuntimeError, RuntimeErrorKind, SyntaxError};
use crate::expander::{self, Expander};
use crate::number::Number;
use crate::parser::Parser;

/// A pure host primitive: already-evaluated arguments in, value out
pub type PrimFn = fn(&[Datum]) -> Result<Datum, RuntimeError>;

/// A host procedure that needs the interpreter itself, such as `call/cc`,
/// `load` or `map`
pub type NativeFn = fn(&mut Interpreter, &[Datum]) -> Result<Datum, Signal>;

/// Outcome channel of evaluation: either an error, or a non-local
/// transfer raised by an escape procedure and identified by the
/// `call/cc` invocation that created it
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Error(Error),
    Escape(u64, Datum),
}

impl Signal {
    /// Collapse a signal at the top level. An escape that reaches here
    /// was invoked after its `call/cc` already returned.
    pub fn into_error(self) -> Error {
        match self {
            Signal::Error(e) => e,
            Signal::Escape(_, _) => RuntimeError::new(
                RuntimeErrorKind::DeadEscape,
                "escape procedure invoked outside the extent of its call/cc".to_string(),
            )
            .into(),
        }
    }
}

impl From<Error> for Signal {
    fn from(e: Error) -> Signal {
        Signal::Error(e)
    }
}

impl From<RuntimeError> for Signal {
    fn from(e: RuntimeError) -> Signal {
        Signal::Error(Error::Runtime(e))
    }
}

impl From<SyntaxError> for Signal {
    fn from(e: SyntaxError) -> Signal {
        Signal::Error(Error::Syntax(e))
    }
}

impl From<ParserError> for Signal {
    fn from(e: ParserError) -> Signal {
        Signal::Error(Error::Parse(e))
    }
}

/// A user procedure: parameter list and body, closed over the frame
/// that was active when the `lambda` form was evaluated
#[derive(Debug)]
pub struct Closure {
    pub(crate) params: Vec<Rc<str>>,
    pub(crate) body: Datum,
    pub(crate) env: Rc<Env>,
}

#[derive(Clone)]
pub enum Procedure {
    /// Host function over evaluated arguments
    Prim(&'static str, PrimFn),
    /// Host function with access to the interpreter
    Native(&'static str, NativeFn),
    /// User procedure created by `lambda`
    Closure(Rc<Closure>),
    /// One-shot escape created by `call/cc`
    Escape(u64),
}

impl PartialEq for Procedure {
    fn eq(&self, rhs: &Procedure) -> bool {
        match (self, rhs) {
            (Procedure::Prim(l, _), Procedure::Prim(r, _)) => l == r,
            (Procedure::Native(l, _), Procedure::Native(r, _)) => l == r,
            (Procedure::Closure(l), Procedure::Closure(r)) => Rc::ptr_eq(l, r),
            (Procedure::Escape(l), Procedure::Escape(r)) => l == r,
            _ => false,
        }
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Procedure::Prim(name, _) | Procedure::Native(name, _) => {
                write!(f, "#<primitive {}>", name)
            }
            Procedure::Closure(c) => {
                write!(f, "#<procedure (")?;
                for (i, p) in c.params.iter().enumerate() {
                    if i != 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")>")
            }
            Procedure::Escape(id) => write!(f, "#<continuation {}>", id),
        }
    }
}

/// A binding frame. Frames chain outward through `outer` up to the
/// global frame, giving closures lexical scope.
#[derive(Debug)]
pub struct Env {
    vars: RefCell<HashMap<Rc<str>, Datum>>,
    outer: Option<Rc<Env>>,
}

impl Env {
    pub fn new_global() -> Rc<Env> {
        Rc::new(Env {
            vars: RefCell::new(HashMap::new()),
            outer: None,
        })
    }

    /// A frame binding each parameter positionally to its argument,
    /// enclosed by `outer`
    pub fn child(
        params: &[Rc<str>],
        args: Vec<Datum>,
        outer: &Rc<Env>,
    ) -> Result<Rc<Env>, RuntimeError> {
        if params.len() != args.len() {
            return Err(RuntimeError::num_args(params.len(), args.len()));
        }
        let mut vars = HashMap::with_capacity(params.len());
        for (param, arg) in params.iter().zip(args) {
            vars.insert(param.clone(), arg);
        }
        Ok(Rc::new(Env {
            vars: RefCell::new(vars),
            outer: Some(outer.clone()),
        }))
    }

    /// The nearest frame, starting from `env`, that binds `name`
    pub fn find(env: &Rc<Env>, name: &str) -> Result<Rc<Env>, RuntimeError> {
        let mut frame = env.clone();
        loop {
            if frame.vars.borrow().contains_key(name) {
                return Ok(frame);
            }
            frame = match &frame.outer {
                Some(outer) => outer.clone(),
                None => return Err(RuntimeError::unbound_symbol(name)),
            };
        }
    }

    /// Read a binding of this frame only
    pub fn get(&self, name: &str) -> Option<Datum> {
        self.vars.borrow().get(name).cloned()
    }

    /// Create or overwrite a binding in this frame only
    pub fn put(&self, name: &str, value: Datum) {
        self.vars.borrow_mut().insert(Rc::from(name), value);
    }

    /// Resolve `name` through the frame chain
    pub fn lookup(env: &Rc<Env>, name: &str) -> Result<Datum, RuntimeError> {
        let frame = Env::find(env, name)?;
        match frame.get(name) {
            Some(value) => Ok(value),
            None => Err(RuntimeError::unbound_symbol(name)),
        }
    }
}

/// Convert between datums and host types at primitive boundaries
pub trait DatumCast: Sized {
    fn unwrap(datum: &Datum) -> Result<Self, RuntimeError>;
    fn wrap(self) -> Datum;
}

impl DatumCast for Number {
    fn unwrap(datum: &Datum) -> Result<Number, RuntimeError> {
        match datum {
            Datum::Num(n) => Ok(*n),
            _ => Err(RuntimeError::invalid_type("Num", &datum.type_name())),
        }
    }

    fn wrap(self) -> Datum {
        Datum::Num(self)
    }
}

impl DatumCast for bool {
    fn unwrap(datum: &Datum) -> Result<bool, RuntimeError> {
        match datum {
            Datum::Bool(b) => Ok(*b),
            _ => Err(RuntimeError::invalid_type("Bool", &datum.type_name())),
        }
    }

    fn wrap(self) -> Datum {
        Datum::Bool(self)
    }
}

/// The interpreter context: the global frame, the macro table and the
/// escape-id counter. All entry points go through a value of this type;
/// there is no hidden global state.
pub struct Interpreter {
    global: Rc<Env>,
    macros: HashMap<Rc<str>, Procedure>,
    next_escape: u64,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        let mut interp = Interpreter {
            global: base_env(),
            macros: HashMap::new(),
            next_escape: 0,
        };
        expander::install_macros(&mut interp);
        interp
    }

    pub fn global(&self) -> Rc<Env> {
        self.global.clone()
    }

    /// Read one datum from `source` without expanding it
    pub fn parse(&self, source: &str) -> Result<Datum, Error> {
        let mut parser = Parser::new(source);
        Ok(parser.parse_required()?)
    }

    /// Read, expand and evaluate one top-level form
    pub fn run(&mut self, source: &str) -> Result<Datum, Error> {
        let mut parser = Parser::new(source);
        let datum = parser.parse_required()?;
        self.run_datum(datum)
    }

    /// Evaluate every top-level form in `source` in order, returning the
    /// value of the last one
    pub fn run_all(&mut self, source: &str) -> Result<Datum, Error> {
        let mut parser = Parser::new(source);
        let mut last = Datum::Undefined;
        while let Some(datum) = parser.parse_datum()? {
            last = self.run_datum(datum)?;
        }
        Ok(last)
    }

    /// Expand and evaluate one already-parsed top-level form
    pub fn run_datum(&mut self, datum: Datum) -> Result<Datum, Error> {
        let expanded = Expander::new(self)
            .expand(&datum, true)
            .map_err(Signal::into_error)?;
        match expanded {
            // a top-level define-macro leaves nothing to evaluate
            None => Ok(Datum::Undefined),
            Some(form) => {
                let global = self.global();
                self.eval(&form, &global).map_err(Signal::into_error)
            }
        }
    }

    pub(crate) fn define_macro(&mut self, name: Rc<str>, proc: Procedure) {
        self.macros.insert(name, proc);
    }

    pub(crate) fn lookup_macro(&self, name: &str) -> Option<Procedure> {
        self.macros.get(name).cloned()
    }

    pub(crate) fn fresh_escape(&mut self) -> u64 {
        let id = self.next_escape;
        self.next_escape += 1;
        id
    }

    /// Evaluate a canonical form in the given frame.
    ///
    /// This is a plain recursive tree walk: evaluation depth is bounded
    /// by the host stack, and tail calls are not eliminated.
    pub fn eval(&mut self, datum: &Datum, env: &Rc<Env>) -> Result<Datum, Signal> {
        debug!("eval: {:?}", datum);
        match datum {
            Datum::Sym(name) => Ok(Env::lookup(env, name)?),
            Datum::List(elems) => self.eval_list(elems, env),
            // everything else evaluates to itself
            _ => Ok(datum.clone()),
        }
    }

    fn eval_list(&mut self, elems: &[Datum], env: &Rc<Env>) -> Result<Datum, Signal> {
        if let Some(Datum::Sym(op)) = elems.first() {
            match &**op {
                "quote" => return self.eval_quote(elems),
                "if" => return self.eval_if(elems, env),
                "define" => return self.eval_define(elems, env),
                "set!" => return self.eval_set(elems, env),
                "lambda" => return self.eval_lambda(elems, env),
                _ => {}
            }
        }

        let head = match elems.first() {
            Some(head) => head,
            None => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::NotApplicable,
                    "cannot evaluate the empty list".to_string(),
                )
                .into())
            }
        };

        let proc = match self.eval(head, env)? {
            Datum::Proc(p) => p,
            other => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::NotApplicable,
                    format!("`{:?}` is not applicable", other),
                )
                .into())
            }
        };

        let mut args = Vec::with_capacity(elems.len() - 1);
        for arg in &elems[1..] {
            args.push(self.eval(arg, env)?);
        }

        self.apply(&proc, args)
    }

    pub fn apply(&mut self, proc: &Procedure, args: Vec<Datum>) -> Result<Datum, Signal> {
        debug!("apply: {:?} to {} arguments", proc, args.len());
        match proc {
            Procedure::Prim(_, func) => Ok(func(&args)?),
            Procedure::Native(_, func) => func(self, &args),
            Procedure::Closure(closure) => {
                let frame = Env::child(&closure.params, args, &closure.env)?;
                self.eval(&closure.body, &frame)
            }
            Procedure::Escape(id) => match <[Datum; 1]>::try_from(args) {
                Ok([value]) => Err(Signal::Escape(*id, value)),
                Err(args) => Err(RuntimeError::num_args(1, args.len()).into()),
            },
        }
    }

    fn eval_quote(&mut self, elems: &[Datum]) -> Result<Datum, Signal> {
        match elems {
            [_, quoted] => Ok(quoted.clone()),
            _ => Err(self.malformed(elems)),
        }
    }

    fn eval_if(&mut self, elems: &[Datum], env: &Rc<Env>) -> Result<Datum, Signal> {
        let (test, conseq, alt) = match elems {
            [_, test, conseq, alt] => (test, conseq, alt),
            _ => return Err(self.malformed(elems)),
        };
        match self.eval(test, env)? {
            Datum::Bool(true) => self.eval(conseq, env),
            Datum::Bool(false) => self.eval(alt, env),
            other => Err(RuntimeError::invalid_type("Bool", &other.type_name()).into()),
        }
    }

    fn eval_define(&mut self, elems: &[Datum], env: &Rc<Env>) -> Result<Datum, Signal> {
        let (name, expr) = match elems {
            [_, Datum::Sym(name), expr] => (name.clone(), expr),
            _ => return Err(self.malformed(elems)),
        };
        let value = self.eval(expr, env)?;
        env.put(&name, value);
        Ok(Datum::Undefined)
    }

    fn eval_set(&mut self, elems: &[Datum], env: &Rc<Env>) -> Result<Datum, Signal> {
        let (name, expr) = match elems {
            [_, Datum::Sym(name), expr] => (name.clone(), expr),
            _ => return Err(self.malformed(elems)),
        };
        let value = self.eval(expr, env)?;
        // mutate the owning frame, never shadow in a fresh one
        Env::find(env, &name)?.put(&name, value);
        Ok(Datum::Undefined)
    }

    fn eval_lambda(&mut self, elems: &[Datum], env: &Rc<Env>) -> Result<Datum, Signal> {
        let (param_list, body) = match elems {
            [_, Datum::List(params), body] => (params, body),
            _ => return Err(self.malformed(elems)),
        };
        let mut params = Vec::with_capacity(param_list.len());
        for param in param_list.iter() {
            match param {
                Datum::Sym(name) => params.push(name.clone()),
                _ => return Err(self.malformed(elems)),
            }
        }
        Ok(Datum::Proc(Procedure::Closure(Rc::new(Closure {
            params,
            body: body.clone(),
            env: env.clone(),
        }))))
    }

    // Canonical forms produced by the expander never trip this; it only
    // guards direct eval calls on hand-built trees.
    fn malformed(&self, elems: &[Datum]) -> Signal {
        SyntaxError {
            form: format!("{:?}", Datum::list(elems.to_vec())),
            desc: "wrong length".to_string(),
        }
        .into()
    }
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::{Env, Interpreter, Procedure, Signal};
    use crate::datum::Datum;
    use crate::error::{RuntimeErrorKind, Error};

    #[test]
    fn test_env_chain() {
        let global = Env::new_global();
        global.put("x", num!(1));
        let params: Vec<Rc<str>> = vec![Rc::from("y")];
        let child = Env::child(&params, vec![num!(2)], &global).unwrap();

        assert_eq!(Env::lookup(&child, "x"), Ok(num!(1)));
        assert_eq!(Env::lookup(&child, "y"), Ok(num!(2)));
        assert_eq!(
            Env::lookup(&child, "z").unwrap_err().kind,
            RuntimeErrorKind::UnboundSymbol
        );
    }

    #[test]
    fn test_find_returns_owning_frame() {
        let global = Env::new_global();
        global.put("x", num!(1));
        let child = Env::child(&[], vec![], &global).unwrap();

        let owner = Env::find(&child, "x").unwrap();
        owner.put("x", num!(2));
        // the global binding changed, the child frame stayed empty
        assert_eq!(global.get("x"), Some(num!(2)));
        assert_eq!(child.get("x"), None);
    }

    #[test]
    fn test_child_arity() {
        let global = Env::new_global();
        let params: Vec<Rc<str>> = vec![Rc::from("a"), Rc::from("b")];
        let err = Env::child(&params, vec![num!(1)], &global).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::NumArgs);
    }

    #[test]
    fn test_eval_self_and_quote() {
        let mut interp = Interpreter::new();
        let global = interp.global();
        assert_eq!(interp.eval(&num!(7), &global), Ok(num!(7)));
        let quoted = list![sym!("quote"), list!(sym!("a"), num!(1))];
        assert_eq!(
            interp.eval(&quoted, &global),
            Ok(list!(sym!("a"), num!(1)))
        );
    }

    #[test]
    fn test_apply_non_procedure() {
        let mut interp = Interpreter::new();
        let global = interp.global();
        let form = list![num!(1), num!(2)];
        match interp.eval(&form, &global) {
            Err(Signal::Error(Error::Runtime(e))) => {
                assert_eq!(e.kind, RuntimeErrorKind::NotApplicable)
            }
            other => panic!("expected NotApplicable, got {:?}", other),
        }
    }

    #[test]
    fn test_escape_signal_carries_value() {
        let mut interp = Interpreter::new();
        let escape = Procedure::Escape(42);
        match interp.apply(&escape, vec![num!(3)]) {
            Err(Signal::Escape(42, value)) => assert_eq!(value, num!(3)),
            other => panic!("expected escape signal, got {:?}", other),
        }
    }

    #[test]
    fn test_lambda_captures_definition_frame() {
        let mut interp = Interpreter::new();
        let global = interp.global();
        global.put("n", num!(10));
        let lambda = list![sym!("lambda"), list![sym!("x")], sym!("n")];
        let proc = match interp.eval(&lambda, &global).unwrap() {
            Datum::Proc(p) => p,
            other => panic!("expected procedure, got {:?}", other),
        };
        assert_eq!(interp.apply(&proc, vec![num!(1)]), Ok(num!(10)));
    }
}
