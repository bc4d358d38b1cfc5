use std::rc::Rc;

use log::debug;
use phf::phf_map;

use crate::datum::Datum;
use crate::error::SyntaxError;
use crate::runtime::{Interpreter, Procedure, Signal};

#[derive(Clone, Copy, Debug, PartialEq)]
enum SpecialForm {
    Quote,
    If,
    Set,
    Define,
    DefineMacro,
    Begin,
    Lambda,
    QuasiQuote,
}

static SPECIAL_FORMS: phf::Map<&'static str, SpecialForm> = phf_map! {
    "quote" => SpecialForm::Quote,
    "if" => SpecialForm::If,
    "set!" => SpecialForm::Set,
    "define" => SpecialForm::Define,
    "define-macro" => SpecialForm::DefineMacro,
    "begin" => SpecialForm::Begin,
    "lambda" => SpecialForm::Lambda,
    "quasiquote" => SpecialForm::QuasiQuote,
};

fn err(form: &Datum, desc: &str) -> Signal {
    SyntaxError {
        form: format!("{:?}", form),
        desc: desc.to_string(),
    }
    .into()
}

fn require(form: &Datum, predicate: bool, desc: &str) -> Result<(), Signal> {
    if predicate {
        Ok(())
    } else {
        Err(err(form, desc))
    }
}

fn is_sym(datum: &Datum, name: &str) -> bool {
    matches!(datum, Datum::Sym(s) if &**s == name)
}

/// Syntax expander rewriting a parsed tree into the canonical core form.
///
/// Special forms are normalized, quasiquote is compiled into
/// `cons`/`append` calls, and user macros are applied to their
/// unevaluated argument forms. The resulting tree contains only the core
/// special forms and ordinary applications.
pub struct Expander<'a> {
    interp: &'a mut Interpreter,
}

impl<'a> Expander<'a> {
    pub fn new(interp: &'a mut Interpreter) -> Expander<'a> {
        Expander { interp }
    }

    /// Expand one form. `None` means the form was a top-level
    /// `define-macro` and left nothing to evaluate.
    pub fn expand(&mut self, datum: &Datum, top_level: bool) -> Result<Option<Datum>, Signal> {
        let elems = match datum {
            Datum::List(l) if l.is_empty() => return Err(err(datum, "wrong length")),
            Datum::List(l) => l.clone(),
            _ => return Ok(Some(datum.clone())),
        };

        if let Datum::Sym(op) = &elems[0] {
            let op: &str = op;
            if let Some(&form) = SPECIAL_FORMS.get(op) {
                return self.expand_special(form, datum, &elems, top_level);
            }
            if let Some(makro) = self.interp.lookup_macro(op) {
                debug!("expanding macro {}", op);
                // macros receive their argument forms unevaluated
                let rewritten = self.interp.apply(&makro, elems[1..].to_vec())?;
                return self.expand(&rewritten, top_level);
            }
        }

        // ordinary application: expand every element, operator included
        let mut expanded = Vec::with_capacity(elems.len());
        for e in elems.iter() {
            expanded.push(self.expand_some(e)?);
        }
        Ok(Some(Datum::list(expanded)))
    }

    /// Expand a sub-form, which can never be a macro definition
    fn expand_some(&mut self, datum: &Datum) -> Result<Datum, Signal> {
        match self.expand(datum, false)? {
            Some(d) => Ok(d),
            None => Err(err(datum, "define-macro only allowed at top level")),
        }
    }

    fn expand_special(
        &mut self,
        form: SpecialForm,
        datum: &Datum,
        elems: &[Datum],
        top_level: bool,
    ) -> Result<Option<Datum>, Signal> {
        match form {
            SpecialForm::Quote => {
                require(datum, elems.len() == 2, "wrong length")?;
                Ok(Some(datum.clone()))
            }
            SpecialForm::If => {
                require(datum, elems.len() == 3 || elems.len() == 4, "wrong length")?;
                let test = self.expand_some(&elems[1])?;
                let conseq = self.expand_some(&elems[2])?;
                // a missing alternative becomes an explicit unspecified value
                let alt = match elems.get(3) {
                    Some(a) => self.expand_some(a)?,
                    None => Datum::Undefined,
                };
                Ok(Some(list![sym!("if"), test, conseq, alt]))
            }
            SpecialForm::Set => {
                require(datum, elems.len() == 3, "wrong length")?;
                require(
                    datum,
                    matches!(elems[1], Datum::Sym(_)),
                    "can set! only a symbol",
                )?;
                let value = self.expand_some(&elems[2])?;
                Ok(Some(list![sym!("set!"), elems[1].clone(), value]))
            }
            SpecialForm::Define | SpecialForm::DefineMacro => {
                self.expand_define(form, datum, elems, top_level)
            }
            SpecialForm::Begin => self.expand_begin(elems, top_level),
            SpecialForm::Lambda => {
                require(datum, elems.len() >= 3, "wrong length")?;
                let params = match elems[1].as_list() {
                    Some(ps) => ps,
                    None => return Err(err(datum, "lambda parameters must be symbols")),
                };
                for p in params {
                    require(
                        datum,
                        matches!(p, Datum::Sym(_)),
                        "lambda parameters must be symbols",
                    )?;
                }
                let body = if elems.len() == 3 {
                    elems[2].clone()
                } else {
                    // several body forms run in sequence
                    let mut b = vec![sym!("begin")];
                    b.extend_from_slice(&elems[2..]);
                    Datum::list(b)
                };
                let body = self.expand_some(&body)?;
                Ok(Some(list![sym!("lambda"), elems[1].clone(), body]))
            }
            SpecialForm::QuasiQuote => {
                require(datum, elems.len() == 2, "wrong length")?;
                let compiled = expand_quasiquote(&elems[1])?;
                self.expand_some(&compiled).map(Some)
            }
        }
    }

    fn expand_define(
        &mut self,
        form: SpecialForm,
        datum: &Datum,
        elems: &[Datum],
        top_level: bool,
    ) -> Result<Option<Datum>, Signal> {
        require(datum, elems.len() >= 3, "wrong length")?;
        let target = &elems[1];

        if let Some(target_list) = target.as_list() {
            if !target_list.is_empty() {
                // (define (f a b) body...) => (define f (lambda (a b) body...))
                let name = target_list[0].clone();
                let params = Datum::list(target_list[1..].to_vec());
                let mut lambda = vec![sym!("lambda"), params];
                lambda.extend_from_slice(&elems[2..]);
                let rewritten = list![elems[0].clone(), name, Datum::list(lambda)];
                return self.expand(&rewritten, top_level);
            }
        }

        require(datum, elems.len() == 3, "wrong length")?;
        let name = match target.as_sym() {
            Some(s) => s.clone(),
            None => return Err(err(datum, "can define only a symbol")),
        };
        let value = self.expand_some(&elems[2])?;

        if form == SpecialForm::DefineMacro {
            require(datum, top_level, "define-macro only allowed at top level")?;
            // the macro procedure is built right away, in the global frame
            let global = self.interp.global();
            match self.interp.eval(&value, &global)? {
                Datum::Proc(proc) => {
                    debug!("installed macro {}", name);
                    self.interp.define_macro(name, proc);
                    Ok(None)
                }
                _ => Err(err(datum, "macro must be a procedure")),
            }
        } else {
            Ok(Some(list![sym!("define"), Datum::Sym(name), value]))
        }
    }

    fn expand_begin(
        &mut self,
        elems: &[Datum],
        top_level: bool,
    ) -> Result<Option<Datum>, Signal> {
        let mut expanded = vec![sym!("begin")];
        for e in &elems[1..] {
            // sub-forms keep the top-level flag, so macro definitions may
            // appear inside a top-level begin; they contribute no form
            if let Some(d) = self.expand(e, top_level)? {
                expanded.push(d);
            }
        }
        if expanded.len() == 1 {
            return Ok(Some(Datum::Undefined));
        }
        Ok(Some(Datum::list(expanded)))
    }
}

/// Rewrite a quasiquoted template into `cons`/`append` constructor calls,
/// leaving unquoted sub-expressions in evaluation position
fn expand_quasiquote(datum: &Datum) -> Result<Datum, Signal> {
    let elems = match datum.as_list() {
        Some(l) if !l.is_empty() => l,
        // non-pair templates, the empty list included, turn into constants
        _ => return Ok(list![sym!("quote"), datum.clone()]),
    };

    if is_sym(&elems[0], "unquote-splicing") {
        return Err(err(datum, "can't splice here"));
    }
    if is_sym(&elems[0], "unquote") {
        require(datum, elems.len() == 2, "wrong length")?;
        return Ok(elems[1].clone());
    }

    let rest = Datum::list(elems[1..].to_vec());
    if let Some(head) = elems[0].as_list() {
        if !head.is_empty() && is_sym(&head[0], "unquote-splicing") {
            require(&elems[0], head.len() == 2, "wrong length")?;
            return Ok(list![
                sym!("append"),
                head[1].clone(),
                expand_quasiquote(&rest)?
            ]);
        }
    }
    Ok(list![
        sym!("cons"),
        expand_quasiquote(&elems[0])?,
        expand_quasiquote(&rest)?
    ])
}

/// Built-in macros available from the start
pub fn install_macros(interp: &mut Interpreter) {
    interp.define_macro(Rc::from("let"), Procedure::Native("let", native_let));
}

/// `(let ((sym expr) ...) body...)` rewrites into an immediate lambda
/// call; binding expressions are evaluated in the outer environment and
/// bound simultaneously
fn native_let(_interp: &mut Interpreter, args: &[Datum]) -> Result<Datum, Signal> {
    let whole = || {
        let mut v = vec![sym!("let")];
        v.extend_from_slice(args);
        Datum::list(v)
    };

    if args.len() < 2 {
        return Err(err(&whole(), "wrong length"));
    }
    let bindings = match args[0].as_list() {
        Some(b) => b,
        None => return Err(err(&whole(), "illegal binding list")),
    };

    let mut params = Vec::with_capacity(bindings.len());
    let mut values = Vec::with_capacity(bindings.len());
    for binding in bindings {
        match binding.as_list() {
            Some([name @ Datum::Sym(_), expr]) => {
                params.push(name.clone());
                values.push(expr.clone());
            }
            _ => return Err(err(&whole(), "illegal binding list")),
        }
    }

    let mut lambda = vec![sym!("lambda"), Datum::list(params)];
    lambda.extend_from_slice(&args[1..]);
    let mut call = vec![Datum::list(lambda)];
    call.extend(values);
    Ok(Datum::list(call))
}
