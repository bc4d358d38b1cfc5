use rispy::{Datum, Error, Interpreter, Number, RuntimeError, RuntimeErrorKind};

macro_rules! assert_evaluates_to {
    ($src:expr, $expected:expr) => {{
        let _ = env_logger::builder().is_test(true).try_init();
        let mut interp = Interpreter::new();
        let result = match interp.run_all($src) {
            Ok(val) => val,
            Err(e) => panic!("evaluation of `{}` failed: {}", $src, e),
        };
        let expected = match interp.parse($expected) {
            Ok(val) => val,
            Err(e) => panic!("failed to parse expected value `{}`: {}", $expected, e),
        };
        if !((result == expected) && (expected == result)) {
            panic!("test failed: expected `{:?}` but got `{:?}`", expected, result);
        }
    }};
}

macro_rules! assert_fails_with {
    ($src:expr, $pat:pat) => {{
        let mut interp = Interpreter::new();
        match interp.run_all($src) {
            Err($pat) => (),
            other => panic!("expected failure for `{}`, got {:?}", $src, other),
        }
    }};
}

#[test]
fn eval_to_self_test() {
    assert_evaluates_to!("#t", "#t");
    assert_evaluates_to!("23", "23");
    assert_evaluates_to!("2.5", "2.5");
    assert_evaluates_to!("\"abc\"", "\"abc\"");
}

#[test]
fn numeric_expressions_test() {
    assert_evaluates_to!("(+ 23 42)", "65");
    assert_evaluates_to!("(+ 14 (* 23 42))", "980");
    assert_evaluates_to!("(- 3 1)", "2");
    assert_evaluates_to!("(- 3)", "-3");
    assert_evaluates_to!("(/ 6 3)", "2");
    assert_evaluates_to!("(/ 7 2)", "3.5");
    assert_evaluates_to!("(+ 1 1+2i)", "2.0+2.0i");
    assert_evaluates_to!("(max 1 5 3)", "5");
    assert_evaluates_to!("(min 1 5 3)", "1");
    assert_evaluates_to!("(abs -7)", "7");
    assert_evaluates_to!("(round 2.6)", "3");
}

#[test]
fn if_expression_test() {
    assert_evaluates_to!("(if #t 1 0)", "1");
    assert_evaluates_to!("(if #f 1 0)", "0");
    assert_evaluates_to!("(if (> (* 11 11) 120) (* 7 6) oops)", "42");
}

#[test]
fn if_missing_alternative_test() {
    let mut interp = Interpreter::new();
    assert_eq!(interp.run("(if #f 1)"), Ok(Datum::Undefined));
}

#[test]
fn if_requires_boolean_test() {
    assert_fails_with!(
        "(if 1 2 3)",
        Error::Runtime(RuntimeError {
            kind: RuntimeErrorKind::InvalidType,
            ..
        })
    );
}

#[test]
fn if_arity_is_a_syntax_error() {
    assert_fails_with!("(if 1 2 3 4 5)", Error::Syntax(_));
}

#[test]
fn unbound_symbol_test() {
    assert_fails_with!(
        "nosuchthing",
        Error::Runtime(RuntimeError {
            kind: RuntimeErrorKind::UnboundSymbol,
            ..
        })
    );
}

#[test]
fn lexical_scoping_test() {
    // If it were dynamic scope, this would yield #f
    assert_evaluates_to!(
        "((lambda (y f) (f 2)) #f ((lambda (y) (lambda (x) y)) #t))",
        "#t"
    );
}

#[test]
fn closure_test() {
    assert_evaluates_to!(
        "(define (make-adder n) (lambda (x) (+ x n)))
         (define add5 (make-adder 5))
         (add5 3)",
        "8"
    );
}

#[test]
fn counter_closure_test() {
    // set! mutates the captured frame, not a fresh shadow
    assert_evaluates_to!(
        "(define (make-counter)
           (begin (define n 0)
                  (lambda () (begin (set! n (+ n 1)) n))))
         (define c (make-counter))
         (c)
         (c)",
        "2"
    );
}

#[test]
fn set_test() {
    assert_evaluates_to!("(begin (define x 1) (set! x (+ x 1)) (+ x 1))", "3");
}

#[test]
fn set_unbound_test() {
    assert_fails_with!(
        "(set! nope 1)",
        Error::Runtime(RuntimeError {
            kind: RuntimeErrorKind::UnboundSymbol,
            ..
        })
    );
}

#[test]
fn begin_test() {
    assert_evaluates_to!("(begin (define r 10) (* pi (* r r)))", "314.1592653589793");
}

#[test]
fn define_returns_nothing_test() {
    let mut interp = Interpreter::new();
    assert_eq!(interp.run("(define x 1)"), Ok(Datum::Undefined));
}

#[test]
fn lambda_recursion_test() {
    assert_evaluates_to!(
        "(begin
           (define fact (lambda (n) (if (<= n 1) 1 (* n (fact (- n 1))))))
           (fact 5))",
        "120"
    );
    assert_evaluates_to!(
        "(begin
           (define fib (lambda (n) (if (< n 2) 1 (+ (fib (- n 1)) (fib (- n 2))))))
           (fib 6))",
        "13"
    );
}

#[test]
fn count_test() {
    assert_evaluates_to!(
        "(begin
           (define count
             (lambda (item L)
               (if (null? L)
                   0
                   (+ (if (equal? item (car L)) 1 0) (count item (cdr L))))))
           (count 0 (list 0 1 2 3 0 0)))",
        "3"
    );
}

#[test]
fn accumulator_recursion_test() {
    // no tail-call elimination: recursion depth is bounded by the host
    // stack, so this stays modest
    assert_evaluates_to!(
        "(begin
           (define (sum2 n acc) (if (= n 0) acc (sum2 (- n 1) (+ n acc))))
           (sum2 100 0))",
        "5050"
    );
}

#[test]
fn define_shorthand_test() {
    assert_evaluates_to!("(begin (define (cube x) (* x x x)) (cube 10))", "1000");
}

#[test]
fn list_ops_test() {
    assert_evaluates_to!("(list (+ 1 1) (+ 2 2) (* 2 3) (expt 2 3))", "(2 4 6 8.0)");
    assert_evaluates_to!("(append (list 1 2) (list 3 4) (list 5 6))", "(1 2 3 4 5 6)");
    assert_evaluates_to!("(cons 1 (list 2 3))", "(1 2 3)");
    assert_evaluates_to!("(car (list 1 2 3))", "1");
    assert_evaluates_to!("(cdr (list 1 2 3))", "(2 3)");
    assert_evaluates_to!("(length (list 1 2 3))", "3");
    assert_evaluates_to!("(null? nil)", "#t");
    assert_evaluates_to!("(null? '())", "#t");
    assert_evaluates_to!("(null? (list 1))", "#f");
}

#[test]
fn map_test() {
    assert_evaluates_to!(
        "(begin
           (define square (lambda (x) (* x x)))
           (define range (lambda (a b) (if (= a b) nil (cons a (range (+ a 1) b)))))
           (map square (range 1 5)))",
        "(1 4 9 16)"
    );
    assert_evaluates_to!(
        "(begin
           (define two (lambda (a b) (+ a b 2)))
           (define l (list 1 2 3 4))
           (map two l l))",
        "(4 6 8 10)"
    );
}

#[test]
fn apply_test() {
    assert_evaluates_to!("(apply + (list 1 2 3))", "6");
}

#[test]
fn higher_order_test() {
    assert_evaluates_to!(
        "(begin
           (define twice (lambda (f x) (f (f x))))
           (define inc (lambda (x) (+ x 1)))
           (twice inc 5))",
        "7"
    );
}

#[test]
fn arity_mismatch_test() {
    assert_fails_with!(
        "((lambda (x) x))",
        Error::Runtime(RuntimeError {
            kind: RuntimeErrorKind::NumArgs,
            ..
        })
    );
    assert_fails_with!(
        "((lambda (x) x) 1 2)",
        Error::Runtime(RuntimeError {
            kind: RuntimeErrorKind::NumArgs,
            ..
        })
    );
}

#[test]
fn not_applicable_test() {
    assert_fails_with!(
        "(1 2 3)",
        Error::Runtime(RuntimeError {
            kind: RuntimeErrorKind::NotApplicable,
            ..
        })
    );
}

#[test]
fn quote_test() {
    assert_evaluates_to!("'a", "a");
    assert_evaluates_to!("'(1 2 3)", "(1 2 3)");
    assert_evaluates_to!("(quote (a b))", "(a b)");
    assert_evaluates_to!("''x", "(quote x)");
}

#[test]
fn quasiquote_constant_test() {
    // with no unquotes, quasiquote is plain quotation
    assert_evaluates_to!("`(1 2 (3 4))", "(1 2 (3 4))");
    assert_evaluates_to!("`a", "a");
    assert_evaluates_to!("`()", "()");
}

#[test]
fn quasiquote_unquote_test() {
    assert_evaluates_to!("(begin (define x 5) `(a ,x))", "(a 5)");
    assert_evaluates_to!("(begin (define xs (list 2 3)) `(1 ,@xs 4))", "(1 2 3 4)");
}

#[test]
fn quasiquote_bad_splice_test() {
    assert_fails_with!("`,@x", Error::Syntax(_));
}

#[test]
fn macro_test() {
    assert_evaluates_to!(
        "(define-macro unless (lambda (test conseq) `(if ,test #f ,conseq)))
         (unless #f 42)",
        "42"
    );
    assert_evaluates_to!(
        "(define-macro unless (lambda (test conseq) `(if ,test #f ,conseq)))
         (unless #t 42)",
        "#f"
    );
    // the macro expands before evaluation, so the rewrite behaves exactly
    // like the hand-written if
    assert_evaluates_to!(
        "(define-macro unless (lambda (test conseq) `(if ,test #f ,conseq)))
         (unless (> 1 2) (+ 40 2))",
        "42"
    );
}

#[test]
fn macro_shorthand_test() {
    assert_evaluates_to!(
        "(define-macro (swap a b) `(list ,b ,a))
         (swap 1 2)",
        "(2 1)"
    );
}

#[test]
fn define_macro_must_be_top_level() {
    assert_fails_with!(
        "(define f (lambda () (define-macro m (lambda (x) x))))",
        Error::Syntax(_)
    );
}

#[test]
fn let_test() {
    assert_evaluates_to!("(let ((x 23) (y 42)) (+ x y))", "65");
    // binding expressions see the outer environment, not each other
    assert_evaluates_to!("(begin (define x 1) (let ((x 2) (y x)) y))", "1");
}

#[test]
fn callcc_test() {
    assert_evaluates_to!(
        "(call/cc (lambda (throw) (+ 5 (* 10 (call/cc (lambda (escape) (* 100 (escape 3))))))))",
        "35"
    );
    assert_evaluates_to!(
        "(call/cc (lambda (throw) (+ 5 (* 10 (call/cc (lambda (escape) (* 100 (throw 3))))))))",
        "3"
    );
}

#[test]
fn callcc_normal_return_test() {
    // a procedure that never invokes its escape just returns
    assert_evaluates_to!("(call/cc (lambda (k) 42))", "42");
    assert_evaluates_to!("(call-with-current-continuation (lambda (k) 42))", "42");
}

#[test]
fn callcc_dead_escape_test() {
    assert_fails_with!(
        "(define k (call/cc (lambda (c) c))) (k 5)",
        Error::Runtime(RuntimeError {
            kind: RuntimeErrorKind::DeadEscape,
            ..
        })
    );
}

#[test]
fn string_test() {
    assert_evaluates_to!("(string-append \"foo\" \"bar\")", "\"foobar\"");
    assert_evaluates_to!("(string? \"foo\")", "#t");
    assert_evaluates_to!("(string? 'foo)", "#f");
}

#[test]
fn predicate_test() {
    assert_evaluates_to!("(number? 1)", "#t");
    assert_evaluates_to!("(number? 1.5)", "#t");
    assert_evaluates_to!("(symbol? 'a)", "#t");
    assert_evaluates_to!("(symbol? \"a\")", "#f");
    assert_evaluates_to!("(boolean? #f)", "#t");
    assert_evaluates_to!("(procedure? car)", "#t");
    assert_evaluates_to!("(procedure? (lambda (x) x))", "#t");
    assert_evaluates_to!("(list? '(1 2))", "#t");
    assert_evaluates_to!("(eq? 'a 'a)", "#t");
    assert_evaluates_to!("(equal? (list 1 2) (list 1 2))", "#t");
    // exact and inexact are different datums, but numerically equal
    assert_evaluates_to!("(equal? 2 2.0)", "#f");
    assert_evaluates_to!("(= 2 2.0)", "#t");
}

#[test]
fn load_test() {
    let path = std::env::temp_dir().join("rispy_load_test.ss");
    std::fs::write(
        &path,
        "; loaded library\n(define (triple x) (* 3 x))\n(define loaded #t)\n",
    )
    .expect("write temp file");

    let mut interp = Interpreter::new();
    let program = format!("(load \"{}\") (triple 4)", path.display());
    assert_eq!(interp.run_all(&program), Ok(Datum::Num(Number::Int(12))));
    assert_eq!(interp.run("loaded"), Ok(Datum::Bool(true)));
}

#[test]
fn load_missing_file_test() {
    assert_fails_with!(
        "(load \"no-such-file-anywhere.ss\")",
        Error::Runtime(RuntimeError {
            kind: RuntimeErrorKind::Io,
            ..
        })
    );
}
