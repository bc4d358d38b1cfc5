use std::f64::consts::PI;
use std::rc::Rc;

use crate::datum::Datum;
use crate::number::Number;
use crate::primitive::{libnative, libprimitive};
use crate::runtime::{Env, Procedure};

/// Build the global frame with the whole base library installed
pub fn base_env() -> Rc<Env> {
    let env = Env::new_global();
    for (name, func) in libprimitive() {
        env.put(name, Datum::Proc(Procedure::Prim(name, func)));
    }
    for (name, func) in libnative() {
        env.put(name, Datum::Proc(Procedure::Native(name, func)));
    }
    env.put("pi", Datum::Num(Number::Float(PI)));
    env.put("nil", Datum::nil());
    env
}

#[cfg(test)]
mod test {
    use super::base_env;
    use crate::datum::Datum;

    #[test]
    fn test_base_bindings() {
        let env = base_env();
        assert!(matches!(env.get("+"), Some(Datum::Proc(_))));
        assert!(matches!(env.get("call/cc"), Some(Datum::Proc(_))));
        assert!(matches!(env.get("pi"), Some(Datum::Num(_))));
        assert_eq!(env.get("nil"), Some(Datum::nil()));
    }
}
