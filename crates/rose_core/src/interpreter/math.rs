//! The `Math` built-in object.
//!
//! [`install`] binds a constant `Math` in the given scope before user code
//! runs.  Every member works at [`number::PRECISION`] and reports misuse as
//! [`RoseError::Native`]; the evaluator adds the call-site location.

use rug::Float;

use crate::error::{RoseError, RoseResult};
use crate::interpreter::Context;
use crate::interpreter::env::Env;
use crate::number;
use crate::objects::function::NativeFn;
use crate::objects::object::Object;
use crate::objects::value::Value;

/// Binds `Math` in `scope`.
pub fn install(scope: &Env) {
    let mut math = Object::new();
    math.set("PI", Value::Number(number::pi()));
    math.set("E", Value::Number(number::e()));
    math.set("PHI", Value::Number(number::phi()));

    let functions: [(&'static str, NativeFn); 16] = [
        ("sin", sin),
        ("cos", cos),
        ("tan", tan),
        ("asin", asin),
        ("acos", acos),
        ("atan", atan),
        ("exp", exp),
        ("log", log),
        ("sqrt", sqrt),
        ("abs", abs),
        ("floor", floor),
        ("ceil", ceil),
        ("min", min),
        ("max", max),
        ("sign", sign),
        ("random", random),
    ];
    for (name, func) in functions {
        math.set(name, Value::native(name, func));
    }

    scope.declare("Math", Value::object(math), true);
    tracing::trace!("installed Math");
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument checking
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the single numeric argument or the arity/type error for `name`.
fn single_number<'a>(name: &str, args: &'a [Value]) -> RoseResult<&'a Float> {
    match args {
        [Value::Number(n)] => Ok(n),
        _ => Err(RoseError::Native(format!(
            "Math.{name} expects 1 numeric argument"
        ))),
    }
}

/// Returns every argument as a number, requiring at least one.
fn numbers<'a>(name: &str, args: &'a [Value]) -> RoseResult<Vec<&'a Float>> {
    if args.is_empty() {
        return Err(RoseError::Native(format!(
            "Math.{name} expects at least 1 argument"
        )));
    }
    args.iter()
        .map(|arg| {
            arg.as_number().ok_or_else(|| {
                RoseError::Native(format!("Math.{name} expects numeric arguments only"))
            })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Unary functions
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! unary {
    ($($fn_name:ident => $method:ident;)*) => {
        $(
            fn $fn_name(_: &mut Context, args: &[Value]) -> RoseResult<Value> {
                let x = single_number(stringify!($fn_name), args)?;
                Ok(Value::Number(number::from(x).$method()))
            }
        )*
    };
}

unary! {
    sin => sin;
    cos => cos;
    tan => tan;
    asin => asin;
    acos => acos;
    atan => atan;
    exp => exp;
    abs => abs;
    floor => floor;
    ceil => ceil;
}

fn sqrt(_: &mut Context, args: &[Value]) -> RoseResult<Value> {
    let x = single_number("sqrt", args)?;
    if x.is_sign_negative() && !x.is_zero() {
        return Err(RoseError::Native(
            "Math.sqrt cannot take negative numbers".to_owned(),
        ));
    }
    Ok(Value::Number(number::from(x).sqrt()))
}

fn log(_: &mut Context, args: &[Value]) -> RoseResult<Value> {
    let x = single_number("log", args)?;
    if x.is_zero() || x.is_sign_negative() {
        return Err(RoseError::Native(
            "Math.log cannot take non-positive numbers".to_owned(),
        ));
    }
    Ok(Value::Number(number::from(x).ln()))
}

fn sign(_: &mut Context, args: &[Value]) -> RoseResult<Value> {
    let x = single_number("sign", args)?;
    let s = if x.is_zero() || x.is_nan() {
        0
    } else if x.is_sign_negative() {
        -1
    } else {
        1
    };
    Ok(Value::number(s))
}

// ─────────────────────────────────────────────────────────────────────────────
// Variadic functions
// ─────────────────────────────────────────────────────────────────────────────

fn min(_: &mut Context, args: &[Value]) -> RoseResult<Value> {
    let values = numbers("min", args)?;
    let mut best = values[0];
    for &candidate in &values[1..] {
        if candidate < best {
            best = candidate;
        }
    }
    Ok(Value::Number(number::from(best)))
}

fn max(_: &mut Context, args: &[Value]) -> RoseResult<Value> {
    let values = numbers("max", args)?;
    let mut best = values[0];
    for &candidate in &values[1..] {
        if candidate > best {
            best = candidate;
        }
    }
    Ok(Value::Number(number::from(best)))
}

fn random(ctx: &mut Context, _: &[Value]) -> RoseResult<Value> {
    Ok(Value::Number(ctx.random()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::env::Scope;

    fn call(name: &str, args: &[Value]) -> RoseResult<Value> {
        let scope = Scope::global();
        install(&scope);
        let Some(Value::Object(math)) = scope.get("Math") else {
            panic!("Math not installed");
        };
        let Some(Value::Function(f)) = math.borrow().get(name).cloned() else {
            panic!("Math.{name} missing");
        };
        let crate::objects::function::Function::Native { func, .. } = f.as_ref() else {
            panic!("Math.{name} is not native");
        };
        func(&mut Context::default(), args)
    }

    fn n(v: f64) -> Value {
        Value::Number(number::from(v))
    }

    fn show(result: RoseResult<Value>) -> String {
        match result {
            Ok(v) => v.to_string(),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_constants_are_installed() {
        let scope = Scope::global();
        install(&scope);
        let Some(Value::Object(math)) = scope.get("Math") else {
            panic!("Math not installed");
        };
        let math = math.borrow();
        assert_eq!(math.get("PI").unwrap().to_string(), "3.1415926535897932");
        assert_eq!(math.get("E").unwrap().to_string(), "2.7182818284590452");
        assert_eq!(math.get("PHI").unwrap().to_string(), "1.6180339887498948");
    }

    #[test]
    fn test_math_is_constant() {
        let scope = Scope::global();
        install(&scope);
        assert!(scope.assign("Math", Value::Null).is_err());
    }

    #[test]
    fn test_unary_functions() {
        assert_eq!(show(call("sqrt", &[n(16.0)])), "4");
        assert_eq!(show(call("abs", &[n(-2.5)])), "2.5");
        assert_eq!(show(call("floor", &[n(-2.5)])), "-3");
        assert_eq!(show(call("ceil", &[n(2.1)])), "3");
        assert_eq!(show(call("sin", &[n(0.0)])), "0");
        assert_eq!(show(call("exp", &[n(0.0)])), "1");
        assert_eq!(show(call("log", &[n(1.0)])), "0");
    }

    #[test]
    fn test_unary_arity_and_type_errors() {
        assert_eq!(show(call("sin", &[])), "Math.sin expects 1 numeric argument");
        assert_eq!(
            show(call("cos", &[n(1.0), n(2.0)])),
            "Math.cos expects 1 numeric argument"
        );
        assert_eq!(
            show(call("floor", &[Value::string("1")])),
            "Math.floor expects 1 numeric argument"
        );
    }

    #[test]
    fn test_domain_errors() {
        assert_eq!(
            show(call("sqrt", &[n(-1.0)])),
            "Math.sqrt cannot take negative numbers"
        );
        assert_eq!(
            show(call("log", &[n(0.0)])),
            "Math.log cannot take non-positive numbers"
        );
        assert_eq!(
            show(call("log", &[n(-3.0)])),
            "Math.log cannot take non-positive numbers"
        );
    }

    #[test]
    fn test_min_max() {
        assert_eq!(show(call("min", &[n(3.0), n(-1.0), n(2.0)])), "-1");
        assert_eq!(show(call("max", &[n(3.0), n(-1.0), n(7.5)])), "7.5");
        assert_eq!(show(call("min", &[])), "Math.min expects at least 1 argument");
        assert_eq!(
            show(call("max", &[n(1.0), Value::Null])),
            "Math.max expects numeric arguments only"
        );
    }

    #[test]
    fn test_sign() {
        assert_eq!(show(call("sign", &[n(-4.0)])), "-1");
        assert_eq!(show(call("sign", &[n(0.0)])), "0");
        assert_eq!(show(call("sign", &[n(9.0)])), "1");
    }

    #[test]
    fn test_random_is_in_unit_interval() {
        let mut ctx = Context::default();
        for _ in 0..32 {
            let Value::Number(r) = random(&mut ctx, &[]).unwrap() else {
                panic!("random returned a non-number");
            };
            assert!(r >= 0 && r < 1);
        }
    }
}
