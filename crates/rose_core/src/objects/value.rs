//! Rose value representation.
//!
//! This module provides [`Value`], the enum that can hold any Rose runtime
//! value, together with type predicates, truthiness, strict equality and the
//! two string forms:
//! [`to_display_string`][Value::to_display_string] (raw text used by `+`
//! concatenation) and the [`Display`](fmt::Display) impl (inspection form
//! printed by the REPL and driver).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rug::Float;

use crate::number;
use crate::objects::function::{Function, NativeFn};
use crate::objects::object::Object;

/// Shared, mutable array storage.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Shared, mutable object storage.
pub type ObjectRef = Rc<RefCell<Object>>;

/// Any Rose value.
///
/// Primitives are stored inline.  Arrays, objects and functions are shared
/// by reference: copying a `Value` aliases the same storage, and equality on
/// them is identity.
#[derive(Clone)]
pub enum Value {
    /// An arbitrary-precision number.
    Number(Float),
    /// An immutable string.
    String(Rc<str>),
    /// `true` or `false`.
    Bool(bool),
    /// A native built-in or a closure.
    Function(Rc<Function>),
    /// An ordered list of values.
    Array(ArrayRef),
    /// An ordered string-keyed map.
    Object(ObjectRef),
    /// `null`
    Null,
    /// `undefined`
    Undefined,
}

// ──────────────────────────────────────────────────────────────────────────────
// Constructors
// ──────────────────────────────────────────────────────────────────────────────

impl Value {
    /// Wraps anything convertible into a working-precision number.
    pub fn number<T>(value: T) -> Self
    where
        Float: rug::Assign<T>,
    {
        Self::Number(number::from(value))
    }

    /// Wraps a string.
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Self::String(s.into())
    }

    /// Creates a new array holding `elements`.
    pub fn array(elements: Vec<Value>) -> Self {
        Self::Array(Rc::new(RefCell::new(elements)))
    }

    /// Creates a new object value.
    pub fn object(object: Object) -> Self {
        Self::Object(Rc::new(RefCell::new(object)))
    }

    /// Wraps a built-in function.
    pub fn native(name: &'static str, func: NativeFn) -> Self {
        Self::Function(Rc::new(Function::Native { name, func }))
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Type predicates
// ──────────────────────────────────────────────────────────────────────────────

impl Value {
    /// Returns `true` if this value is `undefined`.
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns `true` if this value is `null` or `undefined`.
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }

    /// Returns `true` if this value is a number.
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Returns the number, if this value is one.
    pub fn as_number(&self) -> Option<&Float> {
        match self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }

    /// The `typeof` result: `"number"`, `"string"`, `"boolean"`,
    /// `"function"`, `"object"` (arrays, objects and `null`) or
    /// `"undefined"`.
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Function(_) => "function",
            Self::Array(_) | Self::Object(_) | Self::Null => "object",
            Self::Undefined => "undefined",
        }
    }

    /// A precise type name for diagnostics (distinguishes arrays and `null`).
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Array(_) => "array",
            Self::Null => "null",
            other => other.type_of(),
        }
    }

    /// Truthiness: `false`, `0`, `NaN`, `""`, `null` and `undefined` are
    /// falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) => !n.is_zero() && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Null | Self::Undefined => false,
            Self::Function(_) | Self::Array(_) | Self::Object(_) => true,
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Equality
// ──────────────────────────────────────────────────────────────────────────────

impl Value {
    /// Equality without coercion.  Numbers compare by value (`NaN` is never
    /// equal), strings by content, and arrays, objects and functions by
    /// identity.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Null, Self::Null) | (Self::Undefined, Self::Undefined) => true,
            _ => false,
        }
    }

    /// The `==` operator: [`strict_equals`][Self::strict_equals], plus
    /// `null == undefined`.
    pub fn loose_equals(&self, other: &Value) -> bool {
        (self.is_nullish() && other.is_nullish()) || self.strict_equals(other)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// String conversions
// ──────────────────────────────────────────────────────────────────────────────

impl Value {
    /// The raw string form used when concatenating with `+`.
    ///
    /// Strings are unquoted, arrays join their elements with `,` and objects
    /// render as `[object Object]`.
    pub fn to_display_string(&self) -> String {
        let mut seen = Vec::new();
        let mut out = String::new();
        self.write_raw(&mut out, &mut seen);
        out
    }

    fn write_raw(&self, out: &mut String, seen: &mut Vec<*const ()>) {
        match self {
            Self::String(s) => out.push_str(s),
            Self::Array(items) => {
                let ptr = Rc::as_ptr(items).cast::<()>();
                if seen.contains(&ptr) {
                    return;
                }
                seen.push(ptr);
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    // Holes and nullish elements print as empty text.
                    if !item.is_nullish() {
                        item.write_raw(out, seen);
                    }
                }
                seen.pop();
            }
            Self::Object(_) => out.push_str("[object Object]"),
            other => other.write_inspect(out, seen),
        }
    }

    /// Inspection form with a cycle guard: strings quoted, arrays as
    /// `[a, b]`, objects as `{"k": v}`.
    fn write_inspect(&self, out: &mut String, seen: &mut Vec<*const ()>) {
        match self {
            Self::Number(n) => out.push_str(&number::format(n)),
            Self::String(s) => {
                out.push('"');
                out.push_str(s);
                out.push('"');
            }
            Self::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Self::Function(_) => out.push_str("function"),
            Self::Null => out.push_str("null"),
            Self::Undefined => out.push_str("undefined"),
            Self::Array(items) => {
                let ptr = Rc::as_ptr(items).cast::<()>();
                if seen.contains(&ptr) {
                    out.push_str("[Circular]");
                    return;
                }
                seen.push(ptr);
                out.push('[');
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_inspect(out, seen);
                }
                out.push(']');
                seen.pop();
            }
            Self::Object(obj) => {
                let ptr = Rc::as_ptr(obj).cast::<()>();
                if seen.contains(&ptr) {
                    out.push_str("[Circular]");
                    return;
                }
                seen.push(ptr);
                out.push('{');
                for (i, (key, value)) in obj.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push('"');
                    out.push_str(key);
                    out.push_str("\": ");
                    value.write_inspect(out, seen);
                }
                out.push('}');
                seen.pop();
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_inspect(&mut out, &mut Vec::new());
        f.write_str(&out)
    }
}

// Containers reuse the inspection writer so self-referencing values terminate.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Function(func) => f.debug_tuple("Function").field(func).finish(),
            Self::Array(_) | Self::Object(_) => {
                let mut out = String::new();
                self.write_inspect(&mut out, &mut Vec::new());
                let name = if matches!(self, Self::Array(_)) { "Array" } else { "Object" };
                f.debug_tuple(name).field(&format_args!("{out}")).finish()
            }
            Self::Null => f.write_str("Null"),
            Self::Undefined => f.write_str("Undefined"),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: i32) -> Value {
        Value::number(v)
    }

    #[test]
    fn test_type_of() {
        assert_eq!(num(1).type_of(), "number");
        assert_eq!(Value::string("s").type_of(), "string");
        assert_eq!(Value::Bool(true).type_of(), "boolean");
        assert_eq!(Value::array(vec![]).type_of(), "object");
        assert_eq!(Value::object(Object::new()).type_of(), "object");
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::Undefined.type_of(), "undefined");
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::array(vec![]).type_name(), "array");
    }

    #[test]
    fn test_truthiness() {
        assert!(!num(0).is_truthy());
        assert!(!Value::Number(number::nan()).is_truthy());
        assert!(num(-3).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("0").is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Undefined.is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn test_strict_equals() {
        assert!(num(2).strict_equals(&Value::Number(number::from(2.0))));
        assert!(!Value::Number(number::nan()).strict_equals(&Value::Number(number::nan())));
        assert!(Value::string("a").strict_equals(&Value::string("a")));
        assert!(!num(1).strict_equals(&Value::string("1")));
        assert!(!Value::Null.strict_equals(&Value::Undefined));
        assert!(Value::Null.loose_equals(&Value::Undefined));

        let arr = Value::array(vec![num(1)]);
        assert!(arr.strict_equals(&arr.clone()));
        assert!(!arr.strict_equals(&Value::array(vec![num(1)])));
    }

    #[test]
    fn test_display_inspection_form() {
        let mut obj = Object::new();
        obj.set("name", Value::string("rose"));
        obj.set("tags", Value::array(vec![num(1), Value::Null, Value::Bool(false)]));
        assert_eq!(
            Value::object(obj).to_string(),
            r#"{"name": "rose", "tags": [1, null, false]}"#
        );
        assert_eq!(Value::native("f", |_, _| Ok(Value::Null)).to_string(), "function");
        assert_eq!(Value::Number(number::from(0.5)).to_string(), "0.5");
    }

    #[test]
    fn test_display_string_form() {
        assert_eq!(Value::string("hi").to_display_string(), "hi");
        assert_eq!(
            Value::array(vec![num(1), Value::Undefined, Value::string("x")]).to_display_string(),
            "1,,x"
        );
        assert_eq!(Value::object(Object::new()).to_display_string(), "[object Object]");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
    }

    #[test]
    fn test_debug_of_values() {
        assert_eq!(format!("{:?}", Value::string("hi")), r#"String("hi")"#);
        assert_eq!(format!("{:?}", Value::Bool(false)), "Bool(false)");
        assert_eq!(format!("{:?}", Value::Undefined), "Undefined");

        let obj = Value::object(Object::new());
        if let Value::Object(o) = &obj {
            o.borrow_mut().set("me", obj.clone());
        }
        assert_eq!(format!("{obj:?}"), r#"Object({"me": [Circular]})"#);
        if let Value::Object(o) = &obj {
            o.borrow_mut().remove("me");
        }
    }

    #[test]
    fn test_cyclic_array_display_terminates() {
        let arr = Value::array(vec![num(1)]);
        if let Value::Array(items) = &arr {
            items.borrow_mut().push(arr.clone());
        }
        assert_eq!(arr.to_string(), "[1, [Circular]]");
        assert_eq!(arr.to_display_string(), "1,");
        assert_eq!(format!("{arr:?}"), "Array([1, [Circular]])");
        // Break the cycle so the test does not leak.
        if let Value::Array(items) = &arr {
            items.borrow_mut().clear();
        }
    }
}
