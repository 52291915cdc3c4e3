//! Lexical scopes.
//!
//! A [`Scope`] holds the bindings introduced by one block, function call or
//! the program itself, and points at its enclosing scope.  Scopes are shared
//! through [`Env`] (`Rc<Scope>`): the evaluator holds one for the duration of
//! a block, and every closure created inside keeps its own reference, so a
//! scope is freed when the last block or closure using it goes away.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;
use thiserror::Error;

use crate::objects::value::Value;

/// Shared handle to a scope.
pub type Env = Rc<Scope>;

/// Bindings stored inline before spilling to the heap.
const INLINE_BINDINGS: usize = 8;

/// A failed assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// No scope in the chain declares the name.
    #[error("Identifier '{0}' not found")]
    NotFound(String),
    /// The declaring scope bound the name with `const`.
    #[error("Assignment to constant variable '{0}'")]
    Constant(String),
}

#[derive(Debug)]
struct Binding {
    name: Rc<str>,
    value: Value,
    constant: bool,
}

/// One level of the scope chain.
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<Env>,
    bindings: RefCell<SmallVec<[Binding; INLINE_BINDINGS]>>,
}

impl Scope {
    /// Creates a root scope with no parent.
    pub fn global() -> Env {
        Rc::new(Self::default())
    }

    /// Creates a scope nested inside `parent`.
    pub fn child(parent: &Env) -> Env {
        Rc::new(Self {
            parent: Some(Rc::clone(parent)),
            bindings: RefCell::default(),
        })
    }

    /// The enclosing scope, if any.
    pub fn parent(&self) -> Option<&Env> {
        self.parent.as_ref()
    }

    /// Looks `name` up in this scope and then outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        let local = self
            .bindings
            .borrow()
            .iter()
            .find(|b| b.name.as_ref() == name)
            .map(|b| b.value.clone());
        match local {
            Some(value) => Some(value),
            None => self.parent.as_ref().and_then(|p| p.get(name)),
        }
    }

    /// Returns `true` if this scope itself binds `name`.
    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.borrow().iter().any(|b| b.name.as_ref() == name)
    }

    /// Binds `name` in this scope, overwriting an existing local binding.
    pub fn set(&self, name: &str, value: Value) {
        self.declare(name, value, false);
    }

    /// Like [`set`][Self::set], recording whether the binding is `const`.
    pub fn declare(&self, name: &str, value: Value, constant: bool) {
        let mut bindings = self.bindings.borrow_mut();
        match bindings.iter_mut().find(|b| b.name.as_ref() == name) {
            Some(binding) => {
                binding.value = value;
                binding.constant = constant;
            }
            None => bindings.push(Binding {
                name: name.into(),
                value,
                constant,
            }),
        }
    }

    /// Updates the nearest binding of `name`, walking outward to the scope
    /// that declared it.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), ScopeError> {
        {
            let mut bindings = self.bindings.borrow_mut();
            if let Some(binding) = bindings.iter_mut().find(|b| b.name.as_ref() == name) {
                if binding.constant {
                    return Err(ScopeError::Constant(name.to_owned()));
                }
                binding.value = value;
                return Ok(());
            }
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(ScopeError::NotFound(name.to_owned())),
        }
    }

    /// Drops every binding in this scope.
    ///
    /// Closures stored in a scope hold that scope alive; clearing the
    /// global scope at interpreter teardown releases those cycles.
    pub fn clear(&self) {
        self.bindings.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number;

    fn num(v: i32) -> Value {
        Value::Number(number::from(v))
    }

    fn get_num(env: &Env, name: &str) -> Option<String> {
        env.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_get_walks_outward() {
        let global = Scope::global();
        global.set("x", num(1));
        let inner = Scope::child(&global);
        let innermost = Scope::child(&inner);
        assert_eq!(get_num(&innermost, "x").as_deref(), Some("1"));
        assert!(innermost.get("missing").is_none());
    }

    #[test]
    fn test_shadowing_inside_nested_scope() {
        let global = Scope::global();
        global.set("x", num(1));
        {
            let block = Scope::child(&global);
            block.set("x", num(2));
            assert_eq!(get_num(&block, "x").as_deref(), Some("2"));
        }
        assert_eq!(get_num(&global, "x").as_deref(), Some("1"));
    }

    #[test]
    fn test_set_stays_local() {
        let global = Scope::global();
        global.set("x", num(1));
        let block = Scope::child(&global);
        block.set("x", num(5));
        assert!(block.has_own("x"));
        assert_eq!(get_num(&global, "x").as_deref(), Some("1"));
    }

    #[test]
    fn test_assign_writes_through_to_declaring_scope() {
        let global = Scope::global();
        global.set("x", num(1));
        let block = Scope::child(&global);
        block.assign("x", num(5)).unwrap();
        assert!(!block.has_own("x"));
        assert_eq!(get_num(&global, "x").as_deref(), Some("5"));
    }

    #[test]
    fn test_assign_errors() {
        let global = Scope::global();
        global.declare("c", num(1), true);
        let block = Scope::child(&global);
        assert_eq!(
            block.assign("c", num(2)).unwrap_err().to_string(),
            "Assignment to constant variable 'c'"
        );
        assert_eq!(
            block.assign("nope", num(2)).unwrap_err().to_string(),
            "Identifier 'nope' not found"
        );
    }

    #[test]
    fn test_scope_released_when_last_reference_dropped() {
        let global = Scope::global();
        let block = Scope::child(&global);
        assert_eq!(Rc::strong_count(&global), 2);
        drop(block);
        assert_eq!(Rc::strong_count(&global), 1);
    }
}
