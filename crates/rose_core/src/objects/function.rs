//! Rose function values.
//!
//! A [`Function`] is either a **native** built-in implemented in Rust or a
//! **closure**: a parsed [`FunctionNode`] paired with the scope that was
//! active when the `function` expression or declaration was evaluated.
//!
//! The closure holds its scope through an [`Env`] (`Rc`), so the scope lives
//! as long as any closure created in it.

use std::fmt;
use std::rc::Rc;

use crate::error::RoseResult;
use crate::interpreter::Context;
use crate::interpreter::env::Env;
use crate::objects::value::Value;
use crate::parser::ast::FunctionNode;

/// Signature of a built-in function.
///
/// Built-ins receive the interpreter [`Context`] and the evaluated
/// arguments.  Errors are reported as [`crate::RoseError::Native`]; the
/// evaluator attaches the call-site location.
pub type NativeFn = fn(&mut Context, &[Value]) -> RoseResult<Value>;

/// A callable value.
pub enum Function {
    /// A built-in implemented in Rust.
    Native {
        /// Name used in diagnostics.
        name: &'static str,
        /// The implementation.
        func: NativeFn,
    },
    /// A user-defined function and its captured scope.
    Closure {
        /// The function's parameters and body.
        node: Rc<FunctionNode>,
        /// The scope the function was created in.
        scope: Env,
    },
}

impl Function {
    /// The function's name, or `""` for anonymous closures.
    pub fn name(&self) -> &str {
        match self {
            Self::Native { name, .. } => name,
            Self::Closure { node, .. } => node.name.as_ref().map_or("", |n| n.name.as_str()),
        }
    }

    /// Returns `true` for built-ins.
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native { .. })
    }
}

// Implement Debug manually: fn pointers print as addresses and a closure's
// scope may contain the closure itself.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native { name, .. } => write!(f, "Native({name})"),
            Self::Closure { node, .. } => f
                .debug_struct("Closure")
                .field("name", &self.name())
                .field("params", &node.params.len())
                .field("is_async", &node.is_async)
                .finish(),
        }
    }
}
