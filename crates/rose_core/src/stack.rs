//! Stack growth for deep recursion.
//!
//! The parser, semantic analyzer and evaluator all recurse over the syntax
//! tree.  Deeply nested input (`((((...))))`, long `else if` chains, deep
//! user recursion) would overflow the native stack, so each recursive entry
//! point runs through [`ensure_sufficient_stack`], which moves onto a freshly
//! allocated segment when the current one runs low.

/// Keep at least this much stack available before recursing (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, first growing the stack if less than [`RED_ZONE`] remains.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
