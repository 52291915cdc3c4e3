/// Native built-ins and user closures.
pub mod function;
/// Insertion-ordered string-keyed objects.
pub mod object;
/// Top-level Rose value enum, truthiness, equality and printing.
pub mod value;
