//! Parser module for building the Fluid Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into an Abstract Syntax Tree. Expressions use precedence climbing
//! with left/right binding powers; statements use recursive descent
//! dispatched on the leading token. It handles:
//!
//! - Statement parsing (declarations, functions, control flow, exceptions)
//! - Expression parsing (binary ops, calls, pipes, ternaries, literals)
//! - `choose` pattern matching
//! - Type annotations on parameters, names and return values
//!
//! The first error aborts the parse; there is no recovery.

pub mod choose;
pub mod expr;
pub mod literals;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
