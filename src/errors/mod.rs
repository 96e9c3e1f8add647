//! Error types and error handling for the parser.
//!
//! This module defines the single diagnostic shape used by the lexer and
//! the parser. It includes:
//!
//! - `ParserError`, carrying an error code, the offending token and a message
//! - `ParserResult<T>`, returned by every fallible parse function
//! - `fail`, the one place failures are constructed
//! - Short suggestions shown next to rendered diagnostics

pub mod errors;
