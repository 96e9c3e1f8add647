//! Lexical analysis module for Fluid source.
//!
//! This module contains the reference lexer that converts source code
//! into the token stream consumed by the parser. It handles:
//!
//! - Tokenization of source code using regex patterns
//! - Recognition of keywords, identifiers, literals, and operators
//! - Composite tokens such as `array<num, 4>`, `<{`, `|3>` and `??`
//! - Line/column tracking for diagnostics
//! - The presence hint that tells the parser whether `??` is postfix

pub mod lexer;
pub mod tokens;
