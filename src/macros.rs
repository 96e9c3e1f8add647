//! Utility macros for the lexer.
//!
//! This module defines helper macros used when building the token stream:
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_DEFAULT_HANDLER!` - Creates a default lexer handler for fixed-text tokens
//!
//! These macros reduce boilerplate in the lexer implementation.

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The token's string value
/// * `$span` - The source span
/// * `$payload` - Optional decoded payload, `TokenPayload::None` when omitted
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Number, "42".to_string(), span, TokenPayload::Number(42.0));
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: $span,
            payload: TokenPayload::None,
        }
    };
    ($kind:expr, $value:expr, $span:expr, $payload:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: $span,
            payload: $payload,
        }
    };
}

/// Creates a default lexer handler for tokens whose text never varies.
///
/// The generated handler records the token with a span covering `$value`
/// and moves the lexer past it, keeping line and column in step.
///
/// # Arguments
///
/// * `$kind` - The TokenKind to create
/// * `$value` - The literal string value (used for length calculation)
///
/// # Example
///
/// ```ignore
/// pattern("\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+"))
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _regex: &Regex| {
            let start = lexer.position();
            lexer.advance_n($value.len());
            let end = lexer.position();
            lexer.push(MK_TOKEN!($kind, String::from($value), Span { start, end }));
            Ok(())
        }
    };
}
