use std::fmt::Display;

use thiserror::Error;

use crate::{lexer::tokens::Token, Position};

pub type ParserResult<T> = Result<T, ParserError>;

/// A single parse diagnostic.
///
/// Carries the offending token so the driver can render `file:line:column: message`
/// without going back to the token stream.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ParserError {
    code: ParserErrorCode,
    token: Token,
    message: String,
}

impl ParserError {
    pub fn new(code: ParserErrorCode, token: Token, message: impl Into<String>) -> Self {
        ParserError {
            code,
            token,
            message: message.into(),
        }
    }

    pub fn get_code(&self) -> ParserErrorCode {
        self.code
    }

    pub fn get_token(&self) -> &Token {
        &self.token
    }

    pub fn get_message(&self) -> &str {
        &self.message
    }

    pub fn get_position(&self) -> Position {
        self.token.span.start
    }

    pub fn get_error_name(&self) -> &str {
        match self.code {
            ParserErrorCode::ExpectedIdentifier => "ExpectedIdentifier",
            ParserErrorCode::ExpectedToken => "ExpectedToken",
            ParserErrorCode::ExpectedTypeName => "ExpectedTypeName",
            ParserErrorCode::UnknownTypeName => "UnknownTypeName",
            ParserErrorCode::UnexpectedToken => "UnexpectedToken",
            ParserErrorCode::UnrecognisedToken => "UnrecognisedToken",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match self.code {
            ParserErrorCode::ExpectedIdentifier => ErrorTip::Suggestion(format!(
                "found `{}` where a name was expected",
                self.token.value
            )),
            ParserErrorCode::ExpectedTypeName | ParserErrorCode::UnknownTypeName => {
                ErrorTip::Suggestion(String::from(
                    "valid types are any, nil, bool, num, str, table, array, func, thread, cdata and obj",
                ))
            }
            ParserErrorCode::UnrecognisedToken => ErrorTip::Suggestion(format!(
                "`{}` is not valid in Fluid source",
                self.token.value
            )),
            ParserErrorCode::ExpectedToken | ParserErrorCode::UnexpectedToken => ErrorTip::None,
        }
    }
}

/// Creates a failed `ParserResult`. Every parse function reports errors through here.
pub fn fail<T>(code: ParserErrorCode, token: &Token, message: impl Into<String>) -> ParserResult<T> {
    Err(ParserError::new(code, token.clone(), message))
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserErrorCode {
    #[error("expected an identifier")]
    ExpectedIdentifier,
    #[error("expected a specific token")]
    ExpectedToken,
    #[error("expected a type name")]
    ExpectedTypeName,
    #[error("unknown type name")]
    UnknownTypeName,
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("unrecognised token")]
    UnrecognisedToken,
}
