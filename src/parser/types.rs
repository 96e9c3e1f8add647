//! Type annotation parsing.
//!
//! This module handles the places a type name can appear:
//!
//! - Parameter annotations (`name: type`)
//! - Variable annotations in `local`/`global` name lists
//! - Function return types (`: type` or `:<t1, t2, ...>`)
//!
//! Type names are resolved through `FluidType::parse_type_name`; anything it
//! does not know is rejected here rather than passed downstream.

use crate::{
    ast::{
        ast::Expr,
        types::{FluidType, FunctionParameter, FunctionReturnTypes},
    },
    errors::errors::{fail, ParserErrorCode, ParserResult},
    lexer::tokens::{Token, TokenKind},
};

use super::{expr::identifier_from, parser::Parser};

/// Name text of a token that may spell a type, if any.
fn type_token_name(token: &Token) -> Option<&str> {
    match token.kind {
        TokenKind::Identifier => Some(token.value.as_str()),
        TokenKind::Function => Some("function"),
        TokenKind::Nil => Some("nil"),
        _ => None,
    }
}

/// Reads the type name following an already consumed `:`.
pub fn parse_type_annotation(parser: &mut Parser) -> ParserResult<FluidType> {
    let token = parser.current_token().clone();

    let Some(name) = type_token_name(&token) else {
        return fail(ParserErrorCode::ExpectedTypeName, &token, "Expected type name after ':'");
    };

    let type_ = FluidType::parse_type_name(name);
    if !type_.is_known() {
        return fail(
            ParserErrorCode::UnknownTypeName,
            &token,
            format!("Unknown type name '{}'; expected a valid type name", name),
        );
    }

    parser.advance();
    Ok(type_)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterList {
    pub parameters: Vec<FunctionParameter>,
    pub is_vararg: bool,
}

/// Parses `(a, b: type, ...)`.
///
/// With `allow_optional` a missing list is an empty one, as `defer` allows.
pub fn parse_parameter_list(
    parser: &mut Parser,
    allow_optional: bool,
    is_thunk: bool,
) -> ParserResult<ParameterList> {
    if allow_optional && !parser.check(TokenKind::OpenParen) {
        return Ok(ParameterList::default());
    }

    parser.consume(TokenKind::OpenParen, ParserErrorCode::ExpectedToken)?;
    let mut list = ParameterList::default();

    if !parser.check(TokenKind::CloseParen) {
        loop {
            if let Some(ellipsis) = parser.match_token(TokenKind::Ellipsis) {
                if is_thunk {
                    return fail(
                        ParserErrorCode::UnexpectedToken,
                        &ellipsis,
                        "thunk functions do not support varargs",
                    );
                }

                // `...` is always last
                list.is_vararg = true;
                break;
            }

            let name_token = parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?;
            let mut name = identifier_from(&name_token);
            let mut type_ = FluidType::Any;

            if parser.match_token(TokenKind::Colon).is_some() {
                type_ = parse_type_annotation(parser)?;
                name.type_annotation = Some(type_);
            }

            list.parameters.push(FunctionParameter {
                name,
                type_,
                is_self: false,
            });

            if parser.match_token(TokenKind::Comma).is_none() {
                break;
            }
        }
    }

    parser.consume(TokenKind::CloseParen, ParserErrorCode::ExpectedToken)?;
    Ok(list)
}

fn parse_return_type_name(parser: &mut Parser) -> ParserResult<FluidType> {
    let token = parser.current_token().clone();

    let Some(name) = type_token_name(&token) else {
        return fail(ParserErrorCode::ExpectedTypeName, &token, "Expected type name after ':'");
    };

    let type_ = FluidType::parse_type_name(name);
    if !type_.is_known() {
        return fail(
            ParserErrorCode::UnexpectedToken,
            &token,
            format!("unknown type name '{}'", name),
        );
    }

    parser.advance();
    Ok(type_)
}

/// Parses an optional return type annotation after a parameter list.
pub fn parse_return_types(parser: &mut Parser) -> ParserResult<FunctionReturnTypes> {
    if parser.match_token(TokenKind::Colon).is_none() {
        return Ok(FunctionReturnTypes::implicit());
    }

    if parser.match_token(TokenKind::Less).is_none() {
        let type_ = parse_return_type_name(parser)?;

        return Ok(FunctionReturnTypes {
            types: vec![type_],
            is_variadic: false,
            is_explicit: true,
        });
    }

    let max_types = parser.get_config().max_return_types;
    let mut types: Vec<FluidType> = vec![];
    let mut is_variadic = false;

    loop {
        if parser.match_token(TokenKind::Ellipsis).is_some() {
            is_variadic = true;
            break;
        }

        let type_ = parse_return_type_name(parser)?;

        if types.len() < max_types {
            types.push(type_);
        } else if let Some(last) = types.last_mut() {
            *last = FluidType::Any;
        }

        if parser.match_token(TokenKind::Comma).is_none() {
            break;
        }
    }

    if parser.match_token(TokenKind::Greater).is_none() {
        let token = parser.current_token();
        return fail(
            ParserErrorCode::ExpectedToken,
            token,
            "expected '>' to close return type list",
        );
    }

    Ok(FunctionReturnTypes {
        types,
        is_variadic,
        is_explicit: true,
    })
}

/// Turns the expressions written before `=>` into parameters.
pub fn arrow_parameters(expressions: Vec<Expr>, token: &Token) -> ParserResult<Vec<FunctionParameter>> {
    expressions
        .into_iter()
        .map(|expr| match expr {
            Expr::Identifier(name) => Ok(FunctionParameter {
                name,
                type_: FluidType::Any,
                is_self: false,
            }),
            _ => fail(
                ParserErrorCode::ExpectedIdentifier,
                token,
                "arrow function parameters must be identifiers",
            ),
        })
        .collect()
}
