//! Literal and sugar-carrying expression forms.
//!
//! Tables, ranges, function and arrow-function literals, result filters,
//! deferred blocks and typed arrays. Deferred blocks and typed arrays are
//! desugared into ordinary calls here, so later stages never see them.

use tracing::trace;

use crate::{
    ast::{
        ast::{Expr, Stmt},
        expressions::{
            infer_expression_type, AssignmentOperator, CallExpr, CallTarget, FunctionExpr, MemberExpr,
            RangeExpr, ResultFilterExpr, TableExpr, TableField, TableFieldKind, UnaryExpr,
            UnaryOperator,
        },
        statements::{BlockStmt, ExpressionStmt, ReturnStmt, VarDeclStmt},
        types::{FluidType, FunctionParameter, FunctionReturnTypes, Identifier, LiteralValue},
    },
    errors::errors::{fail, ParserErrorCode, ParserResult},
    lexer::tokens::{ArraySizeHint, TokenKind, TokenPayload},
    Position, Span,
};

use super::{
    expr::{identifier_from, literal, parse_expression, parse_primary, parse_unary},
    parser::{parse_block, Parser},
    types::{parse_parameter_list, parse_return_types},
};

/// Longest result filter pattern; one bit of the keep mask per position.
const MAX_FILTER_POSITIONS: u32 = 64;

pub fn parse_table_literal(parser: &mut Parser) -> ParserResult<Expr> {
    let start = parser.get_position();
    parser.consume(TokenKind::OpenCurly, ParserErrorCode::ExpectedToken)?;

    let mut fields = vec![];
    let mut has_array_part = false;

    while !parser.check(TokenKind::CloseCurly) {
        let field_start = parser.get_position();

        let (kind, name, key, value) = if parser.match_token(TokenKind::OpenBracket).is_some() {
            let key = parse_expression(parser)?;
            parser.consume(TokenKind::CloseBracket, ParserErrorCode::ExpectedToken)?;
            parser.consume(TokenKind::Assignment, ParserErrorCode::ExpectedToken)?;
            (TableFieldKind::Computed, None, Some(key), parse_expression(parser)?)
        } else if parser.check(TokenKind::Identifier) && parser.peek_kind(1) == TokenKind::Assignment {
            let name = identifier_from(&parser.advance());
            parser.advance();
            (TableFieldKind::Record, Some(name), None, parse_expression(parser)?)
        } else {
            has_array_part = true;
            (TableFieldKind::Array, None, None, parse_expression(parser)?)
        };

        fields.push(TableField {
            kind,
            name,
            key,
            value,
            span: parser.span_from(field_start),
        });

        if parser.match_token(TokenKind::Comma).is_none() && parser.match_token(TokenKind::Semicolon).is_none() {
            break;
        }
    }

    parser.consume(TokenKind::CloseCurly, ParserErrorCode::ExpectedToken)?;

    Ok(Expr::Table(TableExpr {
        fields,
        has_array_part,
        span: parser.span_from(start),
    }))
}

/// Token count of a range operand (`n`, `name` or `-n`) starting `offset` tokens ahead.
fn range_operand_len(parser: &Parser, offset: usize) -> usize {
    match parser.peek_kind(offset) {
        TokenKind::Number | TokenKind::Identifier => 1,
        TokenKind::Dash if parser.peek_kind(offset + 1) == TokenKind::Number => 2,
        _ => 0,
    }
}

/// Whether the `{` at the cursor starts `{a..b}` or `{a...b}` rather than a table.
pub fn check_range_pattern(parser: &Parser) -> bool {
    let first = range_operand_len(parser, 1);
    if first == 0 {
        return false;
    }

    let operator = 1 + first;
    if !matches!(parser.peek_kind(operator), TokenKind::Concat | TokenKind::Ellipsis) {
        return false;
    }

    let second = range_operand_len(parser, operator + 1);
    second != 0 && parser.peek_kind(operator + 1 + second) == TokenKind::CloseCurly
}

fn parse_range_operand(parser: &mut Parser) -> ParserResult<Expr> {
    let operand = parse_unary(parser)?;

    // `-5` becomes a negative literal so constant ranges stay constant
    Ok(match operand {
        Expr::Unary(UnaryExpr {
            operator: UnaryOperator::Negate,
            operand,
            span,
        }) => match operand.as_number() {
            Some(value) => literal(LiteralValue::Number(-value), span),
            None => Expr::Unary(UnaryExpr {
                operator: UnaryOperator::Negate,
                operand,
                span,
            }),
        },
        operand => operand,
    })
}

pub fn parse_range_literal(parser: &mut Parser) -> ParserResult<Expr> {
    let start = parser.get_position();
    parser.consume(TokenKind::OpenCurly, ParserErrorCode::ExpectedToken)?;

    let first = parse_range_operand(parser)?;
    let inclusive = parser.advance().kind == TokenKind::Ellipsis;
    let stop = parse_range_operand(parser)?;

    parser.consume(TokenKind::CloseCurly, ParserErrorCode::ExpectedToken)?;

    Ok(Expr::Range(RangeExpr {
        start: Box::new(first),
        stop: Box::new(stop),
        inclusive,
        span: parser.span_from(start),
    }))
}

/// Parses `function (...) ... end` or `thunk (...) ... end` with the keyword at the cursor.
pub fn parse_function_literal(parser: &mut Parser, is_thunk: bool) -> ParserResult<FunctionExpr> {
    let start = parser.get_position();
    parser.advance();
    parse_function_body(parser, is_thunk, start)
}

/// Parses the parameter list, return types and body of a function whose
/// keyword and name have already been consumed.
pub fn parse_function_body(parser: &mut Parser, is_thunk: bool, start: Position) -> ParserResult<FunctionExpr> {
    let params = parse_parameter_list(parser, false, is_thunk)?;
    let return_types = parse_return_types(parser)?;

    let body = parse_block(parser, &[TokenKind::End])?;
    parser.consume(TokenKind::End, ParserErrorCode::ExpectedToken)?;

    let thunk_return_type = if is_thunk {
        return_types.first().unwrap_or(FluidType::Any)
    } else {
        FluidType::Any
    };

    Ok(FunctionExpr {
        parameters: params.parameters,
        is_vararg: params.is_vararg,
        is_thunk,
        thunk_return_type,
        return_types,
        body,
        annotations: vec![],
        span: parser.span_from(start),
    })
}

/// Calls `function` with no arguments.
pub fn immediate_call(function: FunctionExpr) -> Expr {
    let span = function.span;

    Expr::Call(CallExpr {
        target: CallTarget::Direct(Box::new(Expr::Function(function))),
        arguments: vec![],
        forwards_multret: false,
        span,
    })
}

fn return_stmt(value: Expr) -> Stmt {
    let span = *value.get_span();

    Stmt::Return(ReturnStmt {
        forwards_call: matches!(value, Expr::Call(_)),
        values: vec![value],
        span,
    })
}

/// Parses the `=> body` part of an arrow function whose parameters are already known.
pub fn parse_arrow_function(
    parser: &mut Parser,
    parameters: Vec<FunctionParameter>,
    start: Position,
) -> ParserResult<Expr> {
    parser.consume(TokenKind::Arrow, ParserErrorCode::ExpectedToken)?;
    let mut return_types = FunctionReturnTypes::implicit();

    let body = if parser.match_token(TokenKind::Do).is_some() {
        let block = parse_block(parser, &[TokenKind::End])?;
        parser.consume(TokenKind::End, ParserErrorCode::ExpectedToken)?;
        block
    } else {
        // `=> num: expr` only when the name is a known type; `=> value:method()` is a call
        if parser.check(TokenKind::Identifier) && parser.peek_kind(1) == TokenKind::Colon {
            let type_ = FluidType::parse_type_name(&parser.current_token().value);

            if type_.is_known() {
                parser.advance();
                parser.advance();

                return_types = FunctionReturnTypes {
                    types: vec![type_],
                    is_variadic: false,
                    is_explicit: true,
                };
            }
        }

        let value = parse_expression(parser)?;

        let next = parser.current_token();
        if next.kind.is_compound_assignment() {
            return fail(
                ParserErrorCode::UnexpectedToken,
                next,
                format!(
                    "'{}' is a statement, not an expression; use 'do ... end' for statement bodies in arrow functions",
                    next.kind.text()
                ),
            );
        }

        let span = *value.get_span();
        BlockStmt {
            body: vec![return_stmt(value)],
            span,
        }
    };

    Ok(Expr::Function(FunctionExpr {
        parameters,
        is_vararg: false,
        is_thunk: false,
        thunk_return_type: FluidType::Any,
        return_types,
        body,
        annotations: vec![],
        span: parser.span_from(start),
    }))
}

/// Parses `[_*]call()`. A filter that keeps every result, including the
/// trailing ones, is dropped and the bare call returned.
pub fn parse_result_filter(parser: &mut Parser) -> ParserResult<Expr> {
    let start = parser.get_position();
    let open = parser.advance();

    let mut keep_mask: u64 = 0;
    let mut positions: u32 = 0;
    let mut trailing_keep = false;

    while !parser.check(TokenKind::CloseBracket) {
        let token = parser.current_token().clone();

        let slots: Vec<bool> = match token.kind {
            TokenKind::Star => vec![true],
            // `__` lexes as one identifier, one position per underscore
            TokenKind::Identifier if token.value.chars().all(|ch| ch == '_') => {
                token.value.chars().map(|_| false).collect()
            }
            _ => {
                return fail(
                    ParserErrorCode::UnexpectedToken,
                    &token,
                    "result filter pattern expects '_' or '*'",
                );
            }
        };

        for keep in slots {
            if positions >= MAX_FILTER_POSITIONS {
                return fail(
                    ParserErrorCode::UnexpectedToken,
                    &token,
                    "result filter pattern too long (max 64 positions)",
                );
            }

            if keep {
                keep_mask |= 1 << positions;
            }

            trailing_keep = keep;
            positions += 1;
        }

        parser.advance();
    }

    parser.consume(TokenKind::CloseBracket, ParserErrorCode::ExpectedToken)?;

    let expression = parse_primary(parser)?;
    if !matches!(expression, Expr::Call(_)) {
        return fail(
            ParserErrorCode::UnexpectedToken,
            &open,
            "result filter requires a function call",
        );
    }

    let full_mask = if positions >= MAX_FILTER_POSITIONS {
        u64::MAX
    } else {
        (1u64 << positions) - 1
    };

    if trailing_keep && keep_mask == full_mask {
        return Ok(expression);
    }

    trace!(mask = keep_mask, positions, trailing_keep, "result filter");

    Ok(Expr::ResultFilter(ResultFilterExpr {
        expression: Box::new(expression),
        keep_mask,
        explicit_count: positions as u8,
        trailing_keep,
        span: parser.span_from(start),
    }))
}

/// Wraps `value` in an immediately invoked parameterless thunk.
fn deferred_thunk_call(value: Expr, thunk_return_type: FluidType, span: Span) -> Expr {
    immediate_call(FunctionExpr {
        parameters: vec![],
        is_vararg: false,
        is_thunk: true,
        thunk_return_type,
        return_types: FunctionReturnTypes::implicit(),
        body: BlockStmt {
            body: vec![return_stmt(value)],
            span,
        },
        annotations: vec![],
        span,
    })
}

/// `<{ expr }>`
pub fn parse_deferred_expr(parser: &mut Parser) -> ParserResult<Expr> {
    let start = parser.get_position();
    parser.advance();

    let value = parse_expression(parser)?;

    if parser.match_token(TokenKind::DeferredClose).is_none() {
        return fail(
            ParserErrorCode::ExpectedToken,
            parser.current_token(),
            "Expected '}>' to close deferred expression",
        );
    }

    let thunk_return_type = infer_expression_type(&value);
    trace!(line = start.line, return_type = %thunk_return_type, "deferred expression");

    Ok(deferred_thunk_call(value, thunk_return_type, parser.span_from(start)))
}

/// `<type{ expr }>`
pub fn parse_typed_deferred_expr(parser: &mut Parser) -> ParserResult<Expr> {
    let start = parser.get_position();
    let token = parser.current_token().clone();

    let type_name = match &token.payload {
        TokenPayload::DeferredType(name) => name.as_str(),
        _ => "",
    };

    let thunk_return_type = FluidType::parse_type_name(type_name);
    if !thunk_return_type.is_known() {
        return fail(
            ParserErrorCode::UnknownTypeName,
            &token,
            format!("Unknown type name '{}' in typed deferred expression", type_name),
        );
    }

    parser.advance();
    let value = parse_expression(parser)?;

    if parser.match_token(TokenKind::DeferredClose).is_none() {
        return fail(
            ParserErrorCode::ExpectedToken,
            parser.current_token(),
            "Expected '}>' to close typed deferred expression",
        );
    }

    trace!(line = start.line, return_type = %thunk_return_type, "typed deferred expression");
    Ok(deferred_thunk_call(value, thunk_return_type, parser.span_from(start)))
}

fn name(symbol: &str, span: Span) -> Expr {
    Expr::Identifier(Identifier::new(symbol, span))
}

fn array_call(function: &str, arguments: Vec<Expr>, span: Span) -> Expr {
    Expr::Call(CallExpr {
        target: CallTarget::Direct(Box::new(Expr::Member(MemberExpr {
            table: Box::new(name("array", span)),
            member: Identifier::new(function, span),
            span,
        }))),
        arguments,
        forwards_multret: false,
        span,
    })
}

/// Parses `array<type[, size]> [{ values }]` into `array.of`/`array.new` calls.
pub fn parse_typed_array(parser: &mut Parser) -> ParserResult<Expr> {
    let start = parser.get_position();
    let token = parser.advance();

    let TokenPayload::ArrayType { element, size } = &token.payload else {
        return fail(ParserErrorCode::UnexpectedToken, &token, "malformed array type");
    };

    let mut size_expr = None;
    let mut literal_size = None;

    match size {
        ArraySizeHint::None => {}
        ArraySizeHint::Literal(value) => literal_size = Some(*value),
        ArraySizeHint::Expression => {
            size_expr = Some(parse_unary(parser)?);

            if parser.match_token(TokenKind::Greater).is_none() {
                return fail(
                    ParserErrorCode::ExpectedToken,
                    parser.current_token(),
                    "Expected '>' to close array<type, expr>",
                );
            }
        }
    }

    let mut values = vec![];

    if parser.check(TokenKind::OpenCurly) {
        let Expr::Table(table) = parse_table_literal(parser)? else {
            return fail(ParserErrorCode::UnexpectedToken, &token, "malformed array initialiser");
        };

        for field in table.fields {
            if field.kind != TableFieldKind::Array {
                return fail(
                    ParserErrorCode::UnexpectedToken,
                    &token,
                    "Array initialiser can only contain sequential values, not key-value pairs",
                );
            }

            values.push(field.value);
        }
    }

    let span = parser.span_from(start);
    let type_name = literal(LiteralValue::String(element.clone()), token.span);

    trace!(line = start.line, element = %element, values = values.len(), "typed array");

    if values.is_empty() {
        let size = size_expr.unwrap_or_else(|| {
            literal(LiteralValue::Number(literal_size.unwrap_or(0) as f64), token.span)
        });

        return Ok(array_call("new", vec![size, type_name], span));
    }

    let needs_resize = size_expr.is_some() || literal_size.is_some_and(|size| size as usize > values.len());

    let mut arguments = vec![type_name];
    arguments.extend(values);
    let array_of = array_call("of", arguments, span);

    if !needs_resize {
        return Ok(array_of);
    }

    // (function() local _arr = array.of(...); array.resize(_arr, size); return _arr end)()
    let size = size_expr.unwrap_or_else(|| {
        literal(LiteralValue::Number(literal_size.unwrap_or(0) as f64), token.span)
    });

    let body = vec![
        Stmt::LocalDecl(VarDeclStmt {
            operator: AssignmentOperator::Plain,
            names: vec![Identifier::new("_arr", span)],
            values: vec![array_of],
            span,
        }),
        Stmt::Expression(ExpressionStmt {
            expression: array_call("resize", vec![name("_arr", span), size], span),
            span,
        }),
        return_stmt(name("_arr", span)),
    ];

    Ok(immediate_call(FunctionExpr {
        parameters: vec![],
        is_vararg: false,
        is_thunk: false,
        thunk_return_type: FluidType::Any,
        return_types: FunctionReturnTypes::implicit(),
        body: BlockStmt { body, span },
        annotations: vec![],
        span,
    }))
}
