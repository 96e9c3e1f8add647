use tracing::trace;

use crate::{
    ast::{
        ast::Expr,
        expressions::{
            BinaryExpr, CallExpr, CallTarget, IndexExpr, LiteralExpr, MemberExpr, PipeExpr,
            PresenceExpr, TernaryExpr, UnaryExpr, UnaryOperator, UpdateExpr, UpdateOperator,
            VarArgExpr,
        },
        types::{Identifier, LiteralValue},
    },
    errors::errors::{fail, ParserErrorCode, ParserResult},
    lexer::tokens::{Token, TokenKind, TokenPayload},
    Position, Span,
};

use super::{
    choose::{is_pattern_group, parse_choose_expr},
    literals::{
        check_range_pattern, immediate_call, parse_arrow_function, parse_deferred_expr,
        parse_function_literal, parse_range_literal, parse_result_filter, parse_table_literal,
        parse_typed_array, parse_typed_deferred_expr,
    },
    lookups::{
        is_choose_relational_pattern, is_relational, match_binary_operator, MEMBERSHIP_POWER,
        PIPE_PRECEDENCE, TERNARY_PRECEDENCE,
    },
    parser::Parser,
    types::arrow_parameters,
};

/// Parses a full expression.
pub fn parse_expression(parser: &mut Parser) -> ParserResult<Expr> {
    parse_expr(parser, 0)
}

/// Precedence climbing. Operators whose left binding power does not exceed
/// `min_precedence` are left for the caller.
pub fn parse_expr(parser: &mut Parser, min_precedence: u8) -> ParserResult<Expr> {
    let start = parser.get_position();
    let mut left = parse_unary(parser)?;

    loop {
        let kind = parser.current_token_kind();

        match kind {
            TokenKind::Pipe => {
                if PIPE_PRECEDENCE <= min_precedence {
                    break;
                }

                let pipe = parser.advance();
                let limit = match pipe.payload {
                    TokenPayload::PipeLimit(limit) => limit,
                    _ => 0,
                };

                let right = parse_unary(parser)?;
                left = build_pipe(parser, left, right, limit, &pipe, start)?;
                continue;
            }
            TokenKind::Question => {
                if TERNARY_PRECEDENCE <= min_precedence {
                    break;
                }

                parser.advance();
                let if_true = parse_expr(parser, 0)?;
                parser.consume(TokenKind::TernarySep, ParserErrorCode::ExpectedToken)?;
                let if_false = parse_expr(parser, 0)?;

                left = Expr::Ternary(TernaryExpr {
                    condition: Box::new(left),
                    if_true: Box::new(if_true),
                    if_false: Box::new(if_false),
                    span: parser.span_from(start),
                });
                continue;
            }
            TokenKind::In => {
                if MEMBERSHIP_POWER.left <= min_precedence {
                    break;
                }

                let in_token = parser.advance();
                let right = parse_expr(parser, MEMBERSHIP_POWER.right)?;
                trace!(line = in_token.span.start.line, "membership rewritten to :contains");

                left = Expr::Call(CallExpr {
                    target: CallTarget::Method {
                        receiver: Box::new(right),
                        method: Identifier::new("contains", in_token.span),
                    },
                    arguments: vec![left],
                    forwards_multret: false,
                    span: parser.span_from(start),
                });
                continue;
            }
            _ => {}
        }

        let Some(info) = match_binary_operator(parser.current_token()) else {
            break;
        };

        if info.power.left <= min_precedence {
            break;
        }

        // Inside choose cases `< 5 ->` starts the next case rather than continuing this one
        if is_relational(kind)
            && parser.in_choose_expression()
            && !parser.in_guard_expression()
            && is_choose_relational_pattern(parser)
        {
            break;
        }

        parser.advance();
        let right = parse_expr(parser, info.power.right)?;

        left = Expr::Binary(BinaryExpr {
            left: Box::new(left),
            operator: info.operator,
            right: Box::new(right),
            span: parser.span_from(start),
        });
    }

    Ok(left)
}

fn build_pipe(
    parser: &Parser,
    lhs: Expr,
    rhs: Expr,
    limit: u32,
    pipe: &Token,
    start: Position,
) -> ParserResult<Expr> {
    let span = parser.span_from(start);

    let iterates = match &lhs {
        Expr::Range(_) => true,
        Expr::Call(call) => call.method_name() == Some("each"),
        _ => false,
    };

    let is_callback = matches!(
        rhs,
        Expr::Function(_) | Expr::Identifier(_) | Expr::Member(_) | Expr::Index(_)
    );

    if iterates && is_callback {
        trace!(line = pipe.span.start.line, "pipe rewritten to :each");

        return Ok(Expr::Call(CallExpr {
            target: CallTarget::Method {
                receiver: Box::new(lhs),
                method: Identifier::new("each", pipe.span),
            },
            arguments: vec![rhs],
            forwards_multret: false,
            span,
        }));
    }

    if !matches!(rhs, Expr::Call(_)) {
        return fail(
            ParserErrorCode::UnexpectedToken,
            pipe,
            "pipe operator requires function call on right-hand side",
        );
    }

    Ok(Expr::Pipe(PipeExpr {
        lhs: Box::new(lhs),
        rhs_call: Box::new(rhs),
        limit,
        span,
    }))
}

pub fn parse_unary(parser: &mut Parser) -> ParserResult<Expr> {
    let start = parser.get_position();

    let operator = match parser.current_token_kind() {
        TokenKind::Not => UnaryOperator::Not,
        TokenKind::Dash => UnaryOperator::Negate,
        TokenKind::Hash => UnaryOperator::Length,
        TokenKind::Tilde => UnaryOperator::BitNot,
        TokenKind::PlusPlus => {
            parser.advance();
            let target = parse_unary(parser)?;

            return Ok(Expr::Update(UpdateExpr {
                operator: UpdateOperator::Increment,
                is_prefix: true,
                target: Box::new(target),
                span: parser.span_from(start),
            }));
        }
        _ => return parse_primary(parser),
    };

    // The operand is the next unary or primary; `-a ^ 2` is `(-a) ^ 2`
    parser.advance();
    let operand = parse_unary(parser)?;

    Ok(Expr::Unary(UnaryExpr {
        operator,
        operand: Box::new(operand),
        span: parser.span_from(start),
    }))
}

pub fn literal(value: LiteralValue, span: Span) -> Expr {
    Expr::Literal(LiteralExpr { value, span })
}

pub fn identifier_from(token: &Token) -> Identifier {
    Identifier::new(token.value.clone(), token.span)
}

pub fn parse_primary(parser: &mut Parser) -> ParserResult<Expr> {
    let start = parser.get_position();
    let token = parser.current_token().clone();

    let base = match token.kind {
        TokenKind::Number => {
            let Some(value) = token.number() else {
                return fail(
                    ParserErrorCode::UnexpectedToken,
                    &token,
                    format!("malformed number '{}'", token.value),
                );
            };

            parser.advance();
            literal(LiteralValue::Number(value), token.span)
        }
        TokenKind::String => {
            parser.advance();
            literal(LiteralValue::String(token.value.clone()), token.span)
        }
        TokenKind::Nil => {
            parser.advance();
            literal(LiteralValue::Nil, token.span)
        }
        TokenKind::True => {
            parser.advance();
            literal(LiteralValue::Bool(true), token.span)
        }
        TokenKind::False => {
            parser.advance();
            literal(LiteralValue::Bool(false), token.span)
        }
        TokenKind::Identifier => {
            parser.advance();
            let name = identifier_from(&token);

            if parser.check(TokenKind::Arrow) {
                let parameters = arrow_parameters(vec![Expr::Identifier(name)], &token)?;
                return parse_arrow_function(parser, parameters, start);
            }

            Expr::Identifier(name)
        }
        TokenKind::Ellipsis => {
            parser.advance();
            Expr::VarArg(VarArgExpr { span: token.span })
        }
        TokenKind::Function => Expr::Function(parse_function_literal(parser, false)?),
        TokenKind::Thunk => {
            let function = parse_function_literal(parser, true)?;

            if function.parameters.is_empty() {
                immediate_call(function)
            } else {
                Expr::Function(function)
            }
        }
        TokenKind::Choose => parse_choose_expr(parser)?,
        TokenKind::OpenCurly => {
            if check_range_pattern(parser) {
                parse_range_literal(parser)?
            } else {
                parse_table_literal(parser)?
            }
        }
        TokenKind::OpenParen => match parse_parenthesized(parser)? {
            Parenthesized::Expr(expr) => expr,
            Parenthesized::Arrow(function) => return Ok(function),
        },
        // Filters apply to the call they prefix, so no suffixes follow
        TokenKind::OpenBracket => return parse_result_filter(parser),
        TokenKind::DeferredOpen => parse_deferred_expr(parser)?,
        TokenKind::DeferredTyped => parse_typed_deferred_expr(parser)?,
        TokenKind::ArrayTyped => parse_typed_array(parser)?,
        kind if kind.is_compound_assignment() => {
            return fail(
                ParserErrorCode::UnexpectedToken,
                &token,
                format!(
                    "'{}' is a statement, not an expression; use 'do ... end' for statements in arrow functions",
                    kind.text()
                ),
            );
        }
        _ => {
            return fail(
                ParserErrorCode::UnexpectedToken,
                &token,
                format!("Expected expression, got '{}'", token.describe()),
            );
        }
    };

    parse_suffixed(parser, base)
}

enum Parenthesized {
    Expr(Expr),
    Arrow(Expr),
}

fn parse_parenthesized(parser: &mut Parser) -> ParserResult<Parenthesized> {
    let start = parser.get_position();
    let open = parser.advance();

    if parser.match_token(TokenKind::CloseParen).is_some() {
        if parser.check(TokenKind::Arrow) {
            return Ok(Parenthesized::Arrow(parse_arrow_function(parser, vec![], start)?));
        }

        return fail(
            ParserErrorCode::UnexpectedToken,
            &open,
            "empty parentheses are not an expression",
        );
    }

    let mut expressions = parse_expression_list(parser)?;
    parser.consume(TokenKind::CloseParen, ParserErrorCode::ExpectedToken)?;

    if parser.check(TokenKind::Arrow) {
        let parameters = arrow_parameters(expressions, &open)?;
        return Ok(Parenthesized::Arrow(parse_arrow_function(parser, parameters, start)?));
    }

    if expressions.len() > 1 {
        return fail(
            ParserErrorCode::UnexpectedToken,
            &open,
            "multiple expressions in parentheses are not supported",
        );
    }

    match expressions.pop() {
        Some(expr) => Ok(Parenthesized::Expr(expr)),
        None => fail(
            ParserErrorCode::UnexpectedToken,
            &open,
            "empty parentheses are not an expression",
        ),
    }
}

/// Applies member, index, call and postfix suffixes to `base`, left to right.
pub fn parse_suffixed(parser: &mut Parser, mut base: Expr) -> ParserResult<Expr> {
    let start = base.get_span().start;

    loop {
        match parser.current_token_kind() {
            TokenKind::Dot | TokenKind::SafeField => {
                let safe = parser.advance().kind == TokenKind::SafeField;
                let name = parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?;

                let member = MemberExpr {
                    table: Box::new(base),
                    member: identifier_from(&name),
                    span: parser.span_from(start),
                };

                base = if safe { Expr::SafeMember(member) } else { Expr::Member(member) };
            }
            TokenKind::OpenBracket | TokenKind::SafeIndex => {
                let safe = parser.advance().kind == TokenKind::SafeIndex;
                let index = parse_expression(parser)?;
                parser.consume(TokenKind::CloseBracket, ParserErrorCode::ExpectedToken)?;

                let index = IndexExpr {
                    table: Box::new(base),
                    index: Box::new(index),
                    span: parser.span_from(start),
                };

                base = if safe { Expr::SafeIndex(index) } else { Expr::Index(index) };
            }
            TokenKind::Colon | TokenKind::SafeMethod => {
                let safe = parser.advance().kind == TokenKind::SafeMethod;
                let method = identifier_from(&parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?);
                let (arguments, forwards_multret) = parse_call_arguments(parser)?;

                let receiver = Box::new(base);
                let target = if safe {
                    CallTarget::SafeMethod { receiver, method }
                } else {
                    CallTarget::Method { receiver, method }
                };

                base = Expr::Call(CallExpr {
                    target,
                    arguments,
                    forwards_multret,
                    span: parser.span_from(start),
                });
            }
            TokenKind::OpenParen | TokenKind::OpenCurly | TokenKind::String => {
                if ends_choose_case(parser, &base) {
                    break;
                }

                let (arguments, forwards_multret) = parse_call_arguments(parser)?;

                base = Expr::Call(CallExpr {
                    target: CallTarget::Direct(Box::new(base)),
                    arguments,
                    forwards_multret,
                    span: parser.span_from(start),
                });
            }
            TokenKind::PlusPlus => {
                parser.advance();

                base = Expr::Update(UpdateExpr {
                    operator: UpdateOperator::Increment,
                    is_prefix: false,
                    target: Box::new(base),
                    span: parser.span_from(start),
                });
            }
            TokenKind::IfEmpty if parser.current_token().is_postfix_presence() => {
                parser.advance();

                base = Expr::Presence(PresenceExpr {
                    value: Box::new(base),
                    span: parser.span_from(start),
                });
            }
            _ => break,
        }
    }

    Ok(base)
}

/// Whether the call-argument token at the cursor really begins the next `choose` case.
fn ends_choose_case(parser: &Parser, base: &Expr) -> bool {
    match parser.current_token_kind() {
        TokenKind::String => matches!(parser.peek_kind(1), TokenKind::CaseArrow | TokenKind::When),
        TokenKind::OpenParen => {
            parser.in_choose_expression() && !base.is_callable() && is_pattern_group(parser)
        }
        TokenKind::OpenCurly => parser.in_choose_expression() && is_pattern_group(parser),
        _ => false,
    }
}

/// Parses `(args)`, a table argument or a string argument. Also reports whether
/// the last argument expands to multiple values.
pub fn parse_call_arguments(parser: &mut Parser) -> ParserResult<(Vec<Expr>, bool)> {
    let token = parser.current_token().clone();

    match token.kind {
        TokenKind::OpenParen => {
            parser.advance();

            if parser.match_token(TokenKind::CloseParen).is_some() {
                return Ok((vec![], false));
            }

            let arguments = parse_expression_list(parser)?;
            parser.consume(TokenKind::CloseParen, ParserErrorCode::ExpectedToken)?;

            let forwards_multret = matches!(arguments.last(), Some(Expr::Call(_)) | Some(Expr::VarArg(_)));
            Ok((arguments, forwards_multret))
        }
        TokenKind::OpenCurly => Ok((vec![parse_table_literal(parser)?], false)),
        TokenKind::String => {
            parser.advance();
            Ok((vec![literal(LiteralValue::String(token.value.clone()), token.span)], false))
        }
        _ => fail(ParserErrorCode::UnexpectedToken, &token, "invalid call arguments"),
    }
}

pub fn parse_expression_list(parser: &mut Parser) -> ParserResult<Vec<Expr>> {
    let mut expressions = vec![parse_expression(parser)?];

    while parser.match_token(TokenKind::Comma).is_some() {
        expressions.push(parse_expression(parser)?);
    }

    Ok(expressions)
}
