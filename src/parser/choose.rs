//! `choose` expressions.
//!
//! ```text
//! choose <scrutinee> from
//!    <pattern> [when <guard>] -> <result>
//!    ...
//!    [else -> <result>]
//! end
//! ```
//!
//! Cases are written back to back with no separator, so the expression parser
//! needs help deciding where one case ends. While the cases are parsed the
//! parser runs with the choose flag set, which makes relational operators,
//! parenthesised groups and table arguments stop in front of a token sequence
//! that can only be the next pattern.

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{Expr, Stmt},
        expressions::{
            ChooseCase, ChooseExpr, ChoosePattern, ChooseResult, ChooseScrutinee, RelationalOperator,
        },
        statements::AssignmentStmt,
    },
    errors::errors::{fail, ParserErrorCode, ParserResult},
    lexer::tokens::TokenKind,
};

use super::{
    expr::{parse_expression, parse_expression_list},
    lookups::assignment_operator,
    parser::Parser,
};

/// Where the bracket at `open` is closed, as the offset of the token after the
/// match, and how many commas sit directly inside it.
fn scan_group(parser: &Parser, open: usize) -> Option<(usize, usize)> {
    let limit = parser.get_config().lookahead_limit;
    let mut depth = 0usize;
    let mut commas = 0usize;
    let mut pos = open;

    while pos < limit {
        match parser.peek_kind(pos) {
            TokenKind::OpenParen
            | TokenKind::OpenCurly
            | TokenKind::OpenBracket
            | TokenKind::SafeIndex
            | TokenKind::DeferredOpen
            | TokenKind::DeferredTyped => depth += 1,
            TokenKind::CloseParen
            | TokenKind::CloseCurly
            | TokenKind::CloseBracket
            | TokenKind::DeferredClose => {
                if depth == 0 {
                    return None;
                }

                depth -= 1;
                if depth == 0 {
                    return Some((pos + 1, commas));
                }
            }
            TokenKind::Comma if depth == 1 => commas += 1,
            TokenKind::EOF => return None,
            _ => {}
        }

        pos += 1;
    }

    None
}

/// True when the bracket at the cursor closes right before `->` or `when`, which
/// makes it a pattern (`(1, _) ->`, `{ kind = "x" } when ...`) and not call arguments.
pub fn is_pattern_group(parser: &Parser) -> bool {
    match scan_group(parser, 0) {
        Some((after, _)) => matches!(parser.peek_kind(after), TokenKind::CaseArrow | TokenKind::When),
        None => false,
    }
}

/// Arity of a leading `(a, b) ->` pattern when the scrutinee is a single expression.
fn infer_tuple_arity(parser: &Parser) -> usize {
    if !parser.check(TokenKind::OpenParen) {
        return 0;
    }

    match scan_group(parser, 0) {
        Some((after, commas))
            if commas > 0
                && matches!(parser.peek_kind(after), TokenKind::CaseArrow | TokenKind::When) =>
        {
            commas + 1
        }
        _ => 0,
    }
}

fn parse_scrutinee(parser: &mut Parser) -> ParserResult<ChooseScrutinee> {
    if parser.match_token(TokenKind::OpenParen).is_none() {
        return Ok(ChooseScrutinee::Single(Box::new(parse_expression(parser)?)));
    }

    let mut values = parse_expression_list(parser)?;
    parser.consume(TokenKind::CloseParen, ParserErrorCode::ExpectedToken)?;

    if values.len() > 1 {
        return Ok(ChooseScrutinee::Tuple(values));
    }

    match values.pop() {
        Some(value) => Ok(ChooseScrutinee::Single(Box::new(value))),
        None => {
            let token = parser.current_token();
            fail(ParserErrorCode::UnexpectedToken, token, "expected choose scrutinee")
        }
    }
}

pub fn parse_choose_expr(parser: &mut Parser) -> ParserResult<Expr> {
    let start = parser.get_position();
    let choose = parser.consume(TokenKind::Choose, ParserErrorCode::ExpectedToken)?;

    let scrutinee = parse_scrutinee(parser)?;
    parser.consume(TokenKind::From, ParserErrorCode::ExpectedToken)?;

    let mut inferred_tuple_arity = 0;
    let tuple_arity = match &scrutinee {
        ChooseScrutinee::Tuple(values) => values.len(),
        ChooseScrutinee::Single(_) => {
            inferred_tuple_arity = infer_tuple_arity(parser);
            inferred_tuple_arity
        }
    };

    let cases = parser.with_choose_context(true, false, |parser| parse_cases(parser, tuple_arity))?;
    parser.consume(TokenKind::End, ParserErrorCode::ExpectedToken)?;

    debug!(
        line = choose.span.start.line,
        cases = cases.len(),
        tuple_arity,
        "parsed choose expression"
    );

    Ok(Expr::Choose(ChooseExpr {
        scrutinee,
        cases,
        inferred_tuple_arity,
        span: parser.span_from(start),
    }))
}

fn parse_cases(parser: &mut Parser, tuple_arity: usize) -> ParserResult<Vec<ChooseCase>> {
    let mut cases: Vec<ChooseCase> = vec![];

    while !parser.check(TokenKind::End) && !parser.check(TokenKind::EOF) {
        if cases.last().is_some_and(ChooseCase::is_else) {
            let token = parser.current_token();
            return fail(
                ParserErrorCode::UnexpectedToken,
                token,
                "'else' must be the last case in choose expression",
            );
        }

        cases.push(parse_case(parser, tuple_arity)?);
    }

    Ok(cases)
}

fn parse_case(parser: &mut Parser, tuple_arity: usize) -> ParserResult<ChooseCase> {
    let start = parser.get_position();
    let pattern = parse_pattern(parser, tuple_arity)?;

    let guard = if parser.match_token(TokenKind::When).is_some() {
        Some(parser.with_choose_context(false, true, parse_expression)?)
    } else {
        None
    };

    parser.consume(TokenKind::CaseArrow, ParserErrorCode::ExpectedToken)?;
    let result = parse_case_result(parser)?;

    trace!(
        line = start.line,
        guarded = guard.is_some(),
        statement = matches!(result, ChooseResult::Statement(_)),
        "choose case"
    );

    Ok(ChooseCase {
        pattern,
        guard,
        result,
        span: parser.span_from(start),
    })
}

fn parse_pattern(parser: &mut Parser, tuple_arity: usize) -> ParserResult<ChoosePattern> {
    let token = parser.current_token().clone();

    match token.kind {
        TokenKind::Else => {
            parser.advance();
            Ok(ChoosePattern::Else)
        }
        TokenKind::OpenParen if tuple_arity > 0 => parse_tuple_pattern(parser, tuple_arity),
        TokenKind::Less | TokenKind::Greater => {
            parser.advance();
            let inclusive = parser.match_token(TokenKind::Assignment).is_some();

            let operator = match (token.kind, inclusive) {
                (TokenKind::Less, false) => RelationalOperator::LessThan,
                (TokenKind::Less, true) => RelationalOperator::LessEqual,
                (_, false) => RelationalOperator::GreaterThan,
                (_, true) => RelationalOperator::GreaterEqual,
            };

            let value = parse_expression(parser)?;
            Ok(ChoosePattern::Relational { operator, value })
        }
        TokenKind::LessEquals | TokenKind::GreaterEquals => {
            parser.advance();

            let operator = if token.kind == TokenKind::LessEquals {
                RelationalOperator::LessEqual
            } else {
                RelationalOperator::GreaterEqual
            };

            let value = parse_expression(parser)?;
            Ok(ChoosePattern::Relational { operator, value })
        }
        TokenKind::OpenCurly => match parse_expression(parser)? {
            table @ Expr::Table(_) => Ok(ChoosePattern::Table(table)),
            value => Ok(ChoosePattern::Value(value)),
        },
        TokenKind::Identifier
            if token.value == "_"
                && matches!(parser.peek_kind(1), TokenKind::CaseArrow | TokenKind::When) =>
        {
            parser.advance();
            Ok(ChoosePattern::Wildcard)
        }
        _ => Ok(ChoosePattern::Value(parse_expression(parser)?)),
    }
}

fn parse_tuple_pattern(parser: &mut Parser, tuple_arity: usize) -> ParserResult<ChoosePattern> {
    let open = parser.advance();
    let mut elements: Vec<Option<Expr>> = vec![];

    loop {
        let is_blank = parser.check(TokenKind::Identifier)
            && parser.current_token().value == "_"
            && matches!(parser.peek_kind(1), TokenKind::Comma | TokenKind::CloseParen);

        if is_blank {
            parser.advance();
            elements.push(None);
        } else {
            elements.push(Some(parse_expression(parser)?));
        }

        if parser.match_token(TokenKind::Comma).is_none() {
            break;
        }
    }

    parser.consume(TokenKind::CloseParen, ParserErrorCode::ExpectedToken)?;

    if elements.len() != tuple_arity {
        return fail(
            ParserErrorCode::UnexpectedToken,
            &open,
            format!(
                "tuple pattern has {} elements but scrutinee has {}",
                elements.len(),
                tuple_arity
            ),
        );
    }

    if elements.iter().all(Option::is_none) {
        return Ok(ChoosePattern::Wildcard);
    }

    Ok(ChoosePattern::Tuple(elements))
}

/// `-> value` or `-> target = value`; an assignment makes the case a statement.
fn parse_case_result(parser: &mut Parser) -> ParserResult<ChooseResult> {
    let start = parser.get_position();
    let first = parse_expression(parser)?;

    let kind = parser.current_token_kind();
    if assignment_operator(kind).is_none() && kind != TokenKind::Comma {
        return Ok(ChooseResult::Expr(first));
    }

    let mut targets = vec![first];
    while parser.match_token(TokenKind::Comma).is_some() {
        targets.push(parse_expression(parser)?);
    }

    let token = parser.current_token().clone();
    let Some(operator) = assignment_operator(token.kind) else {
        return fail(
            ParserErrorCode::ExpectedToken,
            &token,
            format!("Expected '=', got '{}'", token.describe()),
        );
    };

    parser.advance();
    let values = parse_expression_list(parser)?;

    Ok(ChooseResult::Statement(Box::new(Stmt::Assignment(AssignmentStmt {
        operator,
        targets,
        values,
        span: parser.span_from(start),
    }))))
}
