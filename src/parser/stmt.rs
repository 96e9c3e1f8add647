use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{Expr, Stmt},
        expressions::{AssignmentOperator, CallExpr, CallTarget, FunctionExpr, RangeExpr},
        statements::{
            AssignmentStmt, BlockStmt, BreakStmt, CheckStmt, ConditionalShorthandStmt, ContinueStmt,
            DeferStmt, DoStmt, ExceptClause, ExpressionStmt, FunctionNamePath, FunctionStmt,
            GenericForStmt, IfClause, IfStmt, LocalFunctionStmt, NumericForStmt, RaiseStmt,
            RepeatStmt, ReturnStmt, TryExceptStmt, VarDeclStmt, WhileStmt,
        },
        types::{
            Annotation, AnnotationValue, FluidType, FunctionParameter, FunctionReturnTypes,
            Identifier, LiteralValue,
        },
    },
    errors::errors::{fail, ParserErrorCode, ParserResult},
    lexer::tokens::{Token, TokenKind},
    Position, Span,
};

use super::{
    expr::{identifier_from, literal, parse_expression, parse_expression_list},
    literals::parse_function_body,
    lookups::assignment_operator,
    parser::{parse_block, Parser},
    types::{parse_parameter_list, parse_type_annotation},
};

/// Tokens after which `return` carries no values.
const RETURN_TERMINATORS: [TokenKind; 8] = [
    TokenKind::End,
    TokenKind::Else,
    TokenKind::ElseIf,
    TokenKind::Until,
    TokenKind::EOF,
    TokenKind::Semicolon,
    TokenKind::Except,
    TokenKind::Success,
];

/// Parses one statement. A stray `;` is an empty statement and yields `None`.
pub fn parse_stmt(parser: &mut Parser) -> ParserResult<Option<Stmt>> {
    if parser.match_token(TokenKind::Semicolon).is_some() {
        return Ok(None);
    }

    let kind = parser.current_token_kind();
    let handler = parser.get_stmt_lookup().get(&kind).copied();

    trace!(
        pos = parser.get_pos(),
        kind = %kind,
        line = parser.get_position().line,
        keyword = handler.is_some(),
        "statement"
    );

    match handler {
        Some(handler) => handler(parser).map(Some),
        None => parse_expression_stmt(parser).map(Some),
    }
}

fn parse_expression_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    let mut targets = parse_expression_list(parser)?;

    if let Some(operator) = assignment_operator(parser.current_token_kind()) {
        parser.advance();
        let values = parse_expression_list(parser)?;

        return Ok(Stmt::Assignment(AssignmentStmt {
            operator,
            targets,
            values,
            span: parser.span_from(start),
        }));
    }

    if targets.len() > 1 {
        let token = parser.current_token();
        return fail(
            ParserErrorCode::UnexpectedToken,
            token,
            "unexpected expression list without assignment",
        );
    }

    let Some(expression) = targets.pop() else {
        let token = parser.current_token();
        return fail(ParserErrorCode::UnexpectedToken, token, "expected statement");
    };

    let expression = match expression {
        Expr::Presence(presence) if is_shorthand_keyword(parser.current_token_kind()) => {
            return parse_conditional_shorthand(parser, *presence.value);
        }
        expression => expression,
    };

    Ok(Stmt::Expression(ExpressionStmt {
        span: *expression.get_span(),
        expression,
    }))
}

fn is_shorthand_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Return | TokenKind::Break | TokenKind::Continue | TokenKind::Raise | TokenKind::Check
    )
}

/// `value ?? return ...`, `value ?? break` and friends.
fn parse_conditional_shorthand(parser: &mut Parser, condition: Expr) -> ParserResult<Stmt> {
    let body = match parser.current_token_kind() {
        TokenKind::Return => {
            let start = parser.get_position();
            let return_token = parser.advance();
            parse_return_payload(parser, &return_token, true, start)?
        }
        TokenKind::Break => parse_break_stmt(parser)?,
        TokenKind::Continue => parse_continue_stmt(parser)?,
        TokenKind::Raise => parse_raise_stmt(parser)?,
        _ => parse_check_stmt(parser)?,
    };

    let span = Span::merge(condition.get_span(), body.get_span());
    debug!(line = span.start.line, "conditional shorthand");

    Ok(Stmt::ConditionalShorthand(ConditionalShorthandStmt {
        condition,
        body: Box::new(body),
        span,
    }))
}

/// Parses `name [: type] [<close>|<const>]` entries of a declaration.
fn parse_name_list(parser: &mut Parser) -> ParserResult<Vec<Identifier>> {
    let mut names = vec![parse_declared_name(parser)?];

    while parser.match_token(TokenKind::Comma).is_some() {
        names.push(parse_declared_name(parser)?);
    }

    Ok(names)
}

fn parse_declared_name(parser: &mut Parser) -> ParserResult<Identifier> {
    let token = parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?;
    let mut name = identifier_from(&token);

    if parser.match_token(TokenKind::Colon).is_some() {
        name.type_annotation = Some(parse_type_annotation(parser)?);
    }

    if parser.match_token(TokenKind::Less).is_some() {
        let attribute = parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?;

        match attribute.value.as_str() {
            "close" => name.has_close = true,
            "const" => name.has_const = true,
            other => {
                return fail(
                    ParserErrorCode::UnexpectedToken,
                    &attribute,
                    format!("unknown attribute '{}'", other),
                );
            }
        }

        if parser.match_token(TokenKind::Greater).is_none() {
            let token = parser.current_token();
            return fail(ParserErrorCode::ExpectedToken, token, "expected '>' after attribute");
        }

        if name.type_annotation.is_none() && parser.match_token(TokenKind::Colon).is_some() {
            name.type_annotation = Some(parse_type_annotation(parser)?);
        }
    }

    Ok(name)
}

/// Shared tail of `local` and `global` variable declarations.
fn parse_var_decl(parser: &mut Parser, start: Position, scope: &str) -> ParserResult<VarDeclStmt> {
    let mut names = parse_name_list(parser)?;

    let operator = match parser.current_token_kind() {
        TokenKind::Assignment => Some(AssignmentOperator::Plain),
        TokenKind::QuestionEquals => Some(AssignmentOperator::IfEmpty),
        TokenKind::DoubleQuestionEquals => Some(AssignmentOperator::IfNil),
        _ => None,
    };

    let mut values = vec![];
    if operator.is_some() {
        parser.advance();
        values = parse_expression_list(parser)?;
    }

    // `local a = 1, b` declares `b` too: bare names past the value count become names
    if values.len() > names.len() {
        for value in values.split_off(names.len()) {
            match value {
                Expr::Identifier(name) => names.push(name),
                _ => {
                    let token = parser.current_token();
                    return fail(
                        ParserErrorCode::ExpectedIdentifier,
                        token,
                        format!("expected identifier after values in {} declaration", scope),
                    );
                }
            }
        }
    }

    Ok(VarDeclStmt {
        operator: operator.unwrap_or(AssignmentOperator::Plain),
        names,
        values,
        span: parser.span_from(start),
    })
}

/// `local [function|thunk] ...`
pub fn parse_local_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    parser.advance();

    let is_thunk = parser.match_token(TokenKind::Thunk).is_some();
    if is_thunk || parser.match_token(TokenKind::Function).is_some() {
        let name = identifier_from(&parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?);
        let function = parse_function_body(parser, is_thunk, start)?;

        return Ok(Stmt::LocalFunction(LocalFunctionStmt {
            name,
            function,
            span: parser.span_from(start),
        }));
    }

    Ok(Stmt::LocalDecl(parse_var_decl(parser, start, "local")?))
}

/// `global [function|thunk] ...`
pub fn parse_global_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    parser.advance();

    let is_thunk = parser.match_token(TokenKind::Thunk).is_some();
    if is_thunk || parser.match_token(TokenKind::Function).is_some() {
        let name = identifier_from(&parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?);
        let function = parse_function_body(parser, is_thunk, start)?;

        return Ok(Stmt::Function(FunctionStmt {
            name: FunctionNamePath {
                segments: vec![name],
                method: None,
                is_explicit_global: true,
            },
            function,
            span: parser.span_from(start),
        }));
    }

    Ok(Stmt::GlobalDecl(parse_var_decl(parser, start, "global")?))
}

/// `function a.b:c(...)` or `thunk name(...)`. Methods get an implicit `self` first parameter.
pub fn parse_function_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    let is_thunk = parser.advance().kind == TokenKind::Thunk;

    let first = parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?;
    let mut segments = vec![identifier_from(&first)];

    while parser.match_token(TokenKind::Dot).is_some() {
        segments.push(identifier_from(&parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?));
    }

    let mut method = None;
    if parser.match_token(TokenKind::Colon).is_some() {
        if is_thunk {
            let token = parser.current_token();
            return fail(
                ParserErrorCode::UnexpectedToken,
                token,
                "thunk functions do not support method syntax",
            );
        }

        method = Some(identifier_from(&parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?));
    }

    let mut function = parse_function_body(parser, is_thunk, start)?;

    if let Some(method) = &method {
        function.parameters.insert(
            0,
            FunctionParameter {
                name: Identifier::new("self", method.span),
                type_: FluidType::Any,
                is_self: true,
            },
        );
    }

    Ok(Stmt::Function(FunctionStmt {
        name: FunctionNamePath {
            segments,
            method,
            is_explicit_global: false,
        },
        function,
        span: parser.span_from(start),
    }))
}

fn parse_annotation_value(parser: &mut Parser) -> ParserResult<AnnotationValue> {
    let token = parser.current_token().clone();

    let value = match token.kind {
        TokenKind::String | TokenKind::Identifier => AnnotationValue::String(token.value.clone()),
        TokenKind::Number => match token.number() {
            Some(value) => AnnotationValue::Number(value),
            None => {
                return fail(
                    ParserErrorCode::UnexpectedToken,
                    &token,
                    format!("malformed number '{}'", token.value),
                );
            }
        },
        TokenKind::True => AnnotationValue::Bool(true),
        TokenKind::False => AnnotationValue::Bool(false),
        TokenKind::OpenBracket | TokenKind::OpenCurly => {
            let (close, message) = if token.kind == TokenKind::OpenBracket {
                (TokenKind::CloseBracket, "expected ']' to close array")
            } else {
                (TokenKind::CloseCurly, "expected '}' to close array")
            };

            parser.advance();
            let mut items = vec![];

            while !parser.check(close) && !parser.check(TokenKind::EOF) {
                items.push(parse_annotation_value(parser)?);

                if parser.match_token(TokenKind::Comma).is_none() {
                    break;
                }
            }

            if parser.match_token(close).is_none() {
                let token = parser.current_token();
                return fail(ParserErrorCode::ExpectedToken, token, message);
            }

            return Ok(AnnotationValue::Array(items));
        }
        _ => {
            return fail(
                ParserErrorCode::UnexpectedToken,
                &token,
                "expected annotation value (string, number, boolean, array, or identifier)",
            );
        }
    };

    parser.advance();
    Ok(value)
}

fn parse_annotations(parser: &mut Parser) -> ParserResult<Vec<Annotation>> {
    let mut annotations = vec![];

    while parser.check(TokenKind::At) {
        let start = parser.get_position();
        parser.advance();

        let name = parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?;
        let mut args = vec![];

        if parser.match_token(TokenKind::OpenParen).is_some() {
            while !parser.check(TokenKind::CloseParen) && !parser.check(TokenKind::EOF) {
                let key = parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?;

                let value = if parser.match_token(TokenKind::Assignment).is_some() {
                    parse_annotation_value(parser)?
                } else {
                    AnnotationValue::Bool(true)
                };

                args.push((key.value, value));

                if parser.match_token(TokenKind::Comma).is_none() {
                    break;
                }
            }

            if parser.match_token(TokenKind::CloseParen).is_none() {
                let token = parser.current_token();
                return fail(
                    ParserErrorCode::ExpectedToken,
                    token,
                    "expected ')' to close annotation arguments",
                );
            }
        }

        annotations.push(Annotation {
            name: name.value,
            span: parser.span_from(start),
            args,
        });

        parser.match_token(TokenKind::Semicolon);
    }

    Ok(annotations)
}

/// `@Name(...)` sequences. They may only precede a function declaration.
pub fn parse_annotated_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let annotations = parse_annotations(parser)?;
    let token = parser.current_token().clone();

    let mut stmt = match token.kind {
        TokenKind::Function | TokenKind::Thunk => parse_function_stmt(parser)?,
        TokenKind::Local | TokenKind::Global => {
            let stmt = if token.kind == TokenKind::Local {
                parse_local_stmt(parser)?
            } else {
                parse_global_stmt(parser)?
            };

            if !matches!(stmt, Stmt::LocalFunction(_) | Stmt::Function(_)) {
                return fail(
                    ParserErrorCode::UnexpectedToken,
                    &token,
                    "annotations can only precede function declarations",
                );
            }

            stmt
        }
        _ => {
            return fail(
                ParserErrorCode::UnexpectedToken,
                &token,
                "annotations must precede a function declaration",
            );
        }
    };

    debug!(
        count = annotations.len(),
        line = token.span.start.line,
        "annotations attached"
    );

    match &mut stmt {
        Stmt::Function(FunctionStmt { function, .. })
        | Stmt::LocalFunction(LocalFunctionStmt { function, .. }) => function.annotations = annotations,
        _ => {}
    }

    Ok(stmt)
}

pub fn parse_if_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    parser.advance();

    let terminators = [TokenKind::ElseIf, TokenKind::Else, TokenKind::End];
    let mut clauses = vec![];

    let condition = parse_expression(parser)?;
    parser.consume(TokenKind::Then, ParserErrorCode::ExpectedToken)?;
    clauses.push(IfClause {
        condition: Some(condition),
        block: parse_block(parser, &terminators)?,
    });

    while parser.match_token(TokenKind::ElseIf).is_some() {
        let condition = parse_expression(parser)?;
        parser.consume(TokenKind::Then, ParserErrorCode::ExpectedToken)?;
        clauses.push(IfClause {
            condition: Some(condition),
            block: parse_block(parser, &terminators)?,
        });
    }

    if parser.match_token(TokenKind::Else).is_some() {
        clauses.push(IfClause {
            condition: None,
            block: parse_block(parser, &[TokenKind::End])?,
        });
    }

    parser.consume(TokenKind::End, ParserErrorCode::ExpectedToken)?;

    Ok(Stmt::If(IfStmt {
        clauses,
        span: parser.span_from(start),
    }))
}

/// Parses a `do ... end` loop body.
fn parse_loop_body(parser: &mut Parser) -> ParserResult<BlockStmt> {
    parser.consume(TokenKind::Do, ParserErrorCode::ExpectedToken)?;
    let body = parse_block(parser, &[TokenKind::End])?;
    parser.consume(TokenKind::End, ParserErrorCode::ExpectedToken)?;
    Ok(body)
}

pub fn parse_while_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    parser.advance();

    let condition = parse_expression(parser)?;
    let body = parse_loop_body(parser)?;

    Ok(Stmt::While(WhileStmt {
        condition,
        body,
        span: parser.span_from(start),
    }))
}

pub fn parse_repeat_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    parser.advance();

    let body = parse_block(parser, &[TokenKind::Until])?;
    parser.consume(TokenKind::Until, ParserErrorCode::ExpectedToken)?;
    let condition = parse_expression(parser)?;

    Ok(Stmt::Repeat(RepeatStmt {
        body,
        condition,
        span: parser.span_from(start),
    }))
}

/// Numeric, generic and anonymous `for` loops.
pub fn parse_for_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    let for_token = parser.advance();

    if parser.check(TokenKind::OpenCurly) {
        return parse_anonymous_for(parser, &for_token, start);
    }

    let control = identifier_from(&parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?);

    if parser.match_token(TokenKind::Assignment).is_some() {
        let from = parse_expression(parser)?;
        parser.consume(TokenKind::Comma, ParserErrorCode::ExpectedToken)?;
        let stop = parse_expression(parser)?;

        let step = match parser.match_token(TokenKind::Comma) {
            Some(_) => Some(parse_expression(parser)?),
            None => None,
        };

        let body = parse_loop_body(parser)?;

        return Ok(Stmt::NumericFor(NumericForStmt {
            control,
            start: from,
            stop,
            step,
            body,
            span: parser.span_from(start),
        }));
    }

    let mut names = vec![control];
    while parser.match_token(TokenKind::Comma).is_some() {
        names.push(identifier_from(&parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?));
    }

    parser.consume(TokenKind::In, ParserErrorCode::ExpectedToken)?;
    let iterators = parse_expression_list(parser)?;

    finish_for(parser, names, iterators, start)
}

/// `for {range} do ... end` iterates without naming the loop variable.
fn parse_anonymous_for(parser: &mut Parser, for_token: &Token, start: Position) -> ParserResult<Stmt> {
    let iterator = parse_expression(parser)?;
    let blank = Identifier::new("_", for_token.span);

    finish_for(parser, vec![blank], vec![iterator], start)
}

/// Builds the loop node once the header is parsed. A single variable over a range
/// with constant endpoints becomes a numeric loop; any other range is called to
/// obtain its iterator.
fn finish_for(
    parser: &mut Parser,
    mut names: Vec<Identifier>,
    mut iterators: Vec<Expr>,
    start: Position,
) -> ParserResult<Stmt> {
    let single = if iterators.len() == 1 { iterators.pop() } else { None };

    match single {
        Some(Expr::Range(range)) => {
            if names.len() == 1 {
                if let Some((from, stop, step)) = constant_range_bounds(&range) {
                    trace!(line = start.line, from, stop, step, "range loop rewritten to numeric for");

                    let control = names.remove(0);
                    let stop_span = *range.stop.get_span();
                    let body = parse_loop_body(parser)?;

                    return Ok(Stmt::NumericFor(NumericForStmt {
                        control,
                        start: *range.start,
                        stop: literal(LiteralValue::Number(stop), stop_span),
                        step: Some(literal(LiteralValue::Number(step), range.span)),
                        body,
                        span: parser.span_from(start),
                    }));
                }
            }

            let span = range.span;
            iterators.push(Expr::Call(CallExpr {
                target: CallTarget::Direct(Box::new(Expr::Range(range))),
                arguments: vec![],
                forwards_multret: false,
                span,
            }));
        }
        Some(iterator) => iterators.push(iterator),
        None => {}
    }

    let body = parse_loop_body(parser)?;

    Ok(Stmt::GenericFor(GenericForStmt {
        names,
        iterators,
        body,
        span: parser.span_from(start),
    }))
}

/// Stop and step of a range over two number literals, with the exclusive bound
/// already pulled one step back.
fn constant_range_bounds(range: &RangeExpr) -> Option<(f64, f64, f64)> {
    let from = range.start.as_number()?;
    let stop = range.stop.as_number()?;

    let step = if from <= stop { 1.0 } else { -1.0 };
    let stop = if range.inclusive { stop } else { stop - step };

    Some((from, stop, step))
}

pub fn parse_do_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    parser.advance();

    let block = parse_block(parser, &[TokenKind::End])?;
    parser.consume(TokenKind::End, ParserErrorCode::ExpectedToken)?;

    Ok(Stmt::Do(DoStmt {
        block,
        span: parser.span_from(start),
    }))
}

/// `defer [(params)] ... end [(args)]`
pub fn parse_defer_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    parser.advance();

    let params = parse_parameter_list(parser, true, false)?;
    let body = parse_block(parser, &[TokenKind::End])?;
    parser.consume(TokenKind::End, ParserErrorCode::ExpectedToken)?;

    let function = FunctionExpr {
        parameters: params.parameters,
        is_vararg: params.is_vararg,
        is_thunk: false,
        thunk_return_type: FluidType::Any,
        return_types: FunctionReturnTypes::implicit(),
        body,
        annotations: vec![],
        span: parser.span_from(start),
    };

    let mut arguments = vec![];
    if parser.match_token(TokenKind::OpenParen).is_some() {
        if !parser.check(TokenKind::CloseParen) {
            arguments = parse_expression_list(parser)?;
        }
        parser.consume(TokenKind::CloseParen, ParserErrorCode::ExpectedToken)?;
    }

    Ok(Stmt::Defer(DeferStmt {
        function,
        arguments,
        span: parser.span_from(start),
    }))
}

/// Values of a `return` whose keyword is already consumed. With `same_line_only`
/// only tokens on the keyword's line are taken as values, so `x ?? return`
/// followed by a new statement returns nothing.
fn parse_return_payload(
    parser: &mut Parser,
    return_token: &Token,
    same_line_only: bool,
    start: Position,
) -> ParserResult<Stmt> {
    let current = parser.current_token();
    let at_terminator = RETURN_TERMINATORS.contains(&current.kind);
    let on_return_line = current.span.start.line == return_token.span.start.line;

    let mut values = vec![];
    if !at_terminator && (!same_line_only || on_return_line) {
        values = parse_expression_list(parser)?;
    }

    let forwards_call = values.len() == 1 && matches!(values[0], Expr::Call(_));
    let span = parser.span_from(start);
    parser.match_token(TokenKind::Semicolon);

    Ok(Stmt::Return(ReturnStmt {
        values,
        forwards_call,
        span,
    }))
}

pub fn parse_return_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    let return_token = parser.advance();
    parse_return_payload(parser, &return_token, false, start)
}

pub fn parse_break_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let token = parser.advance();
    Ok(Stmt::Break(BreakStmt { span: token.span }))
}

pub fn parse_continue_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let token = parser.advance();
    Ok(Stmt::Continue(ContinueStmt { span: token.span }))
}

/// ```text
/// try [<trace>]
///    ...
/// except [e] [when CODE, ...]
///    ...
/// [success
///    ...]
/// end
/// ```
pub fn parse_try_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    parser.advance();

    let mut enable_trace = false;
    if parser.match_token(TokenKind::Less).is_some() {
        let attribute = parser.expect_identifier(ParserErrorCode::ExpectedIdentifier)?;
        if attribute.value != "trace" {
            return fail(
                ParserErrorCode::UnexpectedToken,
                &attribute,
                "unknown try attribute, expected 'trace'",
            );
        }

        if parser.match_token(TokenKind::Greater).is_none() {
            let token = parser.current_token();
            return fail(ParserErrorCode::ExpectedToken, token, "expected '>' after try attribute");
        }

        enable_trace = true;
    }

    let terminators = [TokenKind::Except, TokenKind::Success, TokenKind::End];
    let try_block = parse_block(parser, &terminators)?;

    let mut except_clauses: Vec<ExceptClause> = vec![];
    while parser.check(TokenKind::Except) {
        if except_clauses.last().is_some_and(|clause| clause.filter_codes.is_empty()) {
            let token = parser.current_token();
            return fail(
                ParserErrorCode::UnexpectedToken,
                token,
                "catch-all 'except' must be the last clause",
            );
        }

        except_clauses.push(parse_except_clause(parser, &terminators)?);
    }

    let success_block = match parser.match_token(TokenKind::Success) {
        Some(_) => Some(parse_block(parser, &[TokenKind::End])?),
        None => None,
    };

    parser.consume(TokenKind::End, ParserErrorCode::ExpectedToken)?;

    debug!(
        line = start.line,
        clauses = except_clauses.len(),
        enable_trace,
        "parsed try statement"
    );

    Ok(Stmt::TryExcept(TryExceptStmt {
        try_block,
        except_clauses,
        success_block,
        enable_trace,
        span: parser.span_from(start),
    }))
}

fn parse_except_clause(parser: &mut Parser, terminators: &[TokenKind]) -> ParserResult<ExceptClause> {
    let except = parser.advance();
    let line = except.span.start.line;
    let start = parser.get_position();

    let mut exception_var = None;
    if parser.check(TokenKind::Identifier) && parser.get_position().line == line {
        exception_var = Some(identifier_from(&parser.advance()));
    }

    if parser.check(TokenKind::Identifier) && parser.get_position().line == line {
        let token = parser.current_token();
        return fail(
            ParserErrorCode::UnexpectedToken,
            token,
            format!("expected 'when' or newline after 'except', not '{}'", token.value),
        );
    }

    let mut filter_codes = vec![];
    if let Some(when) = parser.match_token(TokenKind::When) {
        let when_line = when.span.start.line;

        if parser.get_position().line != when_line {
            return fail(
                ParserErrorCode::ExpectedToken,
                &when,
                "expected error code(s) after 'when' on the same line",
            );
        }

        filter_codes.push(parse_expression(parser)?);

        while parser.check(TokenKind::Comma) && parser.get_position().line == when_line {
            let comma = parser.advance();

            if parser.get_position().line != when_line {
                return fail(
                    ParserErrorCode::ExpectedToken,
                    &comma,
                    "expected error code after ',' on the same line as 'when'",
                );
            }

            filter_codes.push(parse_expression(parser)?);
        }
    }

    let block = parse_block(parser, terminators)?;

    Ok(ExceptClause {
        exception_var,
        filter_codes,
        block,
        span: parser.span_from(start),
    })
}

/// `raise code [, message]`
pub fn parse_raise_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    parser.advance();

    let error_code = parse_expression(parser)?;
    let message = match parser.match_token(TokenKind::Comma) {
        Some(_) => Some(parse_expression(parser)?),
        None => None,
    };

    Ok(Stmt::Raise(RaiseStmt {
        error_code,
        message,
        span: parser.span_from(start),
    }))
}

pub fn parse_check_stmt(parser: &mut Parser) -> ParserResult<Stmt> {
    let start = parser.get_position();
    parser.advance();

    let error_code = parse_expression(parser)?;

    Ok(Stmt::Check(CheckStmt {
        error_code,
        span: parser.span_from(start),
    }))
}
