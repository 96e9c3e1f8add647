//! Unit tests for the parser module.
//!
//! This module contains tests for parsing the Fluid language constructs including:
//! - Local and global declarations
//! - Function, method and thunk declarations
//! - Operator precedence and the rewritten operators (`in`, `|>`)
//! - Control flow statements and the range loop rewrite
//! - `choose` expressions and their disambiguation
//! - Exception statements and annotations
//! - Error cases

use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::parser::{parse, parse_with_config, ParserConfig};
use crate::{
    ast::{
        ast::{Expr, Stmt},
        expressions::{
            AssignmentOperator, BinaryOperator, CallTarget, ChooseCase, ChoosePattern, ChooseResult,
            ChooseScrutinee, RelationalOperator,
        },
        statements::BlockStmt,
        types::{AnnotationValue, FluidType, LiteralValue},
    },
    errors::errors::{ParserError, ParserErrorCode, ParserResult},
    lexer::lexer::tokenize,
    Span,
};

fn parse_source(source: &str) -> ParserResult<BlockStmt> {
    let tokens = tokenize(source.to_string(), Some("test.fluid".to_string())).unwrap();
    let (_, result) = parse(tokens, Rc::new("test.fluid".to_string()));
    result
}

fn parse_ok(source: &str) -> BlockStmt {
    match parse_source(source) {
        Ok(block) => block,
        Err(err) => panic!("failed to parse {:?}: {}", source, err),
    }
}

fn parse_err(source: &str) -> ParserError {
    parse_source(source).unwrap_err()
}

fn single_stmt(source: &str) -> Stmt {
    let mut block = parse_ok(source);
    assert_eq!(block.len(), 1, "expected one statement in {:?}", source);
    block.body.remove(0)
}

/// The value of `local x = <expr>`.
fn local_value(source: &str) -> Expr {
    match single_stmt(source) {
        Stmt::LocalDecl(mut decl) => decl.values.remove(0),
        other => panic!("expected local declaration, got {:?}", other),
    }
}

fn number(expr: &Expr) -> f64 {
    expr.as_number().unwrap()
}

#[test]
fn test_parse_local_declaration() {
    let Stmt::LocalDecl(decl) = single_stmt("local x = 5") else {
        panic!("expected local declaration");
    };

    assert_eq!(decl.operator, AssignmentOperator::Plain);
    assert_eq!(decl.names.len(), 1);
    assert_eq!(decl.names[0].symbol, "x");
    assert_eq!(decl.values.len(), 1);
    assert_eq!(number(&decl.values[0]), 5.0);
}

#[test]
fn test_parse_local_without_values() {
    let Stmt::LocalDecl(decl) = single_stmt("local a, b") else {
        panic!("expected local declaration");
    };

    assert_eq!(decl.names.len(), 2);
    assert!(decl.values.is_empty());
}

#[test]
fn test_parse_conditional_declarations() {
    let Stmt::LocalDecl(decl) = single_stmt("local x ?= 1") else {
        panic!("expected local declaration");
    };
    assert_eq!(decl.operator, AssignmentOperator::IfEmpty);

    let Stmt::GlobalDecl(decl) = single_stmt("global y ??= 2") else {
        panic!("expected global declaration");
    };
    assert_eq!(decl.operator, AssignmentOperator::IfNil);
    assert_eq!(decl.names[0].symbol, "y");
}

#[test]
fn test_trailing_identifiers_become_names() {
    let Stmt::LocalDecl(decl) = single_stmt("local a = 1, b, c") else {
        panic!("expected local declaration");
    };

    let names: Vec<&str> = decl.names.iter().map(|name| name.symbol.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(decl.values.len(), 1);
}

#[test]
fn test_trailing_non_identifier_is_an_error() {
    let err = parse_err("local a = 1, 2");

    assert_eq!(err.get_code(), ParserErrorCode::ExpectedIdentifier);
    assert_eq!(err.get_message(), "expected identifier after values in local declaration");

    let err = parse_err("global a = 1, 2");
    assert_eq!(err.get_message(), "expected identifier after values in global declaration");
}

#[test]
fn test_parse_name_attributes_and_types() {
    let Stmt::LocalDecl(decl) = single_stmt("local f <close>, n: num, k <const> = a, 1, 2") else {
        panic!("expected local declaration");
    };

    assert!(decl.names[0].has_close);
    assert_eq!(decl.names[1].type_annotation, Some(FluidType::Num));
    assert!(decl.names[2].has_const);
    assert!(!decl.names[2].has_close);
}

#[test]
fn test_unknown_attribute() {
    let err = parse_err("local f <weak> = a");

    assert_eq!(err.get_code(), ParserErrorCode::UnexpectedToken);
    assert_eq!(err.get_message(), "unknown attribute 'weak'");
}

#[test]
fn test_unknown_type_name() {
    let err = parse_err("local n: integer = 1");

    assert_eq!(err.get_code(), ParserErrorCode::UnknownTypeName);
    assert_eq!(err.get_token().value, "integer");
}

#[test]
fn test_parse_function_declaration() {
    let Stmt::Function(stmt) = single_stmt("function add(a: num, b) return a + b end") else {
        panic!("expected function statement");
    };

    assert_eq!(stmt.name.dotted(), "add");
    assert!(!stmt.name.is_explicit_global);
    assert_eq!(stmt.function.parameters.len(), 2);
    assert_eq!(stmt.function.parameters[0].type_, FluidType::Num);
    assert_eq!(stmt.function.parameters[1].type_, FluidType::Any);
    assert_eq!(stmt.function.body.len(), 1);
}

#[test]
fn test_method_declaration_injects_self() {
    let Stmt::Function(stmt) = single_stmt("function a.b:c(x) end") else {
        panic!("expected function statement");
    };

    assert_eq!(stmt.name.dotted(), "a.b:c");
    assert_eq!(stmt.function.parameters.len(), 2);
    assert_eq!(stmt.function.parameters[0].name.symbol, "self");
    assert!(stmt.function.parameters[0].is_self);
    assert_eq!(stmt.function.parameters[1].name.symbol, "x");
}

#[test]
fn test_local_and_global_functions() {
    let Stmt::LocalFunction(stmt) = single_stmt("local function helper() end") else {
        panic!("expected local function");
    };
    assert_eq!(stmt.name.symbol, "helper");
    assert!(!stmt.function.is_thunk);

    let Stmt::LocalFunction(stmt) = single_stmt("local thunk lazy(): num return 1 end") else {
        panic!("expected local thunk");
    };
    assert!(stmt.function.is_thunk);
    assert_eq!(stmt.function.thunk_return_type, FluidType::Num);

    let Stmt::Function(stmt) = single_stmt("global function shared() end") else {
        panic!("expected global function");
    };
    assert!(stmt.name.is_explicit_global);
}

#[test]
fn test_thunk_restrictions() {
    let err = parse_err("thunk t(...) end");
    assert_eq!(err.get_message(), "thunk functions do not support varargs");

    let err = parse_err("thunk a:b() end");
    assert_eq!(err.get_message(), "thunk functions do not support method syntax");
}

#[test]
fn test_return_type_list() {
    let Stmt::Function(stmt) = single_stmt("function f():<num, str, ...> end") else {
        panic!("expected function statement");
    };

    let returns = &stmt.function.return_types;
    assert!(returns.is_explicit);
    assert!(returns.is_variadic);
    assert_eq!(returns.types, vec![FluidType::Num, FluidType::Str]);
}

#[test]
fn test_return_types_capped_by_config() {
    let source = "function f():<num, str, bool> end".to_string();
    let tokens = tokenize(source, Some("test.fluid".to_string())).unwrap();
    let config = ParserConfig {
        max_return_types: 2,
        ..ParserConfig::default()
    };

    let (_, result) = parse_with_config(tokens, Rc::new("test.fluid".to_string()), config);
    let block = result.unwrap();

    let Stmt::Function(stmt) = &block.body[0] else {
        panic!("expected function statement");
    };
    assert_eq!(stmt.function.return_types.types, vec![FluidType::Num, FluidType::Any]);
}

#[test]
fn test_operator_precedence() {
    // 1 + (2 * (3 ^ 2))
    let Expr::Binary(add) = local_value("local x = 1 + 2 * 3 ^ 2") else {
        panic!("expected binary expression");
    };
    assert_eq!(add.operator, BinaryOperator::Add);
    assert_eq!(number(&add.left), 1.0);

    let Expr::Binary(mul) = *add.right else {
        panic!("expected multiplication");
    };
    assert_eq!(mul.operator, BinaryOperator::Multiply);

    let Expr::Binary(pow) = *mul.right else {
        panic!("expected power");
    };
    assert_eq!(pow.operator, BinaryOperator::Power);
    assert_eq!(number(&pow.left), 3.0);
    assert_eq!(number(&pow.right), 2.0);
}

#[test]
fn test_right_associative_operators() {
    // a .. (b .. c)
    let Expr::Binary(concat) = local_value("local x = a .. b .. c") else {
        panic!("expected binary expression");
    };
    assert_eq!(concat.operator, BinaryOperator::Concat);
    assert!(matches!(*concat.left, Expr::Identifier(_)));
    assert!(matches!(*concat.right, Expr::Binary(_)));

    // (a - b) - c
    let Expr::Binary(sub) = local_value("local x = a - b - c") else {
        panic!("expected binary expression");
    };
    assert!(matches!(*sub.left, Expr::Binary(_)));
    assert!(matches!(*sub.right, Expr::Identifier(_)));
}

#[test]
fn test_unary_applies_to_single_operand() {
    let Expr::Binary(add) = local_value("local x = -a + b") else {
        panic!("expected binary expression");
    };
    assert!(matches!(*add.left, Expr::Unary(_)));

    // (-a) ^ 2
    let Expr::Binary(pow) = local_value("local x = -a ^ 2") else {
        panic!("expected binary expression");
    };
    assert_eq!(pow.operator, BinaryOperator::Power);
    assert!(matches!(*pow.left, Expr::Unary(_)));
    assert_eq!(number(&pow.right), 2.0);

    // not (not a)
    let Expr::Unary(outer) = local_value("local x = not not a") else {
        panic!("expected unary expression");
    };
    assert!(matches!(*outer.operand, Expr::Unary(_)));
}

#[test]
fn test_is_and_not_equal_synonyms() {
    let Expr::Binary(eq) = local_value("local x = a is b") else {
        panic!("expected binary expression");
    };
    assert_eq!(eq.operator, BinaryOperator::Equal);

    let Expr::Binary(ne) = local_value("local x = a != b") else {
        panic!("expected binary expression");
    };
    assert_eq!(ne.operator, BinaryOperator::NotEqual);
}

#[test]
fn test_membership_rewritten_to_contains() {
    let Expr::Call(call) = local_value("local x = item in list") else {
        panic!("expected call");
    };

    assert_eq!(call.method_name(), Some("contains"));
    assert_eq!(call.arguments.len(), 1);
    assert_eq!(call.arguments[0].as_identifier().unwrap().symbol, "item");

    let CallTarget::Method { receiver, .. } = &call.target else {
        panic!("expected method call");
    };
    assert_eq!(receiver.as_identifier().unwrap().symbol, "list");
}

#[test]
fn test_ternary() {
    let Expr::Ternary(ternary) = local_value("local x = a > 1 ? \"big\" :> \"small\"") else {
        panic!("expected ternary");
    };

    assert!(matches!(*ternary.condition, Expr::Binary(_)));
    assert!(matches!(*ternary.if_true, Expr::Literal(_)));
}

#[test]
fn test_if_empty_and_presence() {
    let Expr::Binary(binary) = local_value("local x = a ?? b") else {
        panic!("expected binary expression");
    };
    assert_eq!(binary.operator, BinaryOperator::IfEmpty);

    let Stmt::Expression(stmt) = single_stmt("print(a??)") else {
        panic!("expected expression statement");
    };
    let Expr::Call(call) = stmt.expression else {
        panic!("expected call");
    };
    assert!(matches!(call.arguments[0], Expr::Presence(_)));
}

#[test]
fn test_pipe_requires_call() {
    let Expr::Pipe(pipe) = local_value("local x = f() |2> g(1)") else {
        panic!("expected pipe");
    };
    assert_eq!(pipe.limit, 2);

    let err = parse_err("local x = f() |> g");
    assert_eq!(err.get_message(), "pipe operator requires function call on right-hand side");
}

#[test]
fn test_range_pipe_becomes_each() {
    // ({1..3}:each(f)):each(g)
    let Expr::Call(outer) = local_value("local x = {1..3} |> f |> g") else {
        panic!("expected call");
    };
    assert_eq!(outer.method_name(), Some("each"));

    let CallTarget::Method { receiver, .. } = &outer.target else {
        panic!("expected method call");
    };
    let Expr::Call(inner) = receiver.as_ref() else {
        panic!("expected inner call");
    };
    assert_eq!(inner.method_name(), Some("each"));
}

#[test]
fn test_safe_navigation() {
    let Expr::Call(call) = local_value("local x = a?.b?[1]?:c()") else {
        panic!("expected call");
    };
    assert!(call.is_safe());

    let CallTarget::SafeMethod { receiver, .. } = &call.target else {
        panic!("expected safe method call");
    };
    let Expr::SafeIndex(index) = receiver.as_ref() else {
        panic!("expected safe index");
    };
    assert!(matches!(*index.table, Expr::SafeMember(_)));
}

#[test]
fn test_call_forwards_multret() {
    let Expr::Call(call) = local_value("local x = f(a, g())") else {
        panic!("expected call");
    };
    assert!(call.forwards_multret);

    let Expr::Call(call) = local_value("local x = f(g(), a)") else {
        panic!("expected call");
    };
    assert!(!call.forwards_multret);
}

#[test]
fn test_arrow_functions() {
    let Expr::Function(single) = local_value("local f = x => x * 2") else {
        panic!("expected function");
    };
    assert_eq!(single.parameters.len(), 1);
    assert_eq!(single.body.len(), 1);

    let Expr::Function(pair) = local_value("local f = (a, b) => a + b") else {
        panic!("expected function");
    };
    assert_eq!(pair.parameters.len(), 2);

    let Expr::Function(empty) = local_value("local f = () => do print(1) end") else {
        panic!("expected function");
    };
    assert!(empty.parameters.is_empty());

    let Expr::Function(typed) = local_value("local f = x => num: x + 1") else {
        panic!("expected function");
    };
    assert_eq!(typed.return_types.types, vec![FluidType::Num]);
}

#[test]
fn test_arrow_function_errors() {
    let err = parse_err("local f = (a, 1) => a");
    assert_eq!(err.get_code(), ParserErrorCode::ExpectedIdentifier);

    let err = parse_err("local f = x => x += 1");
    assert_eq!(
        err.get_message(),
        "'+=' is a statement, not an expression; use 'do ... end' for statement bodies in arrow functions"
    );
}

#[test]
fn test_parenthesised_expression_errors() {
    let err = parse_err("local x = ()");
    assert_eq!(err.get_message(), "empty parentheses are not an expression");

    let err = parse_err("local x = (a, b)");
    assert_eq!(err.get_message(), "multiple expressions in parentheses are not supported");
}

#[test]
fn test_parameterless_thunk_literal_is_invoked() {
    let Expr::Call(call) = local_value("local x = thunk() return 1 end") else {
        panic!("expected immediate call");
    };

    let CallTarget::Direct(callee) = &call.target else {
        panic!("expected direct call");
    };
    assert!(matches!(callee.as_ref(), Expr::Function(function) if function.is_thunk));
}

#[test]
fn test_deferred_expressions() {
    let Expr::Call(call) = local_value("local x = <{ 1 + 2 }>") else {
        panic!("expected immediate call");
    };
    let CallTarget::Direct(callee) = &call.target else {
        panic!("expected direct call");
    };
    let Expr::Function(function) = callee.as_ref() else {
        panic!("expected function");
    };
    assert!(function.is_thunk);
    assert_eq!(function.thunk_return_type, FluidType::Num);

    let Expr::Call(call) = local_value("local x = <str{ name }>") else {
        panic!("expected immediate call");
    };
    let CallTarget::Direct(callee) = &call.target else {
        panic!("expected direct call");
    };
    assert!(matches!(callee.as_ref(), Expr::Function(function) if function.thunk_return_type == FluidType::Str));

    let err = parse_err("local x = <widget{ 1 }>");
    assert_eq!(err.get_code(), ParserErrorCode::UnknownTypeName);
}

#[test]
fn test_typed_arrays() {
    let Expr::Call(call) = local_value("local a = array<num> { 1, 2, 3 }") else {
        panic!("expected call");
    };
    assert_eq!(call.arguments.len(), 4);
    assert!(matches!(&call.arguments[0], Expr::Literal(literal) if literal.value == LiteralValue::String("num".to_string())));

    let Expr::Call(call) = local_value("local a = array<str, 8>") else {
        panic!("expected call");
    };
    assert_eq!(number(&call.arguments[0]), 8.0);

    let err = parse_err("local a = array<num> { x = 1 }");
    assert_eq!(
        err.get_message(),
        "Array initialiser can only contain sequential values, not key-value pairs"
    );
}

#[test]
fn test_table_literal_fields() {
    let Expr::Table(table) = local_value("local t = { 1, name = \"x\", [k] = v; 2 }") else {
        panic!("expected table");
    };

    assert_eq!(table.fields.len(), 4);
    assert!(table.has_array_part);
    assert_eq!(table.fields[1].name.as_ref().unwrap().symbol, "name");
    assert!(table.fields[2].key.is_some());
}

#[test]
fn test_result_filter() {
    let Stmt::Expression(stmt) = single_stmt("[_*]f()") else {
        panic!("expected expression statement");
    };
    let Expr::ResultFilter(filter) = stmt.expression else {
        panic!("expected result filter");
    };
    assert_eq!(filter.keep_mask, 0b10);
    assert_eq!(filter.explicit_count, 2);
    assert!(filter.trailing_keep);

    let Stmt::Expression(stmt) = single_stmt("[**]f()") else {
        panic!("expected expression statement");
    };
    assert!(matches!(stmt.expression, Expr::Call(_)));

    let err = parse_err("[_*]x");
    assert_eq!(err.get_message(), "result filter requires a function call");
}

#[test]
fn test_assignment_statements() {
    let Stmt::Assignment(stmt) = single_stmt("a, b.c = 1, 2") else {
        panic!("expected assignment");
    };
    assert_eq!(stmt.operator, AssignmentOperator::Plain);
    assert_eq!(stmt.targets.len(), 2);
    assert_eq!(stmt.values.len(), 2);

    let Stmt::Assignment(stmt) = single_stmt("total ..= \"x\"") else {
        panic!("expected assignment");
    };
    assert_eq!(stmt.operator, AssignmentOperator::Concat);

    let err = parse_err("a, b");
    assert_eq!(err.get_message(), "unexpected expression list without assignment");
}

#[test]
fn test_compound_assignment_in_expression_position() {
    let err = parse_err("local x = += 1");
    assert_eq!(
        err.get_message(),
        "'+=' is a statement, not an expression; use 'do ... end' for statements in arrow functions"
    );
}

#[test]
fn test_update_expressions() {
    let Stmt::Expression(stmt) = single_stmt("count++") else {
        panic!("expected expression statement");
    };
    assert!(matches!(stmt.expression, Expr::Update(update) if !update.is_prefix));
}

#[test]
fn test_conditional_shorthand() {
    let Stmt::ConditionalShorthand(stmt) = single_stmt("a ?? return") else {
        panic!("expected conditional shorthand");
    };

    assert_eq!(stmt.condition.as_identifier().unwrap().symbol, "a");
    let Stmt::Return(ret) = *stmt.body else {
        panic!("expected return body");
    };
    assert!(ret.values.is_empty());
}

#[test]
fn test_conditional_shorthand_return_stays_on_its_line() {
    let block = parse_ok("a ?? return\nprint(1)");
    assert_eq!(block.len(), 2);

    let block = parse_ok("a ?? return err, 1\nprint(1)");
    let Stmt::ConditionalShorthand(stmt) = &block.body[0] else {
        panic!("expected conditional shorthand");
    };
    let Stmt::Return(ret) = stmt.body.as_ref() else {
        panic!("expected return body");
    };
    assert_eq!(ret.values.len(), 2);
}

#[test]
fn test_conditional_shorthand_bodies() {
    let block = parse_ok("while true do x ?? break y ?? continue end");
    let Stmt::While(stmt) = &block.body[0] else {
        panic!("expected while loop");
    };
    assert!(matches!(&stmt.body.body[0], Stmt::ConditionalShorthand(s) if matches!(*s.body, Stmt::Break(_))));
    assert!(matches!(&stmt.body.body[1], Stmt::ConditionalShorthand(s) if matches!(*s.body, Stmt::Continue(_))));

    let Stmt::ConditionalShorthand(stmt) = single_stmt("err ?? raise err, \"failed\"") else {
        panic!("expected conditional shorthand");
    };
    assert!(matches!(*stmt.body, Stmt::Raise(_)));
}

#[test]
fn test_return_forwards_single_call() {
    let Stmt::Function(stmt) = single_stmt("function f() return g() end") else {
        panic!("expected function statement");
    };
    let Stmt::Return(ret) = &stmt.function.body.body[0] else {
        panic!("expected return");
    };
    assert!(ret.forwards_call);

    let Stmt::Function(stmt) = single_stmt("function f() return g(), 1 end") else {
        panic!("expected function statement");
    };
    let Stmt::Return(ret) = &stmt.function.body.body[0] else {
        panic!("expected return");
    };
    assert!(!ret.forwards_call);
}

#[test]
fn test_if_chain() {
    let Stmt::If(stmt) = single_stmt("if a then x = 1 elseif b then x = 2 else x = 3 end") else {
        panic!("expected if statement");
    };

    assert_eq!(stmt.clauses.len(), 3);
    assert!(stmt.clauses[0].condition.is_some());
    assert!(stmt.clauses[1].condition.is_some());
    assert!(stmt.clauses[2].condition.is_none());
}

#[test]
fn test_loops() {
    assert!(matches!(single_stmt("while a do end"), Stmt::While(_)));
    assert!(matches!(single_stmt("repeat a = a + 1 until a > 3"), Stmt::Repeat(_)));
    assert!(matches!(single_stmt("do local x = 1 end"), Stmt::Do(_)));

    let Stmt::NumericFor(stmt) = single_stmt("for i = 1, 10, 2 do end") else {
        panic!("expected numeric for");
    };
    assert_eq!(stmt.control.symbol, "i");
    assert_eq!(number(stmt.step.as_ref().unwrap()), 2.0);

    let Stmt::GenericFor(stmt) = single_stmt("for k, v in pairs(t) do end") else {
        panic!("expected generic for");
    };
    assert_eq!(stmt.names.len(), 2);
    assert_eq!(stmt.iterators.len(), 1);
}

#[test]
fn test_range_loop_becomes_numeric_for() {
    let Stmt::NumericFor(stmt) = single_stmt("for i in {1..10} do end") else {
        panic!("expected numeric for");
    };
    assert_eq!(number(&stmt.start), 1.0);
    assert_eq!(number(&stmt.stop), 9.0);
    assert_eq!(number(stmt.step.as_ref().unwrap()), 1.0);

    let Stmt::NumericFor(stmt) = single_stmt("for i in {5...1} do end") else {
        panic!("expected numeric for");
    };
    assert_eq!(number(&stmt.stop), 1.0);
    assert_eq!(number(stmt.step.as_ref().unwrap()), -1.0);

    let Stmt::NumericFor(stmt) = single_stmt("for i in {0..-3} do end") else {
        panic!("expected numeric for");
    };
    assert_eq!(number(&stmt.stop), -2.0);
    assert_eq!(number(stmt.step.as_ref().unwrap()), -1.0);
}

#[test]
fn test_anonymous_range_loop() {
    let Stmt::NumericFor(stmt) = single_stmt("for {0..3} do end") else {
        panic!("expected numeric for");
    };
    assert!(stmt.control.is_blank);
    assert_eq!(number(&stmt.stop), 2.0);
}

#[test]
fn test_dynamic_range_loop_calls_range() {
    let Stmt::GenericFor(stmt) = single_stmt("for i in {1..n} do end") else {
        panic!("expected generic for");
    };

    let Expr::Call(call) = &stmt.iterators[0] else {
        panic!("expected range call");
    };
    assert!(call.arguments.is_empty());
    assert!(matches!(&call.target, CallTarget::Direct(callee) if matches!(callee.as_ref(), Expr::Range(_))));
}

#[test]
fn test_defer() {
    let Stmt::Defer(stmt) = single_stmt("defer print(\"bye\") end") else {
        panic!("expected defer");
    };
    assert!(stmt.function.parameters.is_empty());
    assert!(stmt.arguments.is_empty());

    let Stmt::Defer(stmt) = single_stmt("defer(file) file:close() end(handle)") else {
        panic!("expected defer");
    };
    assert_eq!(stmt.function.parameters.len(), 1);
    assert_eq!(stmt.arguments.len(), 1);
}

#[test]
fn test_choose_literal_cases() {
    let Expr::Choose(choose) = local_value("local r = choose v from 1 -> \"a\" 2 -> \"b\" else -> \"c\" end") else {
        panic!("expected choose");
    };

    assert_eq!(choose.cases.len(), 3);
    assert!(matches!(choose.cases[0].pattern, ChoosePattern::Value(_)));
    assert!(matches!(choose.cases[1].pattern, ChoosePattern::Value(_)));
    assert!(choose.cases[2].is_else());
    assert!(matches!(choose.scrutinee, ChooseScrutinee::Single(_)));
}

#[test]
fn test_choose_else_must_be_last() {
    let err = parse_err("local r = choose v from else -> 1 2 -> 3 end");

    assert_eq!(err.get_code(), ParserErrorCode::UnexpectedToken);
    assert_eq!(err.get_message(), "'else' must be the last case in choose expression");
}

#[test]
fn test_choose_relational_cases() {
    let source = "local r = choose n from < 0 -> \"neg\" <= 10 -> \"small\" > 100 -> \"huge\" else -> \"mid\" end";
    let Expr::Choose(choose) = local_value(source) else {
        panic!("expected choose");
    };

    assert_eq!(choose.cases.len(), 4);

    let operators: Vec<RelationalOperator> = choose
        .cases
        .iter()
        .filter_map(|case| match case.pattern {
            ChoosePattern::Relational { operator, .. } => Some(operator),
            _ => None,
        })
        .collect();

    assert_eq!(
        operators,
        vec![
            RelationalOperator::LessThan,
            RelationalOperator::LessEqual,
            RelationalOperator::GreaterThan
        ]
    );

    // The result of each case stays a plain string literal
    assert!(matches!(&choose.cases[0].result, ChooseResult::Expr(Expr::Literal(_))));
}

#[test]
fn test_choose_guard_uses_ordinary_relations() {
    let Expr::Choose(choose) = local_value("local r = choose v from x when x > 5 -> 1 else -> 0 end") else {
        panic!("expected choose");
    };

    let guard = choose.cases[0].guard.as_ref().unwrap();
    assert!(matches!(guard, Expr::Binary(binary) if binary.operator == BinaryOperator::GreaterThan));
}

#[test]
fn test_choose_tuple_patterns() {
    let source = "local r = choose (a, b) from (0, 0) -> \"origin\" (_, 0) -> \"x-axis\" (_, _) -> \"other\" end";
    let Expr::Choose(choose) = local_value(source) else {
        panic!("expected choose");
    };

    assert!(matches!(&choose.scrutinee, ChooseScrutinee::Tuple(values) if values.len() == 2));
    assert_eq!(choose.cases.len(), 3);

    let ChoosePattern::Tuple(elements) = &choose.cases[1].pattern else {
        panic!("expected tuple pattern");
    };
    assert!(elements[0].is_none());
    assert!(elements[1].is_some());

    assert!(choose.cases[2].is_wildcard());
}

#[test]
fn test_choose_infers_tuple_arity_from_call() {
    let Expr::Choose(choose) = local_value("local r = choose f() from (0, 1) -> true else -> false end") else {
        panic!("expected choose");
    };

    assert_eq!(choose.inferred_tuple_arity, 2);
    assert!(matches!(choose.cases[0].pattern, ChoosePattern::Tuple(_)));
}

#[test]
fn test_choose_tuple_arity_mismatch() {
    let err = parse_err("local r = choose (a, b) from (1, 2, 3) -> 0 end");

    assert_eq!(err.get_code(), ParserErrorCode::UnexpectedToken);
    assert_eq!(err.get_message(), "tuple pattern has 3 elements but scrutinee has 2");
    assert_eq!(err.get_token().value, "(");
}

#[test]
fn test_choose_wildcard_and_table_patterns() {
    let Expr::Choose(choose) = local_value("local r = choose v from { kind = \"a\" } -> 1 _ -> 2 end") else {
        panic!("expected choose");
    };

    assert!(matches!(choose.cases[0].pattern, ChoosePattern::Table(Expr::Table(_))));
    assert!(choose.cases[1].is_wildcard());
}

#[test]
fn test_choose_statement_results() {
    let source = "choose v from 1 -> x = \"one\" 2 -> x, y = 1, 2 else -> x += 1 end";
    let Stmt::Expression(stmt) = single_stmt(source) else {
        panic!("expected expression statement");
    };
    let Expr::Choose(choose) = stmt.expression else {
        panic!("expected choose");
    };

    assert!(choose.cases.iter().all(|case| case.has_statement_result()));

    let ChooseResult::Statement(stmt) = &choose.cases[1].result else {
        panic!("expected statement result");
    };
    let Stmt::Assignment(assignment) = stmt.as_ref() else {
        panic!("expected assignment");
    };
    assert_eq!(assignment.targets.len(), 2);
}

#[test]
fn test_choose_call_result_followed_by_string_case() {
    let Expr::Choose(choose) = local_value("local r = choose v from \"a\" -> f \"b\" -> g() end") else {
        panic!("expected choose");
    };

    assert_eq!(choose.cases.len(), 2);
    assert!(matches!(&choose.cases[0].result, ChooseResult::Expr(Expr::Identifier(_))));
}

#[test]
fn test_nested_choose_restores_outer_mode() {
    let source = "local r = choose a from 1 -> choose b from < 2 -> \"x\" else -> \"y\" end < 5 -> \"z\" end";
    let Expr::Choose(choose) = local_value(source) else {
        panic!("expected choose");
    };

    assert_eq!(choose.cases.len(), 2);
    assert!(matches!(&choose.cases[1].pattern, ChoosePattern::Relational { operator: RelationalOperator::LessThan, .. }));
}

#[test]
fn test_choose_flags_restored_after_error() {
    let source = "local r = choose (a, b) from (1) -> 0 end".to_string();
    let tokens = tokenize(source, Some("test.fluid".to_string())).unwrap();
    let (parser, result) = parse(tokens, Rc::new("test.fluid".to_string()));

    assert!(result.is_err());
    assert!(!parser.in_choose_expression());
    assert!(!parser.in_guard_expression());
}

#[test]
fn test_try_except() {
    let source = "try <trace>\n  risky()\nexcept e when ERR_A, ERR_B\n  log(e)\nexcept\n  cleanup()\nsuccess\n  done()\nend";
    let Stmt::TryExcept(stmt) = single_stmt(source) else {
        panic!("expected try statement");
    };

    assert!(stmt.enable_trace);
    assert_eq!(stmt.try_block.len(), 1);
    assert_eq!(stmt.except_clauses.len(), 2);
    assert_eq!(stmt.except_clauses[0].exception_var.as_ref().unwrap().symbol, "e");
    assert_eq!(stmt.except_clauses[0].filter_codes.len(), 2);
    assert!(stmt.except_clauses[1].filter_codes.is_empty());
    assert!(stmt.success_block.is_some());
}

#[test]
fn test_try_errors() {
    let err = parse_err("try <debug> x() end");
    assert_eq!(err.get_message(), "unknown try attribute, expected 'trace'");

    let err = parse_err("try\n x()\nexcept\n a()\nexcept when ERR\n b()\nend");
    assert_eq!(err.get_message(), "catch-all 'except' must be the last clause");

    let err = parse_err("try\n x()\nexcept e where ERR\n a()\nend");
    assert_eq!(err.get_message(), "expected 'when' or newline after 'except', not 'where'");

    let err = parse_err("try\n x()\nexcept when\n ERR\nend");
    assert_eq!(err.get_message(), "expected error code(s) after 'when' on the same line");

    let err = parse_err("try\n x()\nexcept when ERR,\n OTHER\nend");
    assert_eq!(err.get_message(), "expected error code after ',' on the same line as 'when'");
}

#[test]
fn test_raise_and_check() {
    let Stmt::Raise(stmt) = single_stmt("raise ERR_Failed, \"bad input\"") else {
        panic!("expected raise");
    };
    assert!(stmt.message.is_some());

    assert!(matches!(single_stmt("check call()"), Stmt::Check(_)));
}

#[test]
fn test_annotations() {
    let source = "@Test(name = \"adds\", tags = [\"fast\", unit], weight = 2, skip); @Pure\nfunction add(a, b) return a + b end";
    let Stmt::Function(stmt) = single_stmt(source) else {
        panic!("expected function statement");
    };

    let annotations = &stmt.function.annotations;
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0].name, "Test");
    assert_eq!(annotations[0].get("name"), Some(&AnnotationValue::String("adds".to_string())));
    assert_eq!(
        annotations[0].get("tags"),
        Some(&AnnotationValue::Array(vec![
            AnnotationValue::String("fast".to_string()),
            AnnotationValue::String("unit".to_string()),
        ]))
    );
    assert_eq!(annotations[0].get("weight"), Some(&AnnotationValue::Number(2.0)));
    assert_eq!(annotations[0].get("skip"), Some(&AnnotationValue::Bool(true)));
    assert_eq!(annotations[1].name, "Pure");
    assert!(annotations[1].args.is_empty());
}

#[test]
fn test_annotations_on_local_function() {
    let Stmt::LocalFunction(stmt) = single_stmt("@Inline local function f() end") else {
        panic!("expected local function");
    };
    assert_eq!(stmt.function.annotations.len(), 1);
}

#[test]
fn test_annotation_errors() {
    let err = parse_err("@Test local x = 1");
    assert_eq!(err.get_message(), "annotations can only precede function declarations");

    let err = parse_err("@Test x = 1");
    assert_eq!(err.get_message(), "annotations must precede a function declaration");

    let err = parse_err("@Test(a = ) function f() end");
    assert_eq!(
        err.get_message(),
        "expected annotation value (string, number, boolean, array, or identifier)"
    );

    let err = parse_err("@Test(a = [1, 2) function f() end");
    assert_eq!(err.get_message(), "expected ']' to close array");

    let err = parse_err("@Test(a = 1 function f() end");
    assert_eq!(err.get_message(), "expected ')' to close annotation arguments");
}

#[test]
fn test_semicolons_are_empty_statements() {
    let block = parse_ok("; local a = 1; ; print(a);");
    assert_eq!(block.len(), 2);
}

#[test]
fn test_composite_spans_cover_children() {
    let Expr::Binary(binary) = local_value("local x = 1 + 2") else {
        panic!("expected binary expression");
    };

    assert_eq!(binary.span.start.offset, binary.left.get_span().start.offset);
    assert_eq!(binary.span.end.offset, binary.right.get_span().end.offset);
    assert_eq!(binary.span.start.offset, 10);
    assert_eq!(binary.span.end.offset, 15);

    let Stmt::If(stmt) = single_stmt("if a then b() end") else {
        panic!("expected if statement");
    };
    assert_eq!(stmt.span.start.offset, 0);
    assert_eq!(stmt.span.end.offset, 17);
}

#[test]
fn test_empty_blocks_take_terminator_span() {
    let Stmt::While(stmt) = single_stmt("while x do end") else {
        panic!("expected while loop");
    };
    assert!(!stmt.body.span.is_empty());
    assert_eq!(stmt.body.span.start.offset, 11);
    assert_eq!(stmt.body.span.end.offset, 14);

    let Stmt::Function(stmt) = single_stmt("function f()end") else {
        panic!("expected function statement");
    };
    assert!(!stmt.function.body.span.is_empty());
    assert_eq!(stmt.function.body.span.start.offset, 12);
}

fn assert_within(child: &Span, parent: &Span, what: &str) {
    assert!(!child.is_empty(), "{} has an empty span {:?}", what, child);
    assert!(
        child.start.offset >= parent.start.offset && child.end.offset <= parent.end.offset,
        "{} span {:?} lies outside {:?}",
        what,
        child,
        parent
    );
}

fn check_block_spans(block: &BlockStmt, parent: &Span) {
    assert_within(&block.span, parent, "block");

    for stmt in block.iter() {
        check_stmt_spans(stmt, &block.span);
    }
}

fn check_exprs(exprs: &[Expr], parent: &Span) {
    for expr in exprs {
        check_expr_spans(expr, parent);
    }
}

fn check_stmt_spans(stmt: &Stmt, parent: &Span) {
    let span = stmt.get_span();
    assert_within(span, parent, "statement");

    match stmt {
        Stmt::Expression(stmt) => check_expr_spans(&stmt.expression, span),
        Stmt::Assignment(stmt) => {
            check_exprs(&stmt.targets, span);
            check_exprs(&stmt.values, span);
        }
        Stmt::LocalDecl(decl) | Stmt::GlobalDecl(decl) => check_exprs(&decl.values, span),
        Stmt::LocalFunction(stmt) => check_block_spans(&stmt.function.body, span),
        Stmt::Function(stmt) => check_block_spans(&stmt.function.body, span),
        Stmt::If(stmt) => {
            for clause in &stmt.clauses {
                if let Some(condition) = &clause.condition {
                    check_expr_spans(condition, span);
                }
                check_block_spans(&clause.block, span);
            }
        }
        Stmt::While(stmt) => {
            check_expr_spans(&stmt.condition, span);
            check_block_spans(&stmt.body, span);
        }
        Stmt::Repeat(stmt) => {
            check_block_spans(&stmt.body, span);
            check_expr_spans(&stmt.condition, span);
        }
        Stmt::NumericFor(stmt) => {
            check_expr_spans(&stmt.start, span);
            check_expr_spans(&stmt.stop, span);
            if let Some(step) = &stmt.step {
                check_expr_spans(step, span);
            }
            check_block_spans(&stmt.body, span);
        }
        Stmt::GenericFor(stmt) => {
            check_exprs(&stmt.iterators, span);
            check_block_spans(&stmt.body, span);
        }
        Stmt::Return(stmt) => check_exprs(&stmt.values, span),
        Stmt::Break(_) | Stmt::Continue(_) => {}
        Stmt::Defer(stmt) => {
            assert_within(&stmt.function.span, span, "deferred function");
            check_block_spans(&stmt.function.body, &stmt.function.span);
            check_exprs(&stmt.arguments, span);
        }
        Stmt::Do(stmt) => check_block_spans(&stmt.block, span),
        Stmt::ConditionalShorthand(stmt) => {
            check_expr_spans(&stmt.condition, span);
            check_stmt_spans(&stmt.body, span);
        }
        Stmt::TryExcept(stmt) => {
            check_block_spans(&stmt.try_block, span);
            for clause in &stmt.except_clauses {
                check_exprs(&clause.filter_codes, span);
                check_block_spans(&clause.block, span);
            }
            if let Some(success) = &stmt.success_block {
                check_block_spans(success, span);
            }
        }
        Stmt::Raise(stmt) => {
            check_expr_spans(&stmt.error_code, span);
            if let Some(message) = &stmt.message {
                check_expr_spans(message, span);
            }
        }
        Stmt::Check(stmt) => check_expr_spans(&stmt.error_code, span),
    }
}

fn check_case_spans(case: &ChooseCase, parent: &Span) {
    let span = &case.span;
    assert_within(span, parent, "choose case");

    match &case.pattern {
        ChoosePattern::Value(value) | ChoosePattern::Table(value) => check_expr_spans(value, span),
        ChoosePattern::Relational { value, .. } => check_expr_spans(value, span),
        ChoosePattern::Tuple(elements) => {
            for element in elements.iter().flatten() {
                check_expr_spans(element, span);
            }
        }
        ChoosePattern::Else | ChoosePattern::Wildcard => {}
    }

    if let Some(guard) = &case.guard {
        check_expr_spans(guard, span);
    }

    match &case.result {
        ChooseResult::Expr(value) => check_expr_spans(value, span),
        ChooseResult::Statement(stmt) => check_stmt_spans(stmt, span),
    }
}

fn check_expr_spans(expr: &Expr, parent: &Span) {
    let span = expr.get_span();
    assert_within(span, parent, "expression");

    match expr {
        Expr::Literal(_) | Expr::Identifier(_) | Expr::VarArg(_) => {}
        Expr::Unary(unary) => check_expr_spans(&unary.operand, span),
        Expr::Update(update) => check_expr_spans(&update.target, span),
        Expr::Binary(binary) => {
            check_expr_spans(&binary.left, span);
            check_expr_spans(&binary.right, span);
        }
        Expr::Ternary(ternary) => {
            check_expr_spans(&ternary.condition, span);
            check_expr_spans(&ternary.if_true, span);
            check_expr_spans(&ternary.if_false, span);
        }
        Expr::Presence(presence) => check_expr_spans(&presence.value, span),
        Expr::Pipe(pipe) => {
            check_expr_spans(&pipe.lhs, span);
            check_expr_spans(&pipe.rhs_call, span);
        }
        Expr::Call(call) => {
            match &call.target {
                CallTarget::Direct(callee) => check_expr_spans(callee, span),
                CallTarget::Method { receiver, .. } | CallTarget::SafeMethod { receiver, .. } => {
                    check_expr_spans(receiver, span)
                }
            }
            check_exprs(&call.arguments, span);
        }
        Expr::Member(member) | Expr::SafeMember(member) => check_expr_spans(&member.table, span),
        Expr::Index(index) | Expr::SafeIndex(index) => {
            check_expr_spans(&index.table, span);
            check_expr_spans(&index.index, span);
        }
        Expr::ResultFilter(filter) => check_expr_spans(&filter.expression, span),
        Expr::Table(table) => {
            for field in &table.fields {
                if let Some(key) = &field.key {
                    check_expr_spans(key, span);
                }
                check_expr_spans(&field.value, span);
            }
        }
        Expr::Function(function) => check_block_spans(&function.body, span),
        Expr::Range(range) => {
            check_expr_spans(&range.start, span);
            check_expr_spans(&range.stop, span);
        }
        Expr::Choose(choose) => {
            match &choose.scrutinee {
                ChooseScrutinee::Single(value) => check_expr_spans(value, span),
                ChooseScrutinee::Tuple(values) => check_exprs(values, span),
            }
            for case in &choose.cases {
                check_case_spans(case, span);
            }
        }
    }
}

const EVERY_CONSTRUCT: &str = r#"
@Test(name = "all")
function m.run(a: num, ...): <num, str>
   local t <const> = { 1, key = "v", [a] = a ^ 2 }
   local f = x => x * 2
   local g = (p, q) => do return p + q end
   local lazy = <{ a .. "s" }>
   local typed = <num{ a + 1 }>
   local arr = array<num, 4> { 1, 2 }
   local empty = array<str>
   a ?? return
   t.key ??= "w"
   t[1] = t.key
   local present = f(a??)
   local r = -a ^ 2 + #t
   local c = a in t ? t?.key :> t?[1]
   count++;
   [_*]load() |2> store(a);
   {1..3} |> print
   for i in {1..10} do end
   for i in {1..a} do end
   for {0..3} do end
   for k, v in pairs(t) do continue end
   for i = 1, 10, 2 do break end
   while a < 10 do a += 1 end
   repeat a -= 1 until a == 0
   if a then elseif b then else end
   do end
   defer(h) h:close() end(t)
   local pick = choose (a, b) from
      (1, _) -> "one"
      (_, 2) when b > 1 -> "two"
      else -> "other"
   end
   choose a from
      < 0 -> total = 0
      { kind = "x" } -> total = 1
      _ -> total = 2
   end
   try <trace>
   except e when ERR_A, ERR_B
   except
   success
   end
   raise ERR_A, "bad"
   check f(1)
   local once = thunk() return 1 end
   local v = t?:get(...)
   return f(a)
end

local function helper() end
global x = 1
"#;

#[test]
fn test_every_node_span_is_non_empty_and_nested() {
    let chunk = parse_ok(EVERY_CONSTRUCT);
    assert_eq!(chunk.len(), 3);

    let whole = chunk.span;
    check_block_spans(&chunk, &whole);
}

#[test]
fn test_error_reports_position() {
    let err = parse_err("local x = 1\nlocal y = end");

    assert_eq!(err.get_code(), ParserErrorCode::UnexpectedToken);
    assert_eq!(err.get_position().line, 2);
    assert_eq!(err.get_position().column, 11);
    assert_eq!(err.get_message(), "Expected expression, got 'end'");
}

#[test]
fn test_missing_end() {
    let err = parse_err("if a then b()");

    assert_eq!(err.get_code(), ParserErrorCode::ExpectedToken);
    assert_eq!(err.get_message(), "Expected 'end', got '<eof>'");
}
