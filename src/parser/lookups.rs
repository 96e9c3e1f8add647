use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{
    ast::{
        ast::Stmt,
        expressions::{AssignmentOperator, BinaryOperator},
    },
    errors::errors::ParserResult,
    lexer::tokens::{Token, TokenKind},
};

use super::{parser::Parser, stmt::*};

/// Left and right binding powers; higher binds tighter. A right power lower than
/// the left power makes the operator right-associative.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct BindingPower {
    pub left: u8,
    pub right: u8,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct BinaryOperatorInfo {
    pub operator: BinaryOperator,
    pub power: BindingPower,
}

pub const TERNARY_PRECEDENCE: u8 = 1;
pub const PIPE_PRECEDENCE: u8 = 2;
pub const MEMBERSHIP_POWER: BindingPower = BindingPower { left: 3, right: 3 };

const fn op(operator: BinaryOperator, left: u8, right: u8) -> BinaryOperatorInfo {
    BinaryOperatorInfo {
        operator,
        power: BindingPower { left, right },
    }
}

lazy_static! {
    pub static ref BINARY_OPERATORS: HashMap<TokenKind, BinaryOperatorInfo> = {
        let mut map = HashMap::new();
        map.insert(TokenKind::Plus, op(BinaryOperator::Add, 6, 6));
        map.insert(TokenKind::Dash, op(BinaryOperator::Subtract, 6, 6));
        map.insert(TokenKind::Star, op(BinaryOperator::Multiply, 7, 7));
        map.insert(TokenKind::Slash, op(BinaryOperator::Divide, 7, 7));
        map.insert(TokenKind::Percent, op(BinaryOperator::Modulo, 7, 7));
        map.insert(TokenKind::Concat, op(BinaryOperator::Concat, 5, 4));
        map.insert(TokenKind::Equals, op(BinaryOperator::Equal, 3, 3));
        map.insert(TokenKind::Is, op(BinaryOperator::Equal, 3, 3));
        map.insert(TokenKind::NotEquals, op(BinaryOperator::NotEqual, 3, 3));
        map.insert(TokenKind::Less, op(BinaryOperator::LessThan, 3, 3));
        map.insert(TokenKind::LessEquals, op(BinaryOperator::LessEqual, 3, 3));
        map.insert(TokenKind::Greater, op(BinaryOperator::GreaterThan, 3, 3));
        map.insert(TokenKind::GreaterEquals, op(BinaryOperator::GreaterEqual, 3, 3));
        map.insert(TokenKind::And, op(BinaryOperator::LogicalAnd, 2, 2));
        map.insert(TokenKind::Or, op(BinaryOperator::LogicalOr, 1, 1));
        map.insert(TokenKind::IfEmpty, op(BinaryOperator::IfEmpty, 1, 1));
        map.insert(TokenKind::ShiftLeft, op(BinaryOperator::ShiftLeft, 5, 5));
        map.insert(TokenKind::ShiftRight, op(BinaryOperator::ShiftRight, 5, 5));
        map.insert(TokenKind::Caret, op(BinaryOperator::Power, 10, 9));
        map.insert(TokenKind::Ampersand, op(BinaryOperator::BitAnd, 4, 4));
        map.insert(TokenKind::Bar, op(BinaryOperator::BitOr, 2, 2));
        map.insert(TokenKind::Tilde, op(BinaryOperator::BitXor, 3, 3));
        map
    };
}

/// Binary operator for `token`, if it is one here. A `??` the lexer marked as
/// postfix is a presence check, not if-empty.
pub fn match_binary_operator(token: &Token) -> Option<BinaryOperatorInfo> {
    if token.kind == TokenKind::IfEmpty && token.is_postfix_presence() {
        return None;
    }

    BINARY_OPERATORS.get(&token.kind).copied()
}

pub fn is_relational(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Less | TokenKind::LessEquals | TokenKind::Greater | TokenKind::GreaterEquals
    )
}

/// Scans forward from a relational operator inside `choose` cases. `< 10 ->` is
/// the start of a relational case, so the operator must not extend the pattern
/// before it.
pub fn is_choose_relational_pattern(parser: &Parser) -> bool {
    // `< = 5 ->` spells `<=` with a space
    let mut pos = match (parser.current_token_kind(), parser.peek_kind(1)) {
        (TokenKind::Less | TokenKind::Greater, TokenKind::Assignment) => 2,
        _ => 1,
    };
    let mut depth = 0usize;

    while pos < parser.get_config().lookahead_limit {
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
                    return false;
                }
                depth -= 1;
            }
            TokenKind::EOF => return false,
            TokenKind::CaseArrow if depth == 0 => return true,
            TokenKind::End
            | TokenKind::Else
            | TokenKind::When
            | TokenKind::Comma
            | TokenKind::Semicolon
            | TokenKind::Then
            | TokenKind::Do
                if depth == 0 =>
            {
                return false
            }
            _ => {}
        }

        pos += 1;
    }

    false
}

pub fn assignment_operator(kind: TokenKind) -> Option<AssignmentOperator> {
    match kind {
        TokenKind::Assignment => Some(AssignmentOperator::Plain),
        TokenKind::PlusEquals => Some(AssignmentOperator::Add),
        TokenKind::MinusEquals => Some(AssignmentOperator::Subtract),
        TokenKind::StarEquals => Some(AssignmentOperator::Multiply),
        TokenKind::SlashEquals => Some(AssignmentOperator::Divide),
        TokenKind::PercentEquals => Some(AssignmentOperator::Modulo),
        TokenKind::ConcatEquals => Some(AssignmentOperator::Concat),
        TokenKind::QuestionEquals => Some(AssignmentOperator::IfEmpty),
        TokenKind::DoubleQuestionEquals => Some(AssignmentOperator::IfNil),
        _ => None,
    }
}

pub type StmtHandler = fn(&mut Parser) -> ParserResult<Stmt>;

pub fn create_token_lookups(parser: &mut Parser) {
    // Declarations
    parser.stmt(TokenKind::Local, parse_local_stmt);
    parser.stmt(TokenKind::Global, parse_global_stmt);
    parser.stmt(TokenKind::Function, parse_function_stmt);
    parser.stmt(TokenKind::Thunk, parse_function_stmt);
    parser.stmt(TokenKind::At, parse_annotated_stmt);

    // Control flow
    parser.stmt(TokenKind::If, parse_if_stmt);
    parser.stmt(TokenKind::While, parse_while_stmt);
    parser.stmt(TokenKind::Repeat, parse_repeat_stmt);
    parser.stmt(TokenKind::For, parse_for_stmt);
    parser.stmt(TokenKind::Do, parse_do_stmt);
    parser.stmt(TokenKind::Defer, parse_defer_stmt);
    parser.stmt(TokenKind::Return, parse_return_stmt);
    parser.stmt(TokenKind::Break, parse_break_stmt);
    parser.stmt(TokenKind::Continue, parse_continue_stmt);

    // Exceptions
    parser.stmt(TokenKind::Try, parse_try_stmt);
    parser.stmt(TokenKind::Raise, parse_raise_stmt);
    parser.stmt(TokenKind::Check, parse_check_stmt);
}

// Lookup tables inside parser struct, so it's easier
pub type StmtLookup = HashMap<TokenKind, StmtHandler>;
