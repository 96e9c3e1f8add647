use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("and", TokenKind::And);
        map.insert("break", TokenKind::Break);
        map.insert("continue", TokenKind::Continue);
        map.insert("do", TokenKind::Do);
        map.insert("else", TokenKind::Else);
        map.insert("elseif", TokenKind::ElseIf);
        map.insert("end", TokenKind::End);
        map.insert("false", TokenKind::False);
        map.insert("for", TokenKind::For);
        map.insert("function", TokenKind::Function);
        map.insert("global", TokenKind::Global);
        map.insert("if", TokenKind::If);
        map.insert("in", TokenKind::In);
        map.insert("is", TokenKind::Is);
        map.insert("local", TokenKind::Local);
        map.insert("nil", TokenKind::Nil);
        map.insert("not", TokenKind::Not);
        map.insert("or", TokenKind::Or);
        map.insert("repeat", TokenKind::Repeat);
        map.insert("return", TokenKind::Return);
        map.insert("then", TokenKind::Then);
        map.insert("true", TokenKind::True);
        map.insert("until", TokenKind::Until);
        map.insert("while", TokenKind::While);
        map.insert("defer", TokenKind::Defer);
        map.insert("thunk", TokenKind::Thunk);
        map.insert("choose", TokenKind::Choose);
        map.insert("from", TokenKind::From);
        map.insert("when", TokenKind::When);
        map.insert("try", TokenKind::Try);
        map.insert("except", TokenKind::Except);
        map.insert("success", TokenKind::Success);
        map.insert("raise", TokenKind::Raise);
        map.insert("check", TokenKind::Check);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Unrecognised,
    Number,
    String,
    Identifier,

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    Equals,     // ==
    NotEquals,  // != or ~=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Dot,
    Concat,   // ..
    Ellipsis, // ...
    Semicolon,
    Colon,
    Comma,
    Question,
    Hash,
    At,

    Plus,
    Dash,
    Star,
    Slash,
    Percent,
    Caret,
    Ampersand,
    Bar,
    Tilde,
    ShiftLeft,
    ShiftRight,

    PlusPlus,
    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    PercentEquals,
    ConcatEquals,
    QuestionEquals,       // ?=
    DoubleQuestionEquals, // ??=
    IfEmpty,              // ??

    SafeField,  // ?.
    SafeIndex,  // ?[
    SafeMethod, // ?:
    TernarySep, // :>
    CaseArrow,  // ->
    Arrow,      // =>
    Pipe,       // |> or |N>

    DeferredOpen,  // <{
    DeferredTyped, // <type{
    DeferredClose, // }>
    ArrayTyped,    // array<type[, N]>

    // Reserved
    And,
    Break,
    Continue,
    Do,
    Else,
    ElseIf,
    End,
    False,
    For,
    Function,
    Global,
    If,
    In,
    Is,
    Local,
    Nil,
    Not,
    Or,
    Repeat,
    Return,
    Then,
    True,
    Until,
    While,
    Defer,
    Thunk,
    Choose,
    From,
    When,
    Try,
    Except,
    Success,
    Raise,
    Check,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl TokenKind {
    /// True for every token that can begin an expression.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Number
                | TokenKind::String
                | TokenKind::Nil
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Ellipsis
                | TokenKind::Function
                | TokenKind::Identifier
                | TokenKind::OpenCurly
                | TokenKind::OpenParen
                | TokenKind::Not
                | TokenKind::PlusPlus
                | TokenKind::Dash
                | TokenKind::Tilde
                | TokenKind::Hash
        )
    }

    pub fn is_compound_assignment(&self) -> bool {
        matches!(
            self,
            TokenKind::PlusEquals
                | TokenKind::MinusEquals
                | TokenKind::StarEquals
                | TokenKind::SlashEquals
                | TokenKind::PercentEquals
                | TokenKind::ConcatEquals
                | TokenKind::QuestionEquals
                | TokenKind::DoubleQuestionEquals
        )
    }
}

/// Size part of an `array<type, size>` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySizeHint {
    None,
    Literal(u32),
    /// `array<type,` was lexed; the parser reads the size expression and the closing `>`.
    Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenPayload {
    None,
    Number(f64),
    String(String),
    PipeLimit(u32),
    Presence { postfix: bool },
    DeferredType(String),
    ArrayType { element: String, size: ArraySizeHint },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
    pub payload: TokenPayload,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{\nkind: {},\nvalue: {}}}", self.kind, self.value)
    }
}

impl Token {
    pub fn is_one_of_many(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }

    /// The lexer's verdict on whether a `??` is the postfix presence check rather than
    /// the binary if-empty operator.
    pub fn is_postfix_presence(&self) -> bool {
        matches!(self.payload, TokenPayload::Presence { postfix: true })
    }

    pub fn number(&self) -> Option<f64> {
        match self.payload {
            TokenPayload::Number(value) => Some(value),
            _ => None,
        }
    }

    /// Text shown in diagnostics.
    pub fn describe(&self) -> &str {
        match self.kind {
            TokenKind::EOF => "<eof>",
            _ => &self.value,
        }
    }

    pub fn debug(&self) {
        if self.is_one_of_many(&[TokenKind::String, TokenKind::Identifier, TokenKind::Number]) {
            println!("{} ({})", self.kind, self.value);
        } else {
            println!("{} ()", self.kind);
        }
    }
}

impl TokenKind {
    /// Source spelling used in diagnostics.
    pub fn text(&self) -> &'static str {
        match self {
            TokenKind::EOF => "<eof>",
            TokenKind::Unrecognised => "<unrecognised>",
            TokenKind::Number => "<number>",
            TokenKind::String => "<string>",
            TokenKind::Identifier => "<name>",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::OpenCurly => "{",
            TokenKind::CloseCurly => "}",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::Assignment => "=",
            TokenKind::Equals => "==",
            TokenKind::NotEquals => "~=",
            TokenKind::Less => "<",
            TokenKind::LessEquals => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEquals => ">=",
            TokenKind::Dot => ".",
            TokenKind::Concat => "..",
            TokenKind::Ellipsis => "...",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Question => "?",
            TokenKind::Hash => "#",
            TokenKind::At => "@",
            TokenKind::Plus => "+",
            TokenKind::Dash => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Caret => "^",
            TokenKind::Ampersand => "&",
            TokenKind::Bar => "|",
            TokenKind::Tilde => "~",
            TokenKind::ShiftLeft => "<<",
            TokenKind::ShiftRight => ">>",
            TokenKind::PlusPlus => "++",
            TokenKind::PlusEquals => "+=",
            TokenKind::MinusEquals => "-=",
            TokenKind::StarEquals => "*=",
            TokenKind::SlashEquals => "/=",
            TokenKind::PercentEquals => "%=",
            TokenKind::ConcatEquals => "..=",
            TokenKind::QuestionEquals => "?=",
            TokenKind::DoubleQuestionEquals => "??=",
            TokenKind::IfEmpty => "??",
            TokenKind::SafeField => "?.",
            TokenKind::SafeIndex => "?[",
            TokenKind::SafeMethod => "?:",
            TokenKind::TernarySep => ":>",
            TokenKind::CaseArrow => "->",
            TokenKind::Arrow => "=>",
            TokenKind::Pipe => "|>",
            TokenKind::DeferredOpen => "<{",
            TokenKind::DeferredTyped => "<type{",
            TokenKind::DeferredClose => "}>",
            TokenKind::ArrayTyped => "array<>",
            TokenKind::And => "and",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::ElseIf => "elseif",
            TokenKind::End => "end",
            TokenKind::False => "false",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::Global => "global",
            TokenKind::If => "if",
            TokenKind::In => "in",
            TokenKind::Is => "is",
            TokenKind::Local => "local",
            TokenKind::Nil => "nil",
            TokenKind::Not => "not",
            TokenKind::Or => "or",
            TokenKind::Repeat => "repeat",
            TokenKind::Return => "return",
            TokenKind::Then => "then",
            TokenKind::True => "true",
            TokenKind::Until => "until",
            TokenKind::While => "while",
            TokenKind::Defer => "defer",
            TokenKind::Thunk => "thunk",
            TokenKind::Choose => "choose",
            TokenKind::From => "from",
            TokenKind::When => "when",
            TokenKind::Try => "try",
            TokenKind::Except => "except",
            TokenKind::Success => "success",
            TokenKind::Raise => "raise",
            TokenKind::Check => "check",
        }
    }
}
