use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::{
    errors::errors::{fail, ParserErrorCode, ParserResult},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{ArraySizeHint, Token, TokenKind, TokenPayload, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex) -> ParserResult<()>;

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

/// Anchors `source` to the current lexer position so a pattern can only match there.
fn pattern(source: &str, handler: RegexHandler) -> RegexPattern {
    RegexPattern {
        regex: Regex::new(&format!("^(?:{})", source)).expect("token patterns are valid regular expressions"),
        handler,
    }
}

lazy_static! {
    // Order matters: the first pattern that matches wins, so longer operators come first.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        pattern("\\s+", skip_handler),
        pattern("--\\[\\[(?s:.*?)\\]\\]", skip_handler),
        pattern("--[^\\n]*", skip_handler),
        pattern("//[^\\n]*", skip_handler),
        pattern("array<\\s*([a-zA-Z_][a-zA-Z0-9_]*)\\s*(?:,\\s*([0-9]+)\\s*>|,|>)", array_handler),
        pattern("[a-zA-Z_][a-zA-Z0-9_]*", symbol_handler),
        pattern("0[xX][0-9a-fA-F]+|[0-9]+(?:\\.[0-9]+)?(?:[eE][+-]?[0-9]+)?", number_handler),
        pattern("\"(?:[^\"\\\\\\n]|\\\\.)*\"", string_handler),
        pattern("'(?:[^'\\\\\\n]|\\\\.)*'", string_handler),
        pattern("\\[\\[(?s:.*?)\\]\\]", long_string_handler),
        pattern("[\"']", unterminated_string_handler),
        pattern("<[a-zA-Z_][a-zA-Z0-9_]*\\{", deferred_typed_handler),
        pattern("<\\{", MK_DEFAULT_HANDLER!(TokenKind::DeferredOpen, "<{")),
        pattern("\\}>", MK_DEFAULT_HANDLER!(TokenKind::DeferredClose, "}>")),
        pattern("\\.\\.\\.", MK_DEFAULT_HANDLER!(TokenKind::Ellipsis, "...")),
        pattern("\\.\\.=", MK_DEFAULT_HANDLER!(TokenKind::ConcatEquals, "..=")),
        pattern("\\.\\.", MK_DEFAULT_HANDLER!(TokenKind::Concat, "..")),
        pattern("\\.", MK_DEFAULT_HANDLER!(TokenKind::Dot, ".")),
        pattern("\\?\\?=", MK_DEFAULT_HANDLER!(TokenKind::DoubleQuestionEquals, "??=")),
        pattern("\\?\\?", if_empty_handler),
        pattern("\\?=", MK_DEFAULT_HANDLER!(TokenKind::QuestionEquals, "?=")),
        pattern("\\?\\.", MK_DEFAULT_HANDLER!(TokenKind::SafeField, "?.")),
        pattern("\\?\\[", MK_DEFAULT_HANDLER!(TokenKind::SafeIndex, "?[")),
        pattern("\\?:", MK_DEFAULT_HANDLER!(TokenKind::SafeMethod, "?:")),
        pattern("\\?", MK_DEFAULT_HANDLER!(TokenKind::Question, "?")),
        pattern(":>", MK_DEFAULT_HANDLER!(TokenKind::TernarySep, ":>")),
        pattern("▷", MK_DEFAULT_HANDLER!(TokenKind::TernarySep, "▷")),
        pattern(":", MK_DEFAULT_HANDLER!(TokenKind::Colon, ":")),
        pattern("==", MK_DEFAULT_HANDLER!(TokenKind::Equals, "==")),
        pattern("=>", MK_DEFAULT_HANDLER!(TokenKind::Arrow, "=>")),
        pattern("=", MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=")),
        pattern("!=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=")),
        pattern("~=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "~=")),
        pattern("~", MK_DEFAULT_HANDLER!(TokenKind::Tilde, "~")),
        pattern("<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=")),
        pattern("<<", MK_DEFAULT_HANDLER!(TokenKind::ShiftLeft, "<<")),
        pattern("<", MK_DEFAULT_HANDLER!(TokenKind::Less, "<")),
        pattern(">=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=")),
        pattern(">>", MK_DEFAULT_HANDLER!(TokenKind::ShiftRight, ">>")),
        pattern(">", MK_DEFAULT_HANDLER!(TokenKind::Greater, ">")),
        pattern("->", MK_DEFAULT_HANDLER!(TokenKind::CaseArrow, "->")),
        pattern("-=", MK_DEFAULT_HANDLER!(TokenKind::MinusEquals, "-=")),
        pattern("-", MK_DEFAULT_HANDLER!(TokenKind::Dash, "-")),
        pattern("\\+\\+", MK_DEFAULT_HANDLER!(TokenKind::PlusPlus, "++")),
        pattern("\\+=", MK_DEFAULT_HANDLER!(TokenKind::PlusEquals, "+=")),
        pattern("\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+")),
        pattern("\\*=", MK_DEFAULT_HANDLER!(TokenKind::StarEquals, "*=")),
        pattern("\\*", MK_DEFAULT_HANDLER!(TokenKind::Star, "*")),
        pattern("/=", MK_DEFAULT_HANDLER!(TokenKind::SlashEquals, "/=")),
        pattern("/", MK_DEFAULT_HANDLER!(TokenKind::Slash, "/")),
        pattern("%=", MK_DEFAULT_HANDLER!(TokenKind::PercentEquals, "%=")),
        pattern("%", MK_DEFAULT_HANDLER!(TokenKind::Percent, "%")),
        pattern("\\^", MK_DEFAULT_HANDLER!(TokenKind::Caret, "^")),
        pattern("&", MK_DEFAULT_HANDLER!(TokenKind::Ampersand, "&")),
        pattern("\\|[0-9]*>", pipe_handler),
        pattern("\\|", MK_DEFAULT_HANDLER!(TokenKind::Bar, "|")),
        pattern("#", MK_DEFAULT_HANDLER!(TokenKind::Hash, "#")),
        pattern("@", MK_DEFAULT_HANDLER!(TokenKind::At, "@")),
        pattern("\\[", MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[")),
        pattern("\\]", MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]")),
        pattern("\\{", MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{")),
        pattern("\\}", MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}")),
        pattern("\\(", MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(")),
        pattern("\\)", MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")")),
        pattern(",", MK_DEFAULT_HANDLER!(TokenKind::Comma, ",")),
        pattern(";", MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";")),
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(source: String) -> Lexer {
        Lexer {
            tokens: vec![],
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Moves `n` bytes forward, keeping line and column in step.
    pub fn advance_n(&mut self, n: usize) {
        let end = (self.pos + n).min(self.source.len());

        for ch in self.source[self.pos..end].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }

        self.pos = end;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn position(&self) -> Position {
        Position::new(self.pos as u32, self.line, self.column)
    }

    pub fn at(&self) -> char {
        self.remainder().chars().next().unwrap_or('\0')
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Consumes `len` bytes and records them as a token of `kind`.
    fn push_matched(&mut self, kind: TokenKind, len: usize, payload: TokenPayload) {
        let start = self.position();
        let value = self.remainder()[..len].to_string();
        self.advance_n(len);
        let end = self.position();

        self.push(MK_TOKEN!(kind, value, Span { start, end }, payload));
    }

    fn error_token(&self, value: String) -> Token {
        let start = self.position();
        let end = Position::new(start.offset + value.len() as u32, start.line, start.column + 1);

        MK_TOKEN!(TokenKind::Unrecognised, value, Span { start, end })
    }
}

fn matched_len(lexer: &Lexer, regex: &Regex) -> usize {
    regex.find(lexer.remainder()).map(|m| m.end()).unwrap_or(0)
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) -> ParserResult<()> {
    let len = matched_len(lexer, regex);
    lexer.advance_n(len);
    Ok(())
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) -> ParserResult<()> {
    let len = matched_len(lexer, regex);
    let text = &lexer.remainder()[..len];

    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok().map(|value| value as f64)
    } else {
        text.parse::<f64>().ok()
    };

    match parsed {
        Some(value) => {
            lexer.push_matched(TokenKind::Number, len, TokenPayload::Number(value));
            Ok(())
        }
        None => {
            let token = lexer.error_token(text.to_string());
            fail(ParserErrorCode::UnrecognisedToken, &token, format!("malformed number '{}'", text))
        }
    }
}

fn string_handler(lexer: &mut Lexer, regex: &Regex) -> ParserResult<()> {
    let len = matched_len(lexer, regex);
    let literal = &lexer.remainder()[1..len - 1];

    let mut result = String::new();
    let mut chars = literal.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('0') => result.push('\0'),
            Some('x') => {
                let mut hex = String::new();

                for _ in 0..2 {
                    match chars.peek() {
                        Some(digit) if digit.is_ascii_hexdigit() => {
                            hex.push(*digit);
                            chars.next();
                        }
                        _ => break,
                    }
                }

                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) => result.push(byte as char),
                    Err(_) => result.push_str("\\x"),
                }
            }
            // Unknown escapes keep the backslash
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    let start = lexer.position();
    lexer.advance_n(len);
    let end = lexer.position();
    lexer.push(MK_TOKEN!(TokenKind::String, result.clone(), Span { start, end }, TokenPayload::String(result)));
    Ok(())
}

fn long_string_handler(lexer: &mut Lexer, regex: &Regex) -> ParserResult<()> {
    let len = matched_len(lexer, regex);
    let body = &lexer.remainder()[2..len - 2];
    // A newline directly after the opening bracket is not part of the string.
    let body = body.strip_prefix('\n').unwrap_or(body).to_string();

    let start = lexer.position();
    lexer.advance_n(len);
    let end = lexer.position();
    lexer.push(MK_TOKEN!(TokenKind::String, body.clone(), Span { start, end }, TokenPayload::String(body)));
    Ok(())
}

fn unterminated_string_handler(lexer: &mut Lexer, _regex: &Regex) -> ParserResult<()> {
    let token = lexer.error_token(lexer.at().to_string());
    fail(ParserErrorCode::UnrecognisedToken, &token, "unterminated string literal")
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) -> ParserResult<()> {
    let len = matched_len(lexer, regex);
    let kind = RESERVED_LOOKUP
        .get(&lexer.remainder()[..len])
        .copied()
        .unwrap_or(TokenKind::Identifier);

    lexer.push_matched(kind, len, TokenPayload::None);
    Ok(())
}

fn array_handler(lexer: &mut Lexer, regex: &Regex) -> ParserResult<()> {
    let Some(captures) = regex.captures(lexer.remainder()) else {
        return Ok(());
    };

    let len = captures.get(0).map(|m| m.end()).unwrap_or(0);
    let element = captures.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();

    let size = match captures.get(2) {
        Some(digits) => match digits.as_str().parse::<u32>() {
            Ok(value) => ArraySizeHint::Literal(value),
            Err(_) => {
                let token = lexer.error_token(digits.as_str().to_string());
                return fail(ParserErrorCode::UnrecognisedToken, &token, "array size is too large");
            }
        },
        None if lexer.remainder()[..len].ends_with(',') => ArraySizeHint::Expression,
        None => ArraySizeHint::None,
    };

    lexer.push_matched(TokenKind::ArrayTyped, len, TokenPayload::ArrayType { element, size });
    Ok(())
}

fn deferred_typed_handler(lexer: &mut Lexer, regex: &Regex) -> ParserResult<()> {
    let len = matched_len(lexer, regex);
    let type_name = lexer.remainder()[1..len - 1].to_string();

    lexer.push_matched(TokenKind::DeferredTyped, len, TokenPayload::DeferredType(type_name));
    Ok(())
}

fn pipe_handler(lexer: &mut Lexer, regex: &Regex) -> ParserResult<()> {
    let len = matched_len(lexer, regex);
    let digits = &lexer.remainder()[1..len - 1];

    let limit = if digits.is_empty() {
        0
    } else {
        match digits.parse::<u32>() {
            Ok(limit) => limit,
            Err(_) => {
                let token = lexer.error_token(digits.to_string());
                return fail(ParserErrorCode::UnrecognisedToken, &token, "pipe limit is too large");
            }
        }
    };

    lexer.push_matched(TokenKind::Pipe, len, TokenPayload::PipeLimit(limit));
    Ok(())
}

fn if_empty_handler(lexer: &mut Lexer, _regex: &Regex) -> ParserResult<()> {
    // The postfix flag is settled once the following token is known.
    lexer.push_matched(TokenKind::IfEmpty, 2, TokenPayload::Presence { postfix: false });
    Ok(())
}

/// Marks each `??` as postfix when the next token is on a later line or cannot start
/// an expression. The parser reads this hint instead of scanning ahead itself.
fn resolve_presence_hints(tokens: &mut [Token]) {
    for index in 0..tokens.len() {
        if tokens[index].kind != TokenKind::IfEmpty {
            continue;
        }

        let postfix = match tokens.get(index + 1) {
            Some(next) => {
                next.span.start.line > tokens[index].span.end.line || !next.kind.starts_expression()
            }
            None => true,
        };

        trace!(pos = index, postfix, "presence hint");
        tokens[index].payload = TokenPayload::Presence { postfix };
    }
}

pub fn tokenize(source: String, file: Option<String>) -> ParserResult<Vec<Token>> {
    let mut lex = Lexer::new(source);

    while !lex.at_eof() {
        let mut matched = false;

        for pattern in PATTERNS.iter() {
            if pattern.regex.is_match(lex.remainder()) {
                (pattern.handler)(&mut lex, &pattern.regex)?;
                matched = true;
                break;
            }
        }

        if !matched {
            let ch = lex.at();
            let token = lex.error_token(ch.to_string());
            return fail(ParserErrorCode::UnrecognisedToken, &token, format!("unexpected character '{}'", ch));
        }
    }

    let end = lex.position();
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), Span { start: end, end }));
    resolve_presence_hints(&mut lex.tokens);

    debug!(file = file.as_deref().unwrap_or("shell"), tokens = lex.tokens.len(), "tokenized");
    Ok(lex.tokens)
}
