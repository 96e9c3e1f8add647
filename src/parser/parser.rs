//! Parser context and entry points for building the Fluid syntax tree.
//!
//! This module contains the `Parser` struct, which owns the token stream and
//! the small amount of mode state needed for disambiguation, and the block
//! and chunk entry points. Expressions are parsed by precedence climbing in
//! `expr.rs`; statements by recursive descent in `stmt.rs`, dispatched through
//! the statement lookup built in `lookups.rs`.
//!
//! All grammar productions reach the token stream through `check`,
//! `match_token`, `consume` and `expect_identifier`, plus bounded `peek`.

use std::{collections::HashMap, rc::Rc};

use tracing::{debug, trace};

use crate::{
    ast::statements::BlockStmt,
    errors::errors::{fail, ParserErrorCode, ParserResult},
    lexer::tokens::{Token, TokenKind, TokenPayload},
    Position, Span, MK_TOKEN,
};

use super::{
    lookups::{create_token_lookups, StmtHandler, StmtLookup},
    stmt::parse_stmt,
};

/// Tunables for a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Upper bound on tokens examined by any disambiguation scan.
    pub lookahead_limit: usize,
    /// Explicit return types kept per function; extra entries collapse the last slot to `any`.
    pub max_return_types: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            lookahead_limit: 100,
            max_return_types: 8,
        }
    }
}

/// The main parser structure that maintains parsing state.
///
/// Holds the token stream, the cursor into it and the mode flags consulted
/// while parsing `choose` expressions.
pub struct Parser {
    /// The list of tokens to parse, always terminated by EOF
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// The name of the source file being parsed
    file: Rc<String>,
    config: ParserConfig,
    /// Lookup table for statement parsing handlers
    stmt_lookup: StmtLookup,
    /// End of the most recently consumed token; closes node spans
    previous_end: Position,
    /// Parsing `choose` cases: relational operators and `(` may start the next case
    in_choose_expression: bool,
    /// Parsing a `when` guard: relational operators are always binary
    in_guard_expression: bool,
}

impl Parser {
    /// Creates a new Parser instance.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Vector of tokens to parse
    /// * `file` - Reference-counted string containing the source file name
    /// * `config` - Lookahead and return-type limits
    pub fn new(mut tokens: Vec<Token>, file: Rc<String>, config: ParserConfig) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::EOF) {
            let end = tokens.last().map(|token| token.span.end).unwrap_or_else(Position::null);
            tokens.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), Span { start: end, end }));
        }

        let previous_end = tokens[0].span.start;

        Parser {
            tokens,
            pos: 0,
            file,
            config,
            stmt_lookup: HashMap::new(),
            previous_end,
            in_choose_expression: false,
            in_guard_expression: false,
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        self.peek(0)
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Looks `n` tokens ahead; past the end this is the EOF token.
    pub fn peek(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    pub fn peek_kind(&self, n: usize) -> TokenKind {
        self.peek(n).kind
    }

    /// Consumes the current token and returns it. EOF is never consumed.
    pub fn advance(&mut self) -> Token {
        let token = self.current_token().clone();

        trace!(
            pos = self.pos,
            kind = %token.kind,
            line = token.span.start.line,
            "advance"
        );

        if token.kind != TokenKind::EOF {
            self.pos += 1;
            self.previous_end = token.span.end;
        }

        token
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.current_token_kind() == kind
    }

    pub fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current_token_kind())
    }

    /// Consumes the current token if it is `kind`.
    pub fn match_token(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Requires a token of `kind`, reporting `code` when it is missing.
    pub fn consume(&mut self, kind: TokenKind, code: ParserErrorCode) -> ParserResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }

        let token = self.current_token();
        fail(
            code,
            token,
            format!("Expected '{}', got '{}'", kind.text(), token.describe()),
        )
    }

    pub fn expect_identifier(&mut self, code: ParserErrorCode) -> ParserResult<Token> {
        if self.check(TokenKind::Identifier) {
            return Ok(self.advance());
        }

        let token = self.current_token();
        fail(
            code,
            token,
            format!("Expected identifier, got '{}'", token.describe()),
        )
    }

    /// Start of the current token.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start
    }

    /// Span from `start` to the end of the last consumed token. When nothing has
    /// been consumed since `start` (an empty block) the span is the current token's.
    pub fn span_from(&self, start: Position) -> Span {
        if self.previous_end.offset <= start.offset {
            return Span {
                start,
                end: self.current_token().span.end,
            };
        }

        Span { start, end: self.previous_end }
    }

    pub fn get_pos(&self) -> usize {
        self.pos
    }

    pub fn get_file(&self) -> &Rc<String> {
        &self.file
    }

    pub fn get_config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn in_choose_expression(&self) -> bool {
        self.in_choose_expression
    }

    pub fn in_guard_expression(&self) -> bool {
        self.in_guard_expression
    }

    /// Runs `parse` with the given mode flags, restoring the caller's flags afterwards
    /// whether or not `parse` succeeded.
    pub fn with_choose_context<T>(
        &mut self,
        in_choose: bool,
        in_guard: bool,
        parse: impl FnOnce(&mut Parser) -> ParserResult<T>,
    ) -> ParserResult<T> {
        let saved = (self.in_choose_expression, self.in_guard_expression);

        trace!(in_choose, in_guard, "enter choose context");
        self.in_choose_expression = in_choose;
        self.in_guard_expression = in_guard;

        let result = parse(self);

        self.in_choose_expression = saved.0;
        self.in_guard_expression = saved.1;
        trace!(in_choose = saved.0, in_guard = saved.1, "restore choose context");

        result
    }

    /// Registers a statement handler for a leading token kind.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }
}

/// Parses statements until one of `terminators` (or EOF) is the current token.
/// The terminator itself is left for the caller.
pub fn parse_block(parser: &mut Parser, terminators: &[TokenKind]) -> ParserResult<BlockStmt> {
    let start = parser.get_position();
    let mut body = vec![];

    while !parser.check(TokenKind::EOF) && !parser.check_any(terminators) {
        if let Some(stmt) = parse_stmt(parser)? {
            body.push(stmt);
        }
    }

    Ok(BlockStmt {
        body,
        span: parser.span_from(start),
    })
}

/// Parses a whole translation unit.
pub fn parse_chunk(parser: &mut Parser) -> ParserResult<BlockStmt> {
    let block = parse_block(parser, &[])?;

    if !parser.check(TokenKind::EOF) {
        let token = parser.current_token();
        return fail(
            ParserErrorCode::UnexpectedToken,
            token,
            format!("Expected '<eof>', got '{}'", token.describe()),
        );
    }

    Ok(block)
}

/// Parses a list of tokens into an AST with the default configuration.
///
/// # Arguments
///
/// * `tokens` - Vector of tokens to parse
/// * `file` - Reference-counted string containing the source file name
///
/// # Returns
///
/// A tuple containing the Parser instance and the parse result.
pub fn parse(tokens: Vec<Token>, file: Rc<String>) -> (Parser, ParserResult<BlockStmt>) {
    parse_with_config(tokens, file, ParserConfig::default())
}

pub fn parse_with_config(
    tokens: Vec<Token>,
    file: Rc<String>,
    config: ParserConfig,
) -> (Parser, ParserResult<BlockStmt>) {
    let mut parser = Parser::new(tokens, file, config);
    create_token_lookups(&mut parser);

    let result = parse_chunk(&mut parser);

    debug!(
        file = %parser.get_file(),
        ok = result.is_ok(),
        tokens = parser.get_pos(),
        "parsed chunk"
    );

    (parser, result)
}
