use crate::Span;

use super::{
    expressions::{
        BinaryExpr, CallExpr, ChooseExpr, FunctionExpr, IndexExpr, LiteralExpr, MemberExpr, PipeExpr,
        PresenceExpr, RangeExpr, ResultFilterExpr, TableExpr, TernaryExpr, UnaryExpr, UpdateExpr,
        VarArgExpr,
    },
    statements::{
        AssignmentStmt, BreakStmt, CheckStmt, ConditionalShorthandStmt, ContinueStmt, DeferStmt,
        DoStmt, ExpressionStmt, FunctionStmt, GenericForStmt, IfStmt, LocalFunctionStmt,
        NumericForStmt, RaiseStmt, RepeatStmt, ReturnStmt, TryExceptStmt, VarDeclStmt, WhileStmt,
    },
    types::Identifier,
};

/// Statement Types
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum StmtType {
    ExpressionStmt,
    AssignmentStmt,
    LocalDeclStmt,
    GlobalDeclStmt,
    LocalFunctionStmt,
    FunctionStmt,
    IfStmt,
    WhileStmt,
    RepeatStmt,
    NumericForStmt,
    GenericForStmt,
    ReturnStmt,
    BreakStmt,
    ContinueStmt,
    DeferStmt,
    DoStmt,
    ConditionalShorthandStmt,
    TryExceptStmt,
    RaiseStmt,
    CheckStmt,
}

/// Every statement form the parser produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(ExpressionStmt),
    Assignment(AssignmentStmt),
    LocalDecl(VarDeclStmt),
    GlobalDecl(VarDeclStmt),
    LocalFunction(LocalFunctionStmt),
    Function(FunctionStmt),
    If(IfStmt),
    While(WhileStmt),
    Repeat(RepeatStmt),
    NumericFor(NumericForStmt),
    GenericFor(GenericForStmt),
    Return(ReturnStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
    Defer(DeferStmt),
    Do(DoStmt),
    ConditionalShorthand(ConditionalShorthandStmt),
    TryExcept(TryExceptStmt),
    Raise(RaiseStmt),
    Check(CheckStmt),
}

impl Stmt {
    /// Returns the type of the statement.
    pub fn get_stmt_type(&self) -> StmtType {
        match self {
            Stmt::Expression(_) => StmtType::ExpressionStmt,
            Stmt::Assignment(_) => StmtType::AssignmentStmt,
            Stmt::LocalDecl(_) => StmtType::LocalDeclStmt,
            Stmt::GlobalDecl(_) => StmtType::GlobalDeclStmt,
            Stmt::LocalFunction(_) => StmtType::LocalFunctionStmt,
            Stmt::Function(_) => StmtType::FunctionStmt,
            Stmt::If(_) => StmtType::IfStmt,
            Stmt::While(_) => StmtType::WhileStmt,
            Stmt::Repeat(_) => StmtType::RepeatStmt,
            Stmt::NumericFor(_) => StmtType::NumericForStmt,
            Stmt::GenericFor(_) => StmtType::GenericForStmt,
            Stmt::Return(_) => StmtType::ReturnStmt,
            Stmt::Break(_) => StmtType::BreakStmt,
            Stmt::Continue(_) => StmtType::ContinueStmt,
            Stmt::Defer(_) => StmtType::DeferStmt,
            Stmt::Do(_) => StmtType::DoStmt,
            Stmt::ConditionalShorthand(_) => StmtType::ConditionalShorthandStmt,
            Stmt::TryExcept(_) => StmtType::TryExceptStmt,
            Stmt::Raise(_) => StmtType::RaiseStmt,
            Stmt::Check(_) => StmtType::CheckStmt,
        }
    }

    /// Returns the span of the statement.
    pub fn get_span(&self) -> &Span {
        match self {
            Stmt::Expression(stmt) => &stmt.span,
            Stmt::Assignment(stmt) => &stmt.span,
            Stmt::LocalDecl(stmt) | Stmt::GlobalDecl(stmt) => &stmt.span,
            Stmt::LocalFunction(stmt) => &stmt.span,
            Stmt::Function(stmt) => &stmt.span,
            Stmt::If(stmt) => &stmt.span,
            Stmt::While(stmt) => &stmt.span,
            Stmt::Repeat(stmt) => &stmt.span,
            Stmt::NumericFor(stmt) => &stmt.span,
            Stmt::GenericFor(stmt) => &stmt.span,
            Stmt::Return(stmt) => &stmt.span,
            Stmt::Break(stmt) => &stmt.span,
            Stmt::Continue(stmt) => &stmt.span,
            Stmt::Defer(stmt) => &stmt.span,
            Stmt::Do(stmt) => &stmt.span,
            Stmt::ConditionalShorthand(stmt) => &stmt.span,
            Stmt::TryExcept(stmt) => &stmt.span,
            Stmt::Raise(stmt) => &stmt.span,
            Stmt::Check(stmt) => &stmt.span,
        }
    }
}

/// Expression Types
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ExprType {
    Literal,
    Identifier,
    VarArg,
    Unary,
    Update,
    Binary,
    Ternary,
    Presence,
    Pipe,
    Call,
    SafeCall,
    Member,
    SafeMember,
    Index,
    SafeIndex,
    ResultFilter,
    Table,
    Function,
    Range,
    Choose,
}

/// Every expression form the parser produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralExpr),
    Identifier(Identifier),
    VarArg(VarArgExpr),
    Unary(UnaryExpr),
    Update(UpdateExpr),
    Binary(BinaryExpr),
    Ternary(TernaryExpr),
    Presence(PresenceExpr),
    Pipe(PipeExpr),
    Call(CallExpr),
    Member(MemberExpr),
    SafeMember(MemberExpr),
    Index(IndexExpr),
    SafeIndex(IndexExpr),
    ResultFilter(ResultFilterExpr),
    Table(TableExpr),
    Function(FunctionExpr),
    Range(RangeExpr),
    Choose(ChooseExpr),
}

impl Expr {
    /// Returns the expression type of the expression.
    pub fn get_expr_type(&self) -> ExprType {
        match self {
            Expr::Literal(_) => ExprType::Literal,
            Expr::Identifier(_) => ExprType::Identifier,
            Expr::VarArg(_) => ExprType::VarArg,
            Expr::Unary(_) => ExprType::Unary,
            Expr::Update(_) => ExprType::Update,
            Expr::Binary(_) => ExprType::Binary,
            Expr::Ternary(_) => ExprType::Ternary,
            Expr::Presence(_) => ExprType::Presence,
            Expr::Pipe(_) => ExprType::Pipe,
            Expr::Call(call) if call.is_safe() => ExprType::SafeCall,
            Expr::Call(_) => ExprType::Call,
            Expr::Member(_) => ExprType::Member,
            Expr::SafeMember(_) => ExprType::SafeMember,
            Expr::Index(_) => ExprType::Index,
            Expr::SafeIndex(_) => ExprType::SafeIndex,
            Expr::ResultFilter(_) => ExprType::ResultFilter,
            Expr::Table(_) => ExprType::Table,
            Expr::Function(_) => ExprType::Function,
            Expr::Range(_) => ExprType::Range,
            Expr::Choose(_) => ExprType::Choose,
        }
    }

    /// Returns the span of the expression.
    pub fn get_span(&self) -> &Span {
        match self {
            Expr::Literal(expr) => &expr.span,
            Expr::Identifier(expr) => &expr.span,
            Expr::VarArg(expr) => &expr.span,
            Expr::Unary(expr) => &expr.span,
            Expr::Update(expr) => &expr.span,
            Expr::Binary(expr) => &expr.span,
            Expr::Ternary(expr) => &expr.span,
            Expr::Presence(expr) => &expr.span,
            Expr::Pipe(expr) => &expr.span,
            Expr::Call(expr) => &expr.span,
            Expr::Member(expr) | Expr::SafeMember(expr) => &expr.span,
            Expr::Index(expr) | Expr::SafeIndex(expr) => &expr.span,
            Expr::ResultFilter(expr) => &expr.span,
            Expr::Table(expr) => &expr.span,
            Expr::Function(expr) => &expr.span,
            Expr::Range(expr) => &expr.span,
            Expr::Choose(expr) => &expr.span,
        }
    }

    /// Identifiers, members, indexes and calls can be called directly.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Expr::Identifier(_) | Expr::Member(_) | Expr::Index(_) | Expr::Call(_)
        )
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Expr::Identifier(identifier) => Some(identifier),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Literal(LiteralExpr { value: super::types::LiteralValue::Number(value), .. }) => {
                Some(*value)
            }
            _ => None,
        }
    }
}
