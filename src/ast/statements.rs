use std::slice::Iter;

use crate::Span;

use super::{
    ast::{Expr, Stmt},
    expressions::{AssignmentOperator, FunctionExpr},
    types::Identifier,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl BlockStmt {
    pub fn iter(&self) -> Iter<'_, Stmt> {
        self.body.iter()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStmt {
    pub expression: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentStmt {
    pub operator: AssignmentOperator,
    pub targets: Vec<Expr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

/// Shared by `local` and `global` declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclStmt {
    pub operator: AssignmentOperator,
    pub names: Vec<Identifier>,
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalFunctionStmt {
    pub name: Identifier,
    pub function: FunctionExpr,
    pub span: Span,
}

/// `a.b.c:d` in `function a.b.c:d()`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNamePath {
    pub segments: Vec<Identifier>,
    pub method: Option<Identifier>,
    pub is_explicit_global: bool,
}

impl FunctionNamePath {
    pub fn dotted(&self) -> String {
        let mut name = self
            .segments
            .iter()
            .map(|segment| segment.symbol.as_str())
            .collect::<Vec<_>>()
            .join(".");

        if let Some(method) = &self.method {
            name.push(':');
            name.push_str(&method.symbol);
        }

        name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionStmt {
    pub name: FunctionNamePath,
    pub function: FunctionExpr,
    pub span: Span,
}

/// One `if`/`elseif`/`else` arm; `else` has no condition.
#[derive(Debug, Clone, PartialEq)]
pub struct IfClause {
    pub condition: Option<Expr>,
    pub block: BlockStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub clauses: Vec<IfClause>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepeatStmt {
    pub body: BlockStmt,
    pub condition: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericForStmt {
    pub control: Identifier,
    pub start: Expr,
    pub stop: Expr,
    pub step: Option<Expr>,
    pub body: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericForStmt {
    pub names: Vec<Identifier>,
    pub iterators: Vec<Expr>,
    pub body: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub values: Vec<Expr>,
    /// A single call is returned, so all of its results are forwarded.
    pub forwards_call: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakStmt {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContinueStmt {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeferStmt {
    pub function: FunctionExpr,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoStmt {
    pub block: BlockStmt,
    pub span: Span,
}

/// `value ?? return ...`: run `body` when `condition` is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalShorthandStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptClause {
    pub exception_var: Option<Identifier>,
    /// Empty for a catch-all clause.
    pub filter_codes: Vec<Expr>,
    pub block: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryExceptStmt {
    pub try_block: BlockStmt,
    pub except_clauses: Vec<ExceptClause>,
    pub success_block: Option<BlockStmt>,
    pub enable_trace: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RaiseStmt {
    pub error_code: Expr,
    pub message: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckStmt {
    pub error_code: Expr,
    pub span: Span,
}
