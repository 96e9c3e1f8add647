use crate::Span;

use super::{
    ast::{Expr, Stmt},
    statements::BlockStmt,
    types::{Annotation, FluidType, FunctionParameter, FunctionReturnTypes, Identifier, LiteralValue},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Concat,
    NotEqual,
    Equal,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    LogicalAnd,
    LogicalOr,
    IfEmpty,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "^",
            BinaryOperator::Concat => "..",
            BinaryOperator::NotEqual => "~=",
            BinaryOperator::Equal => "==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "~",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::LogicalAnd => "and",
            BinaryOperator::LogicalOr => "or",
            BinaryOperator::IfEmpty => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Not,
    Length,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperator {
    Increment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    Plain,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
    IfEmpty,
    IfNil,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarArgExpr {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: UnaryOperator,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpr {
    pub operator: UpdateOperator,
    pub is_prefix: bool,
    pub target: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: BinaryOperator,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryExpr {
    pub condition: Box<Expr>,
    pub if_true: Box<Expr>,
    pub if_false: Box<Expr>,
    pub span: Span,
}

/// Postfix `value ??`.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceExpr {
    pub value: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipeExpr {
    pub lhs: Box<Expr>,
    pub rhs_call: Box<Expr>,
    /// `|N>` keeps at most N results; 0 means unlimited.
    pub limit: u32,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    Direct(Box<Expr>),
    Method { receiver: Box<Expr>, method: Identifier },
    SafeMethod { receiver: Box<Expr>, method: Identifier },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub target: CallTarget,
    pub arguments: Vec<Expr>,
    /// The last argument is a call or `...` and expands to all its values.
    pub forwards_multret: bool,
    pub span: Span,
}

impl CallExpr {
    pub fn is_safe(&self) -> bool {
        matches!(self.target, CallTarget::SafeMethod { .. })
    }

    pub fn method_name(&self) -> Option<&str> {
        match &self.target {
            CallTarget::Method { method, .. } | CallTarget::SafeMethod { method, .. } => {
                Some(method.symbol.as_str())
            }
            CallTarget::Direct(_) => None,
        }
    }
}

/// `table.name`, or `table?.name` when stored as `Expr::SafeMember`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub table: Box<Expr>,
    pub member: Identifier,
    pub span: Span,
}

/// `table[key]`, or `table?[key]` when stored as `Expr::SafeIndex`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub table: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultFilterExpr {
    pub expression: Box<Expr>,
    /// Bit N set means result N is kept.
    pub keep_mask: u64,
    pub explicit_count: u8,
    /// The pattern ended in `*`, so results past the pattern are kept too.
    pub trailing_keep: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFieldKind {
    Array,
    Record,
    Computed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableField {
    pub kind: TableFieldKind,
    pub name: Option<Identifier>,
    pub key: Option<Expr>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableExpr {
    pub fields: Vec<TableField>,
    pub has_array_part: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpr {
    pub parameters: Vec<FunctionParameter>,
    pub is_vararg: bool,
    pub is_thunk: bool,
    pub thunk_return_type: FluidType,
    pub return_types: FunctionReturnTypes,
    pub body: BlockStmt,
    pub annotations: Vec<Annotation>,
    pub span: Span,
}

/// `{a..b}` (exclusive) or `{a...b}` (inclusive).
#[derive(Debug, Clone, PartialEq)]
pub struct RangeExpr {
    pub start: Box<Expr>,
    pub stop: Box<Expr>,
    pub inclusive: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChooseScrutinee {
    Single(Box<Expr>),
    Tuple(Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChoosePattern {
    Else,
    Wildcard,
    Value(Expr),
    Relational { operator: RelationalOperator, value: Expr },
    Table(Expr),
    /// One entry per scrutinee position; `None` is a `_` wildcard.
    Tuple(Vec<Option<Expr>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChooseResult {
    Expr(Expr),
    Statement(Box<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChooseCase {
    pub pattern: ChoosePattern,
    pub guard: Option<Expr>,
    pub result: ChooseResult,
    pub span: Span,
}

impl ChooseCase {
    pub fn is_else(&self) -> bool {
        matches!(self.pattern, ChoosePattern::Else)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.pattern, ChoosePattern::Wildcard)
    }

    pub fn has_statement_result(&self) -> bool {
        matches!(self.result, ChooseResult::Statement(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChooseExpr {
    pub scrutinee: ChooseScrutinee,
    pub cases: Vec<ChooseCase>,
    /// Arity inferred from the first tuple pattern when the scrutinee is a single
    /// multi-value expression such as a call; 0 otherwise.
    pub inferred_tuple_arity: usize,
    pub span: Span,
}

impl ChooseExpr {
    pub fn tuple_arity(&self) -> usize {
        match &self.scrutinee {
            ChooseScrutinee::Tuple(values) => values.len(),
            ChooseScrutinee::Single(_) => self.inferred_tuple_arity,
        }
    }
}

/// Best-effort static type of an expression, used for thunk return types.
pub fn infer_expression_type(expr: &Expr) -> FluidType {
    match expr {
        Expr::Literal(literal) => literal.value.get_type(),
        Expr::Table(_) => FluidType::Table,
        Expr::Function(_) => FluidType::Func,
        Expr::Unary(unary) => match unary.operator {
            UnaryOperator::Not => FluidType::Bool,
            UnaryOperator::Negate | UnaryOperator::Length | UnaryOperator::BitNot => FluidType::Num,
        },
        Expr::Binary(binary) => match binary.operator {
            BinaryOperator::Add
            | BinaryOperator::Subtract
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Modulo
            | BinaryOperator::Power
            | BinaryOperator::BitAnd
            | BinaryOperator::BitOr
            | BinaryOperator::BitXor
            | BinaryOperator::ShiftLeft
            | BinaryOperator::ShiftRight => FluidType::Num,
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::LessThan
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterEqual => FluidType::Bool,
            BinaryOperator::Concat => FluidType::Str,
            // Either operand may be the result
            BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr | BinaryOperator::IfEmpty => {
                FluidType::Unknown
            }
        },
        Expr::Update(_) => FluidType::Num,
        Expr::Presence(_) => FluidType::Bool,
        Expr::Range(_) => FluidType::Object,
        Expr::Ternary(ternary) => {
            let if_true = infer_expression_type(&ternary.if_true);
            if if_true == infer_expression_type(&ternary.if_false) {
                if_true
            } else {
                FluidType::Unknown
            }
        }
        _ => FluidType::Unknown,
    }
}
