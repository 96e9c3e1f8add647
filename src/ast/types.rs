use std::fmt::Display;

use crate::Span;

/// Types that can appear in syntactic annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FluidType {
    Any,
    Nil,
    Bool,
    Num,
    Str,
    Table,
    Array,
    Func,
    Thread,
    CData,
    Object,
    Unknown,
}

impl FluidType {
    /// Maps a type name (including its long-form aliases) to a `FluidType`.
    /// Unrecognised names give `FluidType::Unknown`.
    pub fn parse_type_name(name: &str) -> FluidType {
        match name {
            "any" => FluidType::Any,
            "nil" => FluidType::Nil,
            "bool" | "boolean" => FluidType::Bool,
            "num" | "number" => FluidType::Num,
            "str" | "string" => FluidType::Str,
            "table" => FluidType::Table,
            "array" => FluidType::Array,
            "func" | "function" => FluidType::Func,
            "thread" => FluidType::Thread,
            "cdata" => FluidType::CData,
            "obj" | "object" => FluidType::Object,
            _ => FluidType::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        *self != FluidType::Unknown
    }
}

impl Display for FluidType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FluidType::Any => "any",
            FluidType::Nil => "nil",
            FluidType::Bool => "bool",
            FluidType::Num => "num",
            FluidType::Str => "str",
            FluidType::Table => "table",
            FluidType::Array => "array",
            FluidType::Func => "func",
            FluidType::Thread => "thread",
            FluidType::CData => "cdata",
            FluidType::Object => "obj",
            FluidType::Unknown => "unknown",
        };

        write!(f, "{}", name)
    }
}

/// A name as written in source.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub symbol: String,
    pub span: Span,
    pub type_annotation: Option<FluidType>,
    /// The discard placeholder `_`.
    pub is_blank: bool,
    /// Declared with `<close>`.
    pub has_close: bool,
    /// Declared with `<const>`.
    pub has_const: bool,
}

impl Identifier {
    pub fn new(symbol: impl Into<String>, span: Span) -> Self {
        let symbol = symbol.into();

        Identifier {
            is_blank: symbol == "_",
            symbol,
            span,
            type_annotation: None,
            has_close: false,
            has_const: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
}

impl LiteralValue {
    pub fn get_type(&self) -> FluidType {
        match self {
            LiteralValue::Nil => FluidType::Nil,
            LiteralValue::Bool(_) => FluidType::Bool,
            LiteralValue::Number(_) => FluidType::Num,
            LiteralValue::String(_) => FluidType::Str,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter {
    pub name: Identifier,
    pub type_: FluidType,
    /// The implicit `self` injected by `function a:b()`.
    pub is_self: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionReturnTypes {
    pub types: Vec<FluidType>,
    pub is_variadic: bool,
    pub is_explicit: bool,
}

impl FunctionReturnTypes {
    pub fn implicit() -> Self {
        FunctionReturnTypes {
            types: vec![],
            is_variadic: false,
            is_explicit: false,
        }
    }

    pub fn first(&self) -> Option<FluidType> {
        self.types.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<AnnotationValue>),
}

/// `@Name(key = value, flag)`; passed through to the compiler unevaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    pub span: Span,
    pub args: Vec<(String, AnnotationValue)>,
}

impl Annotation {
    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.args.iter().find(|(name, _)| name == key).map(|(_, value)| value)
    }
}
