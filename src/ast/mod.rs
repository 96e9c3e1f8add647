/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the Fluid syntax tree
///
/// Submodules:
/// - ast: The `Expr` and `Stmt` sum types with their kind tags and spans
/// - expressions: Payloads for the expression variants and operator enums
/// - statements: Payloads for the statement variants
/// - types: Type annotations, identifiers, literals and function metadata
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
