//! AST for the language: `Expression` and `Statement`, the two disjoint
//! sum types produced by the parser and rewritten, node for node, by the
//! desugarer.
pub mod expression;
pub mod statement;

pub use expression::Expression;
pub use statement::Statement;
