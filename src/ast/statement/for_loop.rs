use crate::ast::Expression;
use crate::lexer::Token;

use super::Statement;

/// Surface-only `for i a, b { body }`. Never survives desugaring — see
/// `crate::desugar::desugar_for`.
#[derive(Debug, Clone)]
pub struct For {
    pub counter: Token,
    pub from: Expression,
    pub to: Expression,
    pub body: Box<Statement>,
}
