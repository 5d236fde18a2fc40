//! Expression AST nodes, built directly by the parser's precedence
//! climber (see `crate::parser`) and rewritten in place by the desugarer.
mod binary;
mod call;
mod unary;

pub use binary::Binary;
pub use call::Call;
pub use unary::Unary;

use crate::lexer::Token;
use crate::position::Position;

#[derive(Debug, Clone)]
pub enum Expression {
    IntLit(Token),
    BoolLit(Token),
    StringLit(Token),
    Var(Token),
    Unary(Unary),
    Binary(Binary),
    Call(Call),
}

impl Expression {
    pub fn position(&self) -> Position {
        match self {
            Expression::IntLit(token)
            | Expression::BoolLit(token)
            | Expression::StringLit(token)
            | Expression::Var(token) => token.position,
            Expression::Unary(unary) => unary.op.position,
            Expression::Binary(binary) => binary.op.position,
            Expression::Call(call) => call.position,
        }
    }

    /// `true` for expressions the desugarer and assignment rules accept as
    /// an assignment target (a bare variable reference).
    pub fn is_var(&self) -> bool {
        matches!(self, Expression::Var(_))
    }
}
