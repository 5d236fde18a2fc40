use super::Statement;

#[derive(Debug, Clone, Default)]
pub struct Compound {
    pub statements: Vec<Statement>,
}

impl Compound {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}
