//! Static formula validation
//!
//! Purely syntactic: the formula must produce at least one token and its
//! parentheses must balance. Field names and function arity are not checked.

use serde::{Deserialize, Serialize};

use super::formula::tokenizer::{tokenize, Operator, Token};

pub const EMPTY_FORMULA: &str = "Formula is empty";
pub const UNBALANCED_PARENTHESES: &str = "Unbalanced parentheses";

/// Outcome of validating a formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(reason.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Check a formula before it is saved
pub fn validate_formula(formula: &str) -> Validation {
    let tokens = tokenize(formula);
    if tokens.is_empty() {
        return Validation::invalid(EMPTY_FORMULA);
    }

    if !parentheses_balanced(&tokens) {
        return Validation::invalid(UNBALANCED_PARENTHESES);
    }

    Validation::ok()
}

fn parentheses_balanced(tokens: &[Token]) -> bool {
    let mut open: usize = 0;
    for token in tokens {
        match token {
            Token::Operator(Operator::OpenParen) => open += 1,
            Token::Operator(Operator::CloseParen) => match open.checked_sub(1) {
                Some(n) => open = n,
                None => return false,
            },
            _ => {}
        }
    }
    open == 0
}
