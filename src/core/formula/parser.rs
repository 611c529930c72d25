//! Formula parser
//!
//! Converts a sequence of tokens into an expression tree using recursive
//! descent with operator precedence:
//!
//! ```text
//! Expression   := Sum (('>' | '<' | '>=' | '<=' | '=' | '<>') Sum)*
//! Sum          := Term (('+' | '-') Term)*
//! Term         := Factor (('*' | '/' | '%') Factor)*
//! Factor       := Number | Identifier | FunctionCall | '(' Expression ')'
//! FunctionCall := FunctionName '(' [Expression (',' Expression)*] ')'
//! ```
//!
//! The parser is tolerant. A missing `)` is accepted, an unexpected token in
//! factor position becomes the literal `0` (consuming that token), and
//! trailing tokens after the first complete expression are ignored. The only
//! hard failures are nesting beyond [`MAX_DEPTH`] and trees larger than
//! [`MAX_NODES`].

use super::tokenizer::{Function, Operator, Token};
use crate::error::{FormulaError, FormulaResult};

/// Maximum nesting of parentheses and function calls
pub const MAX_DEPTH: usize = 64;

/// Maximum number of nodes in one expression tree. Operator chains nest one
/// level per operator, so this also bounds evaluation depth.
pub const MAX_NODES: usize = 1024;

/// Binary operators that survive into the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl BinaryOp {
    fn comparison(op: Operator) -> Option<Self> {
        match op {
            Operator::Gt => Some(BinaryOp::Gt),
            Operator::Lt => Some(BinaryOp::Lt),
            Operator::Ge => Some(BinaryOp::Ge),
            Operator::Le => Some(BinaryOp::Le),
            Operator::Eq => Some(BinaryOp::Eq),
            Operator::Ne => Some(BinaryOp::Ne),
            _ => None,
        }
    }

    fn additive(op: Operator) -> Option<Self> {
        match op {
            Operator::Add => Some(BinaryOp::Add),
            Operator::Sub => Some(BinaryOp::Sub),
            _ => None,
        }
    }

    fn multiplicative(op: Operator) -> Option<Self> {
        match op {
            Operator::Mul => Some(BinaryOp::Mul),
            Operator::Div => Some(BinaryOp::Div),
            Operator::Rem => Some(BinaryOp::Rem),
            _ => None,
        }
    }
}

/// Expression tree for a formula
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal
    Literal(f64),
    /// A field reference, resolved against a record at evaluation time
    Field(String),
    /// Function call: NAME(arg1, arg2, ...)
    Call { function: Function, args: Vec<Expr> },
    /// Binary operation: left op right
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Field names referenced anywhere in the tree, in order of appearance
    pub fn field_references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_fields(&mut refs);
        refs
    }

    fn collect_fields<'e>(&'e self, refs: &mut Vec<&'e str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Field(name) => refs.push(name),
            Expr::Call { args, .. } => args.iter().for_each(|a| a.collect_fields(refs)),
            Expr::Binary { left, right, .. } => {
                left.collect_fields(refs);
                right.collect_fields(refs);
            }
        }
    }
}

/// Parser for formula tokens
pub struct Parser<'t> {
    tokens: &'t [Token],
    position: usize,
    depth: usize,
    nodes: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
            nodes: 0,
        }
    }

    /// Parse the leading expression. Empty input parses as `0`.
    pub fn parse(mut self) -> FormulaResult<Expr> {
        self.expression()
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.position)
    }

    /// Consume the current token. At end of input this is a no-op.
    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn match_operator(&mut self, op: Operator) -> bool {
        if self.peek().is_some_and(|t| t.is_operator(op)) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if `classify` maps its operator
    fn match_binary(&mut self, classify: fn(Operator) -> Option<BinaryOp>) -> Option<BinaryOp> {
        let op = match self.peek() {
            Some(Token::Operator(op)) => classify(*op)?,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn descend(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    /// Account for one more node in the tree
    fn node(&mut self, expr: Expr) -> FormulaResult<Expr> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(FormulaError::TooLong(MAX_NODES));
        }
        Ok(expr)
    }

    /// Expression: sum (comparison sum)*
    fn expression(&mut self) -> FormulaResult<Expr> {
        let mut left = self.sum()?;

        while let Some(op) = self.match_binary(BinaryOp::comparison) {
            let right = self.sum()?;
            left = self.node(Expr::binary(op, left, right))?;
        }

        Ok(left)
    }

    /// Sum: term (( "+" | "-" ) term)*
    fn sum(&mut self) -> FormulaResult<Expr> {
        let mut left = self.term()?;

        while let Some(op) = self.match_binary(BinaryOp::additive) {
            let right = self.term()?;
            left = self.node(Expr::binary(op, left, right))?;
        }

        Ok(left)
    }

    /// Term: factor (( "*" | "/" | "%" ) factor)*
    fn term(&mut self) -> FormulaResult<Expr> {
        let mut left = self.factor()?;

        while let Some(op) = self.match_binary(BinaryOp::multiplicative) {
            let right = self.factor()?;
            left = self.node(Expr::binary(op, left, right))?;
        }

        Ok(left)
    }

    /// Factor: NUMBER | IDENTIFIER | call | "(" expression ")"
    fn factor(&mut self) -> FormulaResult<Expr> {
        match self.advance() {
            Some(Token::Number(n)) => self.node(Expr::Literal(*n)),
            Some(Token::Identifier(name)) => self.node(Expr::Field(name.clone())),
            Some(Token::Function(function)) => self.call(*function),
            Some(Token::Operator(Operator::OpenParen)) => {
                self.descend()?;
                let expr = self.expression()?;
                // Missing ')' is tolerated
                self.match_operator(Operator::CloseParen);
                self.ascend();
                Ok(expr)
            }
            // Unexpected token or end of input
            _ => self.node(Expr::Literal(0.0)),
        }
    }

    /// Call: "(" (expression ","?)* ")"? after the function name
    fn call(&mut self, function: Function) -> FormulaResult<Expr> {
        if !self.match_operator(Operator::OpenParen) {
            return self.node(Expr::Literal(0.0));
        }
        self.descend()?;

        let mut args = Vec::new();
        while let Some(token) = self.peek() {
            if token.is_operator(Operator::CloseParen) {
                self.advance();
                break;
            }
            args.push(self.expression()?);
            if matches!(self.peek(), Some(Token::Comma)) {
                self.advance();
            }
        }

        self.ascend();
        self.node(Expr::Call { function, args })
    }
}

/// Convenience function to parse tokens into an expression tree
pub fn parse(tokens: &[Token]) -> FormulaResult<Expr> {
    Parser::new(tokens).parse()
}
