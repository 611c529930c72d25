//! Formula tokenizer
//!
//! Converts formula strings like "amount * probability / 100" into a flat
//! sequence of tokens. Lexing is tolerant: characters outside the formula
//! vocabulary are skipped, so tokenizing never fails.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Built-in functions. Names are matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Sum,
    Avg,
    Min,
    Max,
    /// Number of arguments supplied (not a record count)
    Count,
    If,
    Abs,
    Round,
    Floor,
    Ceil,
}

impl Function {
    pub const ALL: [Function; 10] = [
        Function::Sum,
        Function::Avg,
        Function::Min,
        Function::Max,
        Function::Count,
        Function::If,
        Function::Abs,
        Function::Round,
        Function::Floor,
        Function::Ceil,
    ];

    /// Look up a function by name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        Self::ALL.into_iter().find(|f| f.name() == upper)
    }

    /// Canonical upper-case name
    pub fn name(self) -> &'static str {
        match self {
            Function::Sum => "SUM",
            Function::Avg => "AVG",
            Function::Min => "MIN",
            Function::Max => "MAX",
            Function::Count => "COUNT",
            Function::If => "IF",
            Function::Abs => "ABS",
            Function::Round => "ROUND",
            Function::Floor => "FLOOR",
            Function::Ceil => "CEIL",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operators and parentheses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    OpenParen,
    CloseParen,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::OpenParen => "(",
            Operator::CloseParen => ")",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Eq => "=",
            Operator::Ne => "<>",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A token in a formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal (e.g., 100, 0.25, .5)
    Number(f64),
    /// A field reference, original case preserved
    Identifier(String),
    /// An operator or parenthesis
    Operator(Operator),
    /// A built-in function name
    Function(Function),
    /// Function argument separator
    Comma,
}

impl Token {
    pub fn is_operator(&self, op: Operator) -> bool {
        matches!(self, Token::Operator(o) if *o == op)
    }
}

/// Tokenizer for formula expressions
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given formula string
    pub fn new(formula: &'a str) -> Self {
        // A leading '=' is a formula marker, not an equality test
        let formula = formula.trim_start();
        let formula = formula.strip_prefix('=').unwrap_or(formula);
        Self {
            chars: formula.chars().peekable(),
        }
    }

    /// Tokenize the entire formula into a vector of tokens
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token() {
            tokens.push(token);
        }

        tokens
    }

    /// Get the next token, or None if at end of input
    fn next_token(&mut self) -> Option<Token> {
        loop {
            self.skip_whitespace();

            let token = match self.peek()? {
                '+' => self.single(Operator::Add),
                '-' => self.single(Operator::Sub),
                '*' => self.single(Operator::Mul),
                '/' => self.single(Operator::Div),
                '%' => self.single(Operator::Rem),
                '(' => self.single(Operator::OpenParen),
                ')' => self.single(Operator::CloseParen),
                ',' => {
                    self.advance();
                    Token::Comma
                }

                // Comparison operators
                '<' => self.read_less_than_operator(),
                '>' => self.read_greater_than_operator(),
                '=' => self.read_equals_operator(),
                '!' => match self.read_bang_operator() {
                    Some(token) => token,
                    None => continue,
                },

                c if c.is_ascii_digit() => self.read_number(),
                '.' if self.digit_after_next() => self.read_number(),

                c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier(),

                // Outside the vocabulary: skip
                _ => {
                    self.advance();
                    continue;
                }
            };

            return Some(token);
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next()
    }

    /// Whether the character after the current one is a digit
    fn digit_after_next(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.peek().is_some_and(|c| c.is_ascii_digit())
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn single(&mut self, op: Operator) -> Token {
        self.advance();
        Token::Operator(op)
    }

    /// Read a maximal run of digits and decimal points.
    ///
    /// The value is the longest valid decimal prefix of the run, so "1.2.3"
    /// reads as 1.2 and "7." as 7.
    fn read_number(&mut self) -> Token {
        let mut run = String::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                run.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Token::Number(leading_decimal(&run))
    }

    /// Read an identifier; classify it as a function name or field reference
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match Function::from_name(&ident) {
            Some(function) => Token::Function(function),
            None => Token::Identifier(ident),
        }
    }

    /// Read operators starting with '<'
    fn read_less_than_operator(&mut self) -> Token {
        self.advance();

        match self.peek() {
            Some('=') => self.single(Operator::Le),
            Some('>') => self.single(Operator::Ne),
            _ => Token::Operator(Operator::Lt),
        }
    }

    /// Read operators starting with '>'
    fn read_greater_than_operator(&mut self) -> Token {
        self.advance();

        match self.peek() {
            Some('=') => self.single(Operator::Ge),
            _ => Token::Operator(Operator::Gt),
        }
    }

    /// '=' and '==' both mean equality
    fn read_equals_operator(&mut self) -> Token {
        self.advance();

        match self.peek() {
            Some('=') => self.single(Operator::Eq),
            _ => Token::Operator(Operator::Eq),
        }
    }

    /// '!=' is inequality; a lone '!' is skipped
    fn read_bang_operator(&mut self) -> Option<Token> {
        self.advance();

        match self.peek() {
            Some('=') => Some(self.single(Operator::Ne)),
            _ => None,
        }
    }
}

/// Value of the longest valid decimal prefix of a digit/point run
fn leading_decimal(run: &str) -> f64 {
    let end = run
        .char_indices()
        .filter(|(_, c)| *c == '.')
        .nth(1)
        .map_or(run.len(), |(i, _)| i);

    run[..end].parse::<f64>().unwrap_or(0.0)
}

/// Convenience function to tokenize a formula string
pub fn tokenize(formula: &str) -> Vec<Token> {
    Tokenizer::new(formula).tokenize()
}
