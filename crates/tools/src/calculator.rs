//! `Calculate[expression]` — arithmetic for the tool loop.
//!
//! Supports `+`, `-`, `*`, `/`, `%`, `^` (right-associative), parentheses,
//! and unary negation via a recursive-descent parser.

use async_trait::async_trait;
use hoploop_core::error::ToolError;
use hoploop_core::tool::{Tool, ToolOutput};
use thiserror::Error;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "Calculate"
    }

    fn input_variable(&self) -> &str {
        "expression"
    }

    fn description(&self) -> &str {
        "evaluates an arithmetic expression such as (2 + 3) * 4 and returns the number"
    }

    async fn invoke(&self, input: &str) -> Result<ToolOutput, ToolError> {
        let value = evaluate(input).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        Ok(ToolOutput::text(format_number(value)))
    }
}

/// Integers print without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unexpected token {0:?}")]
    UnexpectedToken(Token),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expected closing parenthesis")]
    UnclosedParen,
    #[error("division by zero")]
    DivisionByZero,
}

// ── Recursive-descent expression evaluator ────────────────────────────────

/// Evaluate an arithmetic expression string.
pub fn evaluate(expr: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let result = parser.parse_expr()?;
    match parser.peek() {
        Some(tok) => Err(CalcError::UnexpectedToken(tok.clone())),
        None => Ok(result),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => {
                chars.next();
                // `**` is accepted as a synonym for `^`
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
                continue;
            }
            '/' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else if d == ',' || d == '_' {
                        // digit group separator
                        chars.next();
                    } else {
                        break;
                    }
                }
                let num = literal
                    .parse()
                    .map_err(|_| CalcError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(num));
                continue;
            }
            c => return Err(CalcError::UnexpectedChar(c)),
        };
        chars.next();
        tokens.push(token);
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<f64, CalcError> {
        let mut left = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.consume();
                    left += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.consume();
                    left -= self.parse_term()?;
                }
                _ => return Ok(left),
            }
        }
    }

    // term = unary (('*' | '/' | '%') unary)*
    fn parse_term(&mut self) -> Result<f64, CalcError> {
        let mut left = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.consume();
                    left *= self.parse_unary()?;
                }
                Some(Token::Slash) | Some(Token::Percent) => {
                    let is_div = matches!(self.consume(), Some(Token::Slash));
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    if is_div {
                        left /= right;
                    } else {
                        left %= right;
                    }
                }
                _ => return Ok(left),
            }
        }
    }

    // unary = '-' unary | power
    fn parse_unary(&mut self) -> Result<f64, CalcError> {
        if let Some(Token::Minus) = self.peek() {
            self.consume();
            return Ok(-self.parse_unary()?);
        }
        self.parse_power()
    }

    // power = primary ('^' unary)?
    fn parse_power(&mut self) -> Result<f64, CalcError> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            let exponent = self.parse_unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // primary = NUMBER | '(' expr ')'
    fn parse_primary(&mut self) -> Result<f64, CalcError> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::LParen) => {
                let val = self.parse_expr()?;
                match self.consume() {
                    Some(Token::RParen) => Ok(val),
                    _ => Err(CalcError::UnclosedParen),
                }
            }
            Some(tok) => Err(CalcError::UnexpectedToken(tok.clone())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}
