//! Restricted arithmetic evaluator for player-typed expressions.
//!
//! Accepts decimal numbers, unary and binary `+`/`-`, and parentheses.
//! Anything else is rejected with an [`ExprError`]; nothing is ever executed.
use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

use crate::constants::{EXPR_MAX_DEPTH, EXPR_MAX_LEN};

/// Reasons an expression could not be evaluated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error("expression is empty")]
    Empty,
    #[error("expression exceeds {max} characters")]
    TooLong { max: usize },
    #[error("unexpected character {found:?} at {position}")]
    InvalidCharacter { found: char, position: usize },
    #[error("malformed number at {position}")]
    MalformedNumber { position: usize },
    #[error("unexpected token at {position}")]
    UnexpectedToken { position: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expression nests deeper than {max} levels")]
    TooDeep { max: usize },
    #[error("expression does not evaluate to a finite number")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenKind {
    Number(f64),
    Plus,
    Minus,
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(position, ch)) = chars.peek() {
        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '(' => TokenKind::Open,
            ')' => TokenKind::Close,
            '0'..='9' | '.' => {
                tokens.push(Token {
                    kind: TokenKind::Number(lex_number(&mut chars, position)?),
                    position,
                });
                continue;
            }
            found => return Err(ExprError::InvalidCharacter { found, position }),
        };
        chars.next();
        tokens.push(Token { kind, position });
    }
    Ok(tokens)
}

fn lex_number(chars: &mut Peekable<CharIndices<'_>>, position: usize) -> Result<f64, ExprError> {
    let mut literal = String::new();
    let mut seen_dot = false;
    while let Some(&(_, ch)) = chars.peek() {
        match ch {
            '0'..='9' => literal.push(ch),
            '.' if !seen_dot => {
                seen_dot = true;
                literal.push(ch);
            }
            _ => break,
        }
        chars.next();
    }
    if literal == "." {
        return Err(ExprError::MalformedNumber { position });
    }
    literal
        .parse::<f64>()
        .map_err(|_| ExprError::MalformedNumber { position })
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.cursor).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn descend(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > EXPR_MAX_DEPTH {
            return Err(ExprError::TooDeep {
                max: EXPR_MAX_DEPTH,
            });
        }
        Ok(())
    }

    // expr := unary (('+' | '-') unary)*
    fn expression(&mut self) -> Result<f64, ExprError> {
        let mut value = self.unary()?;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Plus => {
                    self.bump();
                    value += self.unary()?;
                }
                TokenKind::Minus => {
                    self.bump();
                    value -= self.unary()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // unary := ('+' | '-') unary | primary
    fn unary(&mut self) -> Result<f64, ExprError> {
        self.descend()?;
        let value = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Plus) => {
                self.bump();
                self.unary()?
            }
            Some(TokenKind::Minus) => {
                self.bump();
                -self.unary()?
            }
            _ => self.primary()?,
        };
        self.depth -= 1;
        Ok(value)
    }

    // primary := number | '(' expr ')'
    fn primary(&mut self) -> Result<f64, ExprError> {
        let token = self.bump().ok_or(ExprError::UnexpectedEnd)?;
        match token.kind {
            TokenKind::Number(n) => Ok(n),
            TokenKind::Open => {
                let inner = self.expression()?;
                match self.bump() {
                    Some(Token {
                        kind: TokenKind::Close,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(ExprError::UnexpectedToken {
                        position: other.position,
                    }),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            _ => Err(ExprError::UnexpectedToken {
                position: token.position,
            }),
        }
    }
}

/// Evaluate a whitespace-free arithmetic expression.
///
/// # Errors
///
/// Returns an [`ExprError`] for empty or oversized input, any character
/// outside `0-9 + - ( ) .`, malformed numbers, unbalanced parentheses,
/// dangling operators, excessive nesting, or a non-finite result.
pub fn evaluate(input: &str) -> Result<f64, ExprError> {
    if input.is_empty() {
        return Err(ExprError::Empty);
    }
    if input.len() > EXPR_MAX_LEN {
        return Err(ExprError::TooLong { max: EXPR_MAX_LEN });
    }
    let mut parser = Parser {
        tokens: tokenize(input)?,
        cursor: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    if let Some(extra) = parser.peek() {
        return Err(ExprError::UnexpectedToken {
            position: extra.position,
        });
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExprError::NonFinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(s: &str) -> f64 {
        evaluate(s).unwrap_or_else(|err| panic!("{s:?} failed: {err}"))
    }

    #[test]
    fn evaluates_sign_forms() {
        assert!((eval("-(-5)") - 5.0).abs() < f64::EPSILON);
        assert!((eval("+(-5)") + 5.0).abs() < f64::EPSILON);
        assert!((eval("--5") - 5.0).abs() < f64::EPSILON);
        assert!((eval("-+3") + 3.0).abs() < f64::EPSILON);
        assert!((eval("+5") - 5.0).abs() < f64::EPSILON);
        assert!((eval("((7))") - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn evaluates_binary_chains_left_to_right() {
        assert!((eval("10-3-2") - 5.0).abs() < f64::EPSILON);
        assert!((eval("2+3") - 5.0).abs() < f64::EPSILON);
        assert!((eval("0-(-5)") - 5.0).abs() < f64::EPSILON);
        assert!((eval("5--3") - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn accepts_decimal_forms() {
        assert!((eval("5.0") - 5.0).abs() < f64::EPSILON);
        assert!((eval(".5") - 0.5).abs() < f64::EPSILON);
        assert!((eval("5.") - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_foreign_characters() {
        assert!(matches!(
            evaluate("abc"),
            Err(ExprError::InvalidCharacter { found: 'a', .. })
        ));
        assert!(matches!(
            evaluate("5*1"),
            Err(ExprError::InvalidCharacter { found: '*', .. })
        ));
        assert!(matches!(
            evaluate("alert(1)"),
            Err(ExprError::InvalidCharacter { .. })
        ));
        assert!(matches!(
            evaluate("5 "),
            Err(ExprError::InvalidCharacter { found: ' ', .. })
        ));
    }

    #[test]
    fn rejects_malformed_structure() {
        assert_eq!(evaluate(""), Err(ExprError::Empty));
        assert_eq!(evaluate("-"), Err(ExprError::UnexpectedEnd));
        assert_eq!(evaluate("(5"), Err(ExprError::UnexpectedEnd));
        assert!(matches!(
            evaluate("5)"),
            Err(ExprError::UnexpectedToken { position: 1 })
        ));
        assert!(matches!(
            evaluate("()"),
            Err(ExprError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            evaluate("."),
            Err(ExprError::MalformedNumber { .. })
        ));
        assert!(matches!(
            evaluate("1.2.3"),
            Err(ExprError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            evaluate("5(3)"),
            Err(ExprError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn bounds_nesting_and_length() {
        let deep = format!("{}5", "-".repeat(EXPR_MAX_DEPTH + 1));
        assert_eq!(
            evaluate(&deep),
            Err(ExprError::TooDeep {
                max: EXPR_MAX_DEPTH
            })
        );
        let long = "1+".repeat(EXPR_MAX_LEN);
        assert_eq!(
            evaluate(&long),
            Err(ExprError::TooLong { max: EXPR_MAX_LEN })
        );
    }

    #[test]
    fn length_bound_applies_before_parsing() {
        let huge = format!("{}0", "9".repeat(EXPR_MAX_LEN - 1));
        assert!(evaluate(&huge).is_ok());
        let overflow = format!("{huge}+{huge}");
        assert!(matches!(
            evaluate(&overflow),
            Err(ExprError::TooLong { .. })
        ));
    }
}
