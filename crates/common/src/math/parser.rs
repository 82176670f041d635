//! Recursive-descent parser for algebraic expressions
//!
//! Accepted syntax:
//! - unsigned decimal numbers (`3`, `2.5`, `.5`)
//! - single-letter symbols; adjacent letters are separate symbols
//! - `+ - * / ^` and `**` (power), parentheses
//! - implicit multiplication: `2x`, `x(x+1)`, `(x+3)(x-2)`
//!
//! Precedence from loosest to tightest: sum, product, unary sign, power.
//! Power is right-associative and binds tighter than a leading minus,
//! so `-x^2` is `-(x^2)`.

use super::{Expr, MathError, MathResult, Rational};

/// Guard against pathological nesting such as `((((((...`
const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Rational),
    Symbol(char),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> MathResult<Vec<(Token, usize)>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = Rational::parse_decimal(&literal).map_err(|e| match e {
                    MathError::Parse { message, .. } => MathError::Parse { message, position: start },
                    other => other,
                })?;
                tokens.push((Token::Number(value), start));
                continue;
            }
            c if c.is_ascii_alphabetic() => tokens.push((Token::Symbol(c), start)),
            '+' => tokens.push((Token::Plus, start)),
            '-' => tokens.push((Token::Minus, start)),
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push((Token::Caret, start));
                i += 1;
            }
            '*' => tokens.push((Token::Star, start)),
            '/' => tokens.push((Token::Slash, start)),
            '^' => tokens.push((Token::Caret, start)),
            '(' => tokens.push((Token::LParen, start)),
            ')' => tokens.push((Token::RParen, start)),
            other => {
                return Err(MathError::Parse {
                    message: format!("unexpected character '{}'", other),
                    position: start,
                })
            }
        }
        i += 1;
    }

    Ok(tokens)
}

/// Parse a single expression; any trailing input is an error
pub fn parse(input: &str) -> MathResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(MathError::Parse {
            message: "empty expression".to_string(),
            position: 0,
        });
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        input_len: input.chars().count(),
    };
    let expr = parser.parse_sum()?;

    if let Some((token, position)) = parser.tokens.get(parser.pos) {
        return Err(MathError::Parse {
            message: format!("unexpected token {:?}", token),
            position: *position,
        });
    }

    Ok(expr)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, p)| *p)
            .unwrap_or(self.input_len)
    }

    fn previous_is_number(&self) -> bool {
        self.pos > 0 && matches!(self.tokens[self.pos - 1].0, Token::Number(_))
    }

    fn error(&self, message: impl Into<String>) -> MathError {
        MathError::Parse {
            message: message.into(),
            position: self.position(),
        }
    }

    fn enter(&mut self) -> MathResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn parse_sum(&mut self) -> MathResult<Expr> {
        self.enter()?;
        let mut lhs = self.parse_product()?;

        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    let rhs = self.parse_product()?;
                    lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    let rhs = self.parse_product()?;
                    lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }

        self.depth -= 1;
        Ok(lhs)
    }

    fn parse_product(&mut self) -> MathResult<Expr> {
        let mut lhs = self.parse_unary()?;

        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Mul(Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Div(Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Number(_)) if self.previous_is_number() => {
                    return Err(self.error("two numbers without an operator"));
                }
                Some(Token::Number(_)) | Some(Token::Symbol(_)) | Some(Token::LParen) => {
                    let rhs = self.parse_power()?;
                    lhs = Expr::Mul(Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> MathResult<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.enter()?;
                let inner = self.parse_unary()?;
                self.depth -= 1;
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.enter()?;
                let inner = self.parse_unary();
                self.depth -= 1;
                inner
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> MathResult<Expr> {
        let base = self.parse_primary()?;

        if let Some(Token::Caret) = self.peek() {
            self.pos += 1;
            self.enter()?;
            let exponent = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Pow(Box::new(base), Box::new(exponent)));
        }

        Ok(base)
    }

    fn parse_primary(&mut self) -> MathResult<Expr> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("unexpected end of expression"));
        };

        match token {
            Token::Number(value) => {
                self.pos += 1;
                Ok(Expr::Number(value))
            }
            Token::Symbol(c) => {
                self.pos += 1;
                Ok(Expr::Symbol(c))
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.parse_sum()?;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(self.error("missing closing parenthesis")),
                }
            }
            other => Err(self.error(format!("unexpected token {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &str) -> String {
        parse(input).unwrap().to_string()
    }

    #[test]
    fn test_basic_precedence() {
        assert_eq!(roundtrip("2*x + 3"), "2x + 3");
        assert_eq!(roundtrip("1 + 2*3"), "1 + 2*3");
        assert_eq!(roundtrip("(1 + 2)*3"), "(1 + 2)*3");
        assert_eq!(roundtrip("x**2 + 5*x + 6"), "x^2 + 5x + 6");
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(roundtrip("(x+3)(x-2)"), "(x + 3)(x - 2)");
        assert_eq!(roundtrip("x(x+1)"), "x(x + 1)");
        assert_eq!(roundtrip("2 x"), "2x");
    }

    #[test]
    fn test_power_binds_tighter_than_minus() {
        let expr = parse("-x^2").unwrap();
        assert!(matches!(expr, Expr::Neg(_)));
        let right_assoc = parse("2^3^2").unwrap();
        match right_assoc {
            Expr::Pow(_, exponent) => assert!(matches!(*exponent, Expr::Pow(..))),
            other => panic!("expected power, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
        assert!(parse("2 +").is_err());
        assert!(parse("(x + 1").is_err());
        assert!(parse("x = 3").is_err());
        assert!(parse("4 5").is_err());
        assert!(parse("x)").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}x{}", "(".repeat(500), ")".repeat(500));
        assert!(parse(&deep).is_err());
    }
}
