//! Expression tree produced by the parser

use super::Rational;
use std::collections::BTreeSet;
use std::fmt;

/// Algebraic expression over single-letter symbols
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Rational),
    Symbol(char),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn integer(value: i64) -> Self {
        Expr::Number(Rational::from(value))
    }

    /// Every distinct symbol in the expression
    pub fn symbols(&self) -> BTreeSet<char> {
        let mut found = BTreeSet::new();
        self.collect_symbols(&mut found);
        found
    }

    fn collect_symbols(&self, found: &mut BTreeSet<char>) {
        match self {
            Expr::Number(_) => {}
            Expr::Symbol(c) => {
                found.insert(*c);
            }
            Expr::Neg(inner) => inner.collect_symbols(found),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => {
                a.collect_symbols(found);
                b.collect_symbols(found);
            }
        }
    }

    /// Binding strength used to decide where parentheses are needed
    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => 1,
            Expr::Mul(..) | Expr::Div(..) => 2,
            Expr::Number(n) if !n.is_integer() || n.is_negative() => 2,
            Expr::Neg(_) => 3,
            Expr::Pow(..) => 4,
            Expr::Number(_) | Expr::Symbol(_) => 5,
        }
    }

    fn is_symbolic_atom(&self) -> bool {
        match self {
            Expr::Symbol(_) => true,
            Expr::Pow(base, _) => matches!(**base, Expr::Symbol(_)),
            _ => false,
        }
    }

    fn is_plain_integer(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_integer() && !n.is_negative())
    }
}

fn write_child(f: &mut fmt::Formatter<'_>, child: &Expr, min_precedence: u8) -> fmt::Result {
    if child.precedence() < min_precedence {
        write!(f, "({})", child)
    } else {
        write!(f, "{}", child)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Symbol(c) => write!(f, "{}", c),
            Expr::Neg(inner) => {
                write!(f, "-")?;
                write_child(f, inner, 3)
            }
            Expr::Add(a, b) => {
                write_child(f, a, 1)?;
                write!(f, " + ")?;
                write_child(f, b, 1)
            }
            Expr::Sub(a, b) => {
                write_child(f, a, 1)?;
                write!(f, " - ")?;
                write_child(f, b, 2)
            }
            Expr::Mul(a, b) => {
                let left_wrapped = a.precedence() < 2;
                let right_wrapped = b.precedence() < 3;
                // 2x, 3x^2, 2(x + 1), x(x + 1), (x + 3)(x - 2)
                let juxtapose = (a.is_plain_integer() && b.is_symbolic_atom())
                    || (right_wrapped
                        && (a.is_plain_integer() || left_wrapped || matches!(**a, Expr::Symbol(_))));

                write_child(f, a, 2)?;
                if !juxtapose {
                    write!(f, "*")?;
                }
                write_child(f, b, 3)
            }
            Expr::Div(a, b) => {
                write_child(f, a, 2)?;
                write!(f, "/")?;
                write_child(f, b, 3)
            }
            Expr::Pow(a, b) => {
                write_child(f, a, 5)?;
                write!(f, "^")?;
                write_child(f, b, 5)
            }
        }
    }
}
