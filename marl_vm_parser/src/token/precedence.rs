//! Operator precedence and associativity definitions

use super::Token;

/// Operator precedence levels, lowest binding first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i8)]
pub enum Precedence {
    /// Entry level for a full expression
    Lowest = 0,
    /// Assignment: =
    Assign = 1,
    /// Conditional: ? :
    Conditional = 2,
    /// Pipe: x | f
    Pipe = 3,
    /// Lazy or: ||
    LazyOr = 4,
    /// Lazy and: &&
    LazyAnd = 5,
    /// Equality: ==, ~=, !=
    Equality = 6,
    /// Relational: <, >, <=, >=
    Relational = 7,
    /// Range: a:b, a:step:b
    Range = 8,
    /// Additive: +, -
    Additive = 9,
    /// Multiplicative: *, /, \, %
    Multiplicative = 10,
    /// Prefix (unary)
    Prefix = 11,
    /// Power: ^
    Power = 12,
    /// Postfix: call, member access, transpose, increments
    Postfix = 13,
}

impl TryFrom<i8> for Precedence {
    type Error = ();

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Precedence::Lowest),
            1 => Ok(Precedence::Assign),
            2 => Ok(Precedence::Conditional),
            3 => Ok(Precedence::Pipe),
            4 => Ok(Precedence::LazyOr),
            5 => Ok(Precedence::LazyAnd),
            6 => Ok(Precedence::Equality),
            7 => Ok(Precedence::Relational),
            8 => Ok(Precedence::Range),
            9 => Ok(Precedence::Additive),
            10 => Ok(Precedence::Multiplicative),
            11 => Ok(Precedence::Prefix),
            12 => Ok(Precedence::Power),
            13 => Ok(Precedence::Postfix),
            _ => Err(()),
        }
    }
}

impl Precedence {
    /// The next tighter level (saturating at `Postfix`)
    pub fn tighter(self) -> Precedence {
        Precedence::try_from(self as i8 + 1).unwrap_or(self)
    }
}

/// Operator associativity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

impl Token {
    /// Get the precedence and associativity of a binary operator
    pub fn binary_precedence(&self) -> Option<(Precedence, Associativity)> {
        use Associativity::{Left, Right};
        use Precedence::*;

        Some(match self {
            Token::Eq => (Assign, Right),
            Token::Question => (Conditional, Right),
            Token::Pipe => (Pipe, Left),
            Token::OrOr => (LazyOr, Left),
            Token::AndAnd => (LazyAnd, Left),
            Token::EqEq | Token::TildeEq | Token::BangEq => (Equality, Left),
            Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => (Relational, Left),
            Token::Colon => (Range, Left),
            Token::Plus | Token::Minus => (Additive, Left),
            Token::Star | Token::Slash | Token::Backslash | Token::Percent => {
                (Multiplicative, Left)
            }
            Token::Caret => (Power, Right),
            _ => return None,
        })
    }

    /// Check if this token can start a prefix (unary) expression
    pub fn is_prefix_operator(&self) -> bool {
        matches!(
            self,
            Token::Minus
                | Token::Plus
                | Token::Tilde
                | Token::Bang
                | Token::PlusPlus
                | Token::MinusMinus
        )
    }

    /// Check if this token continues an expression as a postfix operator
    pub fn is_postfix_operator(&self) -> bool {
        matches!(
            self,
            Token::LParen | Token::Dot | Token::Quote | Token::PlusPlus | Token::MinusMinus
        )
    }
}
