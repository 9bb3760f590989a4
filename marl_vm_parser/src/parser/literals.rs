//! Literal decoding: numbers and string escapes

use crate::token::Token;

/// Decode a numeric literal. Every Marl number is an f64.
pub(crate) fn parse_number(token: Token, text: &str) -> f64 {
    match token {
        Token::HexLiteral => fold_digits(&text[2..], 16),
        Token::BinaryLiteral => fold_digits(&text[2..], 2),
        _ => text.parse().unwrap_or(f64::NAN),
    }
}

fn fold_digits(digits: &str, radix: u32) -> f64 {
    digits.chars().fold(0.0, |acc, c| {
        acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
    })
}

/// Resolve escape sequences in a string body (without its quotes).
///
/// Supports `\n \t \r \0 \\ \" \'` and `\uXXXX`; an unknown escape keeps
/// the escaped character.
pub(crate) fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let mut code = 0u32;
                let mut digits = 0;
                while digits < 4 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            code = code * 16 + d;
                            digits += 1;
                            chars.next();
                        }
                        None => break,
                    }
                }
                match char::from_u32(code).filter(|_| digits > 0) {
                    Some(decoded) => out.push(decoded),
                    None => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
