//! Token definitions for the Marl lexer

mod precedence;


use logos::Logos;

pub use precedence::{Associativity, Precedence};

/// Marl tokens
///
/// Whitespace, including newlines, carries no meaning and is skipped.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // ==================== Keywords ====================
    #[token("var")]
    KwVar,
    #[token("return")]
    KwReturn,
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("while")]
    KwWhile,
    #[token("break")]
    KwBreak,
    #[token("continue")]
    KwContinue,
    #[token("new")]
    KwNew,

    // ==================== Boolean Literals ====================
    #[token("true")]
    True,
    #[token("false")]
    False,

    // ==================== Delimiters ====================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // ==================== Punctuation ====================
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token(".")]
    Dot,
    #[token("=>")]
    FatArrow,

    // ==================== Operators ====================
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("\\")]
    Backslash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("'")]
    Quote,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("==")]
    EqEq,
    #[token("~=")]
    TildeEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("|")]
    Pipe,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,

    // ==================== Comments ====================
    #[regex(r"//[^\n]*")]
    LineComment,
    /// Start of a `/* ... */` comment; the lexer scans to the closing `*/`
    #[token("/*")]
    BlockCommentStart,

    // ==================== Literals ====================
    #[regex(r"0[bB][01]+")]
    BinaryLiteral,
    #[regex(r"0[xX][0-9a-fA-F]+")]
    HexLiteral,
    #[regex(r"[0-9]+")]
    DecimalLiteral,
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    FloatLiteral,
    /// Opening quote; the lexer scans the body and emits `StringLiteral`
    #[token("\"")]
    DoubleQuote,
    /// A complete `"..."` literal including its quotes (produced by the lexer)
    StringLiteral,
    /// A string literal running to the end of input (produced by the lexer)
    UnterminatedString,

    // ==================== Identifiers ====================
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    // ==================== Special ====================
    /// Any character sequence the lexer does not recognize
    Unknown,
    /// End of input; repeated forever once reached
    End,
}

impl Token {
    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::KwVar
                | Token::KwReturn
                | Token::KwIf
                | Token::KwElse
                | Token::KwWhile
                | Token::KwBreak
                | Token::KwContinue
                | Token::KwNew
                | Token::True
                | Token::False
        )
    }

    /// Check if this token is a numeric literal
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Token::DecimalLiteral | Token::FloatLiteral | Token::HexLiteral | Token::BinaryLiteral
        )
    }

    /// Check if this token closes a group, list or scope
    pub fn is_closing_delimiter(&self) -> bool {
        matches!(self, Token::RParen | Token::RBracket | Token::RBrace)
    }

    /// Check if this token is a comment (never handed to the parser)
    pub fn is_comment(&self) -> bool {
        matches!(self, Token::LineComment | Token::BlockCommentStart)
    }
}
