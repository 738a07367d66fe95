//! Filter expression lexer

use logos::Logos;
use std::fmt;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Identifier(String),

    /// Pin names containing spaces or symbols: `"carry out"`
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    QuotedName(String),

    #[regex(r"0[xX][0-9a-fA-F_]+", |lex| parse_radix(&lex.slice()[2..], 16))]
    #[regex(r"0[bB][01_]+", |lex| parse_radix(&lex.slice()[2..], 2))]
    #[regex(r"[0-9][0-9_]*", |lex| parse_radix(lex.slice(), 10))]
    Number(i64),

    #[token("||")]
    OrOr,
    #[token("&&")]
    AndAnd,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("&")]
    Amp,
    #[token("==")]
    #[token("=")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "{}", name),
            Token::QuotedName(name) => write!(f, "\"{}\"", name),
            Token::Number(n) => write!(f, "{}", n),
            Token::OrOr => write!(f, "||"),
            Token::AndAnd => write!(f, "&&"),
            Token::Pipe => write!(f, "|"),
            Token::Caret => write!(f, "^"),
            Token::Amp => write!(f, "&"),
            Token::Eq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Shl => write!(f, "<<"),
            Token::Shr => write!(f, ">>"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Bang => write!(f, "!"),
            Token::Tilde => write!(f, "~"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
        }
    }
}

/// Parse digits in the given radix, ignoring `_` separators
fn parse_radix(digits: &str, radix: u32) -> Option<i64> {
    let cleaned = digits.replace('_', "");
    if cleaned.is_empty() {
        return None;
    }
    i64::from_str_radix(&cleaned, radix).ok()
}

fn unquote(input: &str) -> Option<String> {
    let inner = input.get(1..input.len() - 1)?;
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => result.push(chars.next()?),
            c => result.push(c),
        }
    }
    Some(result)
}

/// Token with its byte range in the source
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithPos {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

/// Tokenize a filter, failing at the first unrecognized input
pub fn tokenize(source: &str) -> Result<Vec<TokenWithPos>, usize> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push(TokenWithPos { token, span }),
            Err(()) => return Err(span.start),
        }
    }
    Ok(tokens)
}
