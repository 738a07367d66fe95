//! Precedence-climbing parser for filter expressions

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{tokenize, Token, TokenWithPos};
use super::{FilterError, PinNames};

/// Deepest run of unary operators and parentheses accepted
pub const MAX_NESTING: usize = 256;

pub struct Parser<'a> {
    tokens: Vec<TokenWithPos>,
    current: usize,
    depth: usize,
    names: &'a PinNames,
}

impl<'a> Parser<'a> {
    pub fn new(source: &str, names: &'a PinNames) -> Result<Self, FilterError> {
        let tokens = tokenize(source).map_err(FilterError::InvalidToken)?;
        Ok(Self {
            tokens,
            current: 0,
            depth: 0,
            names,
        })
    }

    /// Parse the whole input as a single expression
    pub fn parse(mut self) -> Result<Expr, FilterError> {
        if self.is_at_end() {
            return Err(FilterError::Empty);
        }
        let expr = self.parse_binary(1)?;
        match self.current_token() {
            None => Ok(expr),
            Some(token) => Err(unexpected(token)),
        }
    }

    /// Parse operators binding at least as tightly as `min_precedence`
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, FilterError> {
        let mut lhs = self.parse_unary()?;

        while let Some(op) = self.current_binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.bump();
            // all binary operators are left-associative
            let rhs = self.parse_binary(precedence + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, FilterError> {
        let op = match self.current_token().map(|t| &t.token) {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Tilde) => UnaryOp::BitNot,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.parse_primary(),
        };
        self.descend()?;
        self.bump();
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, FilterError> {
        let token = self
            .current_token()
            .cloned()
            .ok_or(FilterError::UnexpectedEnd)?;
        self.bump();

        match token.token {
            Token::Number(value) => Ok(Expr::Literal(value)),
            Token::Identifier(name) | Token::QuotedName(name) => self
                .names
                .resolve(&name)
                .map(Expr::Pin)
                .ok_or(FilterError::UnknownPin(name)),
            Token::LeftParen => {
                self.descend()?;
                let inner = self.parse_binary(1)?;
                self.expect(Token::RightParen)?;
                self.depth -= 1;
                Ok(inner)
            }
            _ => Err(unexpected(&token)),
        }
    }

    fn descend(&mut self) -> Result<(), FilterError> {
        if self.depth >= MAX_NESTING {
            return Err(FilterError::TooDeep {
                limit: MAX_NESTING,
                offset: self.current_token().map_or(0, |t| t.span.start),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn current_binary_op(&self) -> Option<BinaryOp> {
        let op = match &self.current_token()?.token {
            Token::OrOr => BinaryOp::LogicalOr,
            Token::AndAnd => BinaryOp::LogicalAnd,
            Token::Pipe => BinaryOp::BitOr,
            Token::Caret => BinaryOp::BitXor,
            Token::Amp => BinaryOp::BitAnd,
            Token::Eq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::Le => BinaryOp::Le,
            Token::Gt => BinaryOp::Gt,
            Token::Ge => BinaryOp::Ge,
            Token::Shl => BinaryOp::Shl,
            Token::Shr => BinaryOp::Shr,
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Rem,
            _ => return None,
        };
        Some(op)
    }

    fn expect(&mut self, expected: Token) -> Result<(), FilterError> {
        match self.current_token() {
            Some(token) if token.token == expected => {
                self.bump();
                Ok(())
            }
            Some(token) => Err(unexpected(token)),
            None => Err(FilterError::UnexpectedEnd),
        }
    }

    fn current_token(&self) -> Option<&TokenWithPos> {
        self.tokens.get(self.current)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn bump(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }
}

fn unexpected(token: &TokenWithPos) -> FilterError {
    FilterError::UnexpectedToken {
        found: token.token.to_string(),
        offset: token.span.start,
    }
}
