//! Filter expression tree and its evaluation over a row

use crate::truth_state::TruthState;
use std::fmt;

/// A pin resolved to its socket index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRef {
    Input(usize),
    Output(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `~`
    BitNot,
    /// `-`
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Binding power; higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::LogicalOr => 1,
            BinaryOp::LogicalAnd => 2,
            BinaryOp::BitOr => 3,
            BinaryOp::BitXor => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::Eq | BinaryOp::NotEq => 6,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 7,
            BinaryOp::Shl | BinaryOp::Shr => 8,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 10,
        }
    }

    fn apply(self, lhs: i64, rhs: i64) -> Option<i64> {
        let value = match self {
            BinaryOp::LogicalOr => i64::from(lhs != 0 || rhs != 0),
            BinaryOp::LogicalAnd => i64::from(lhs != 0 && rhs != 0),
            BinaryOp::BitOr => lhs | rhs,
            BinaryOp::BitXor => lhs ^ rhs,
            BinaryOp::BitAnd => lhs & rhs,
            BinaryOp::Eq => i64::from(lhs == rhs),
            BinaryOp::NotEq => i64::from(lhs != rhs),
            BinaryOp::Lt => i64::from(lhs < rhs),
            BinaryOp::Le => i64::from(lhs <= rhs),
            BinaryOp::Gt => i64::from(lhs > rhs),
            BinaryOp::Ge => i64::from(lhs >= rhs),
            BinaryOp::Shl => lhs.checked_shl(u32::try_from(rhs).ok()?)?,
            BinaryOp::Shr => lhs.checked_shr(u32::try_from(rhs).ok()?)?,
            BinaryOp::Add => lhs.wrapping_add(rhs),
            BinaryOp::Sub => lhs.wrapping_sub(rhs),
            BinaryOp::Mul => lhs.wrapping_mul(rhs),
            BinaryOp::Div => lhs.checked_div(rhs)?,
            BinaryOp::Rem => lhs.checked_rem(rhs)?,
        };
        Some(value)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::LogicalOr => "||",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(i64),
    Pin(PinRef),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Evaluate against a row; `None` when a value is unavailable
    pub fn eval(&self, row: &TruthState) -> Option<i64> {
        match self {
            Expr::Literal(value) => Some(*value),
            Expr::Pin(PinRef::Input(i)) => row.input(*i).map(i64::from),
            Expr::Pin(PinRef::Output(j)) => row.output(*j).map(i64::from),
            Expr::Unary { op, operand } => {
                let value = operand.eval(row)?;
                Some(match op {
                    UnaryOp::Not => i64::from(value == 0),
                    UnaryOp::BitNot => !value,
                    UnaryOp::Neg => value.wrapping_neg(),
                })
            }
            // a known deciding side wins even when the other is unavailable
            Expr::Binary {
                op: BinaryOp::LogicalOr,
                lhs,
                rhs,
            } => match (truth(lhs.eval(row)), truth(rhs.eval(row))) {
                (Some(true), _) | (_, Some(true)) => Some(1),
                (Some(false), Some(false)) => Some(0),
                _ => None,
            },
            Expr::Binary {
                op: BinaryOp::LogicalAnd,
                lhs,
                rhs,
            } => match (truth(lhs.eval(row)), truth(rhs.eval(row))) {
                (Some(false), _) | (_, Some(false)) => Some(0),
                (Some(true), Some(true)) => Some(1),
                _ => None,
            },
            Expr::Binary { op, lhs, rhs } => op.apply(lhs.eval(row)?, rhs.eval(row)?),
        }
    }
}

fn truth(value: Option<i64>) -> Option<bool> {
    value.map(|v| v != 0)
}
