//! Row Filter Expressions
//!
//! A tiny expression language over pin names used to select truth-table
//! rows, e.g. `Y == 1 && (A ^ B)` or `"carry out" != 0`.
//!
//! Names resolve to input or output pins when the filter is compiled, so a
//! compiled [`RowFilter`] is a pure function of a [`TruthState`].
//!
//! | Precedence | Operators              |
//! |-----------:|------------------------|
//! | 1          | `\|\|`                 |
//! | 2          | `&&`                   |
//! | 3          | `\|`                   |
//! | 4          | `^`                    |
//! | 5          | `&`                    |
//! | 6          | `==` `=` `!=`          |
//! | 7          | `<` `<=` `>` `>=`      |
//! | 8          | `<<` `>>`              |
//! | 9          | `+` `-`                |
//! | 10         | `*` `/` `%`            |
//! | unary      | `!` `~` `-`            |

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr, PinRef, UnaryOp};
pub use lexer::Token;
pub use parser::Parser;

use crate::truth_state::TruthState;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Empty filter expression")]
    Empty,

    #[error("Unrecognized input at offset {0}")]
    InvalidToken(usize),

    #[error("Unknown pin '{0}'")]
    UnknownPin(String),

    #[error("Unexpected '{found}' at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Expression nested deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },
}

/// Pin names a filter may refer to, in socket order
#[derive(Debug, Clone, Default)]
pub struct PinNames {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl PinNames {
    pub fn new<I, O, S, T>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<PinRef> {
        if let Some(i) = self.inputs.iter().position(|n| n == name) {
            return Some(PinRef::Input(i));
        }
        self.outputs
            .iter()
            .position(|n| n == name)
            .map(PinRef::Output)
    }
}

/// A compiled row predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    source: String,
    expr: Expr,
}

impl RowFilter {
    pub fn compile(source: &str, names: &PinNames) -> Result<Self, FilterError> {
        let expr = Parser::new(source, names)?.parse()?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Whether `row` satisfies the filter
    ///
    /// Anything that cannot be evaluated (an undecoded output, a division by
    /// zero) makes the row not match.
    pub fn matches(&self, row: &TruthState) -> bool {
        self.expr.eval(row).is_some_and(|v| v != 0)
    }
}
