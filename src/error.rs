use crate::real::Real;
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed distribution or chain parameters.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Generator matrix breaking the row-sum or sign invariants.
    #[error("invalid generator matrix at {location}: {violation} (got {value})")]
    InvalidGenerator {
        location: Location,
        value: Real,
        violation: Violation,
    },

    /// Query outside the index set of a sequence or process.
    #[error("domain error: {0}")]
    Domain(String),
}

impl Error {
    pub(crate) fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Error::InvalidParameter(msg.into())
    }

    pub(crate) fn domain<S: Into<String>>(msg: S) -> Self {
        Error::Domain(msg.into())
    }
}

/// Position of an offending generator entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum Location {
    /// The matrix as a whole, e.g. its dimension.
    Matrix,
    Row(usize),
    Entry(usize, usize),
}

impl Location {
    pub fn row(row: usize) -> Self {
        Location::Row(row)
    }
    pub fn entry(row: usize, col: usize) -> Self {
        Location::Entry(row, col)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Location::Matrix => f.write_str("dimension"),
            Location::Row(row) => write!(f, "row {}", row),
            Location::Entry(row, col) => write!(f, "({}, {})", row, col),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum Violation {
    Empty,
    NotSquare,
    NonFinite,
    RowSum,
    PositiveDiagonal,
    NegativeOffDiagonal,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            Violation::Empty => "matrix has no states",
            Violation::NotSquare => "matrix must be square",
            Violation::NonFinite => "rates must be finite",
            Violation::RowSum => "rows must sum to 0",
            Violation::PositiveDiagonal => "diagonal elements cannot be positive",
            Violation::NegativeOffDiagonal => "off-diagonal elements cannot be negative",
        };
        f.write_str(msg)
    }
}


// -- end of file --
