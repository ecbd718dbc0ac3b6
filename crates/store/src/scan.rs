//! Range operators and scan results
//!
//! `Op` names the four supported comparison operators for range scans.
//! `Scan` is the sequence a scan produces: forward-only, non-restartable,
//! decoding each stored value through the permissive codec as it advances.

use std::fmt;
use std::str::FromStr;

use maskdb_core::{Error, Value};

/// Range-scan comparison operator.
///
/// The operator fixes the scan direction: the `Lt` family scans descending
/// ("the N closest below the anchor"), the `Gt` family ascending ("the N
/// closest above"). The direction convention is independent of whether the
/// scan compares keys or creation timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Strictly greater than the anchor (anchor row excluded).
    Gt,
    /// Greater than or equal to the anchor (anchor row included).
    Gte,
    /// Strictly less than the anchor (anchor row excluded).
    Lt,
    /// Less than or equal to the anchor (anchor row included).
    Lte,
}

impl Op {
    /// SQL comparison symbol.
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
        }
    }

    /// True for the `Lt` family, which scans descending.
    pub(crate) fn descending(self) -> bool {
        matches!(self, Op::Lt | Op::Lte)
    }
}

impl FromStr for Op {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(Op::Gt),
            ">=" => Ok(Op::Gte),
            "<" => Ok(Op::Lt),
            "<=" => Ok(Op::Lte),
            other => Err(Error::NoOperations(other.to_string())),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Result sequence of a range scan or a feature select.
///
/// Matching rows are captured when the scan statement runs; values decode
/// lazily as the iterator advances. Rows written by feature-only updates
/// have no stored value and yield `None`.
#[derive(Debug)]
pub struct Scan {
    rows: std::vec::IntoIter<(String, Option<String>)>,
}

impl Scan {
    pub(crate) fn new(rows: Vec<(String, Option<String>)>) -> Self {
        Scan {
            rows: rows.into_iter(),
        }
    }
}

impl Iterator for Scan {
    type Item = (String, Option<Value>);

    fn next(&mut self) -> Option<Self::Item> {
        self.rows
            .next()
            .map(|(key, raw)| (key, raw.map(|text| Value::decode(&text))))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for Scan {}
