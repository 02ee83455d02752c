//! Signal expressions
//!
//! Parses `V(node)`, `V(node1, node2)` and `I(element)` references and
//! provides the linear interpolation used when a signal is queried at
//! arbitrary time or frequency points.

use crate::types::{Result, WaveError};
use std::fmt;

/// Physical kind of a signal, inferred from the expression's leading letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Voltage,
    Current,
}

impl SignalKind {
    /// Unit letter used when rendering measurements.
    #[inline]
    pub fn unit_symbol(self) -> char {
        match self {
            SignalKind::Voltage => 'V',
            SignalKind::Current => 'A',
        }
    }

    /// Leading letter of the expression grammar.
    #[inline]
    fn letter(self) -> char {
        match self {
            SignalKind::Voltage => 'V',
            SignalKind::Current => 'I',
        }
    }
}

/// A parsed signal reference. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalReference {
    SingleEnded { kind: SignalKind, node: String },
    /// Difference of two node voltages; only the 'V' form takes two nodes.
    Differential { node_pos: String, node_neg: String },
}

impl SignalReference {
    /// Parse a signal expression. Whitespace around identifiers inside the
    /// parentheses is ignored.
    pub fn parse(expr: &str) -> Result<Self> {
        let invalid = || WaveError::InvalidSignalExpression(expr.to_string());
        let trimmed = expr.trim();

        let (kind, rest) = if let Some(rest) = trimmed.strip_prefix('V') {
            (SignalKind::Voltage, rest)
        } else if let Some(rest) = trimmed.strip_prefix('I') {
            (SignalKind::Current, rest)
        } else {
            return Err(invalid());
        };

        let inner = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(invalid)?;

        let nodes: Vec<&str> = inner.split(',').map(str::trim).collect();
        if nodes.iter().any(|n| !is_identifier(n)) {
            return Err(invalid());
        }

        match (kind, nodes.as_slice()) {
            (_, [node]) => Ok(SignalReference::SingleEnded {
                kind,
                node: node.to_string(),
            }),
            (SignalKind::Voltage, [pos, neg]) => Ok(SignalReference::Differential {
                node_pos: pos.to_string(),
                node_neg: neg.to_string(),
            }),
            _ => Err(invalid()),
        }
    }

    /// Physical kind; a differential reference is always a voltage.
    #[inline]
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalReference::SingleEnded { kind, .. } => *kind,
            SignalReference::Differential { .. } => SignalKind::Voltage,
        }
    }
}

impl fmt::Display for SignalReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalReference::SingleEnded { kind, node } => {
                write!(f, "{}({})", kind.letter(), node)
            }
            SignalReference::Differential { node_pos, node_neg } => {
                write!(f, "V({},{})", node_pos, node_neg)
            }
        }
    }
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

// ============================================================================
// Interpolation
// ============================================================================

/// Linearly interpolate `(x, y)` samples at each query point.
///
/// Queries outside the recorded range clamp to the boundary sample value
/// rather than extrapolating a slope. `x` must be ascending and non-empty.
pub fn interp(query: &[f64], x: &[f64], y: &[f64]) -> Vec<f64> {
    query.iter().map(|&q| interp_one(q, x, y)).collect()
}

fn interp_one(q: f64, x: &[f64], y: &[f64]) -> f64 {
    let last = x.len() - 1;
    if q <= x[0] {
        return y[0];
    }
    if q >= x[last] {
        return y[last];
    }

    let hi = x.partition_point(|&v| v < q);
    let lo = hi - 1;
    if x[hi] == x[lo] {
        return y[hi];
    }
    y[lo] + (y[hi] - y[lo]) * (q - x[lo]) / (x[hi] - x[lo])
}
