//! Error type for configuration boundaries.
//!
//! Queries (`side`, `closest_point`, `sample`) are total and never return
//! errors; only constructors and setters that accept configuration do.

use std::fmt;

/// Errors surfaced when building or reconfiguring zone geometry.
#[derive(Clone, Debug, PartialEq)]
pub enum GeomError {
    /// A configuration value is out of range (negative extent, zero subdivision, ...).
    InvalidConfig { reason: String },
    /// Input geometry cannot support the requested structure (non-finite bounds, ...).
    DegenerateInput { reason: String },
    /// A vertex index past the end of the ring.
    VertexIndex { index: usize, len: usize },
}

impl GeomError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GeomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid config: {reason}"),
            Self::DegenerateInput { reason } => write!(f, "degenerate input: {reason}"),
            Self::VertexIndex { index, len } => {
                write!(f, "vertex index {index} out of range for ring of {len}")
            }
        }
    }
}

impl std::error::Error for GeomError {}
