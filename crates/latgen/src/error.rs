//! Error types for lattice generation.
//!
//! [`LatticeError`] covers everything the lattice algorithms and the factory
//! can reject. [`LatgenError`] is the facade-level error returned by
//! [`crate::Generator`], wrapping lattice errors together with input and
//! output failures.

use std::io;

use thiserror::Error;

use latgen_core::element::{ElementError, ElementKind};

/// Errors raised by [`crate::lattice::Lattice`] and [`crate::factory::LatticeFactory`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LatticeError {
    /// A length came out negative beyond the tolerance: overlapping devices,
    /// or an insertion point outside its target.
    #[error("geometry inconsistency at `{name}`: length {length}, remainder {remainder}")]
    GeometryInconsistency {
        name: String,
        length: f64,
        remainder: f64,
    },

    /// Two neighbouring elements do not touch.
    #[error("structural inconsistency between `{upstream}` and `{downstream}`: mismatch {mismatch}")]
    StructuralInconsistency {
        upstream: String,
        downstream: String,
        mismatch: f64,
    },

    /// An element constructor rejected its arguments.
    #[error("cannot construct {kind} `{name}`: {reason}")]
    ConstructionFailure {
        kind: ElementKind,
        name: String,
        reason: String,
    },

    /// Only zero-length elements can be inserted.
    #[error("cannot insert `{name}` with non-zero length {length}")]
    InsertNotThin { name: String, length: f64 },
}

impl From<ElementError> for LatticeError {
    fn from(error: ElementError) -> Self {
        match error {
            ElementError::NegativeSlice {
                name,
                length,
                remainder,
            } => Self::GeometryInconsistency {
                name,
                length,
                remainder,
            },
            ElementError::Construction { kind, name, reason } => {
                Self::ConstructionFailure { kind, name, reason }
            }
        }
    }
}

/// The main error type for latgen operations.
#[derive(Debug, Error)]
pub enum LatgenError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid device hierarchy: {0}")]
    Input(#[from] toml::de::Error),

    #[error("Lattice error: {0}")]
    Lattice(#[from] LatticeError),

    #[error("Export error: {0}")]
    Export(#[from] crate::export::Error),
}
