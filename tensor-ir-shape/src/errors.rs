use std::error::Error;
use std::fmt;

use crate::partial_shape::PartialShape;

/// Errors from operations on partial shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeError {
    /// A concrete shape was requested from a shape with an unknown rank or
    /// dimension.
    IncompleteShape { shape: PartialShape },

    /// Two shapes of known but different rank were combined dimension-wise.
    RankMismatch { lhs: usize, rhs: usize },

    /// A dimension computed from other dimensions does not fit in `usize`.
    DimensionOverflow { axis: usize },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteShape { shape } => {
                write!(f, "shape {} is not complete", shape)
            }
            Self::RankMismatch { lhs, rhs } => {
                write!(f, "shapes have different ranks ({} vs {})", lhs, rhs)
            }
            Self::DimensionOverflow { axis } => {
                write!(f, "dimension {} overflows", axis)
            }
        }
    }
}

impl Error for ShapeError {}
