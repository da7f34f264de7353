use std::error::Error;
use std::fmt;

/// Errors when configuring or querying a
/// [`CoordinateTransform`](crate::CoordinateTransform).
#[derive(Clone, Debug, PartialEq)]
pub enum TransformError {
    /// A per-axis configuration vector, or a coordinate, has the wrong
    /// length.
    RankMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The start corner is after the end corner along an axis.
    StartAfterEnd {
        axis: usize,
        start: usize,
        end: usize,
    },

    /// The end corner exceeds the source shape along an axis.
    EndOutOfBounds { axis: usize, end: usize, size: usize },

    ZeroStride { axis: usize },

    ZeroDilation { axis: usize },

    /// The axis order is not a permutation of `0..rank`.
    InvalidAxisOrder,

    /// Negative padding removes more elements than the axis has.
    NegativeExtent { axis: usize },

    /// Dilation or padding gives an extent that does not fit in `isize`.
    ExtentOverflow { axis: usize },

    /// A coordinate lies outside the target index space.
    CoordinateOutOfBounds,
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RankMismatch {
                what,
                expected,
                actual,
            } => write!(
                f,
                "{} has length {} but source rank is {}",
                what, actual, expected
            ),
            Self::StartAfterEnd { axis, start, end } => write!(
                f,
                "start corner ({}) is after end corner ({}) for axis {}",
                start, end, axis
            ),
            Self::EndOutOfBounds { axis, end, size } => write!(
                f,
                "end corner ({}) exceeds source size ({}) for axis {}",
                end, size, axis
            ),
            Self::ZeroStride { axis } => write!(f, "stride for axis {} is zero", axis),
            Self::ZeroDilation { axis } => write!(f, "dilation for axis {} is zero", axis),
            Self::InvalidAxisOrder => write!(f, "axis order is not a permutation"),
            Self::NegativeExtent { axis } => {
                write!(f, "padding for axis {} gives a negative extent", axis)
            }
            Self::ExtentOverflow { axis } => {
                write!(f, "extent of axis {} overflows", axis)
            }
            Self::CoordinateOutOfBounds => write!(f, "coordinate is out of bounds"),
        }
    }
}

impl Error for TransformError {}
