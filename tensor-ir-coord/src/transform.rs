use smallvec::{smallvec, SmallVec};

use crate::coordinates::Coordinates;
use crate::errors::TransformError;

/// Position in a tensor's index space.
pub type Coordinate = SmallVec<[usize; 4]>;

type AxisVec<T> = SmallVec<[T; 4]>;

/// Return the length of `len` elements after inserting `dilation - 1` gaps
/// between neighbors, or `None` if it overflows.
fn dilated_len(len: usize, dilation: usize) -> Option<usize> {
    if len == 0 {
        Some(0)
    } else {
        (len - 1).checked_mul(dilation)?.checked_add(1)
    }
}

/// Add signed edge padding to an axis of `len` elements.
///
/// The sum is exact, so callers can tell a negative extent from one that is
/// too large.
fn padded_len(len: usize, padding_below: isize, padding_above: isize) -> i128 {
    len as i128 + padding_below as i128 + padding_above as i128
}

/// Convert an exact padded length to an extent that fits in `isize`.
fn to_extent(padded: i128) -> Option<usize> {
    isize::try_from(padded)
        .ok()
        .and_then(|padded| usize::try_from(padded).ok())
}

/// Return the extent of an axis of `len` elements after dilation and padding.
///
/// Padding may be negative, which removes elements from the edges. Returns
/// `None` if the result would be negative or does not fit in `isize`.
pub fn padded_dilated_extent(
    len: usize,
    padding_below: isize,
    padding_above: isize,
    dilation: usize,
) -> Option<usize> {
    let dilated = dilated_len(len, dilation)?;
    to_extent(padded_len(dilated, padding_below, padding_above))
}

/// Result of mapping a target coordinate back to the source tensor.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceCoordinate {
    /// The coordinate maps to this position in the source.
    Source(Coordinate),

    /// The coordinate lies in the padding around the source.
    Padding,

    /// The coordinate lies between two dilated source elements.
    DilationGap,
}

/// Mapping from a target index space to a source tensor.
///
/// The target space is obtained from the source shape by taking the region
/// between a start and end corner, keeping every `stride`-th element,
/// inserting `dilation - 1` gaps between the kept elements, adding padding
/// and finally permuting the axes. All per-axis settings are indexed by
/// source axis. Padding is counted in target-space elements and may be
/// negative.
///
/// The transform enumerates target coordinates in row-major order and maps
/// each back to the source with
/// [`to_source_coordinate`](CoordinateTransform::to_source_coordinate).
///
/// ```
/// use tensor_ir_coord::{CoordinateTransform, SourceCoordinate};
///
/// // Every other column of a 2x4 matrix, transposed.
/// let transform = CoordinateTransform::builder(&[2, 4])
///     .strides(&[1, 2])
///     .axis_order(&[1, 0])
///     .build()
///     .unwrap();
/// assert_eq!(transform.target_shape(), &[2, 2]);
///
/// let source = transform.to_source_coordinate(&[1, 0]).unwrap();
/// assert_eq!(source, SourceCoordinate::Source([0, 2][..].into()));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateTransform {
    source_shape: AxisVec<usize>,
    start: AxisVec<usize>,
    end: AxisVec<usize>,
    strides: AxisVec<usize>,
    axis_order: AxisVec<usize>,
    padding_below: AxisVec<isize>,
    padding_above: AxisVec<isize>,
    dilation: AxisVec<usize>,

    /// Length of each source axis after slicing, striding and dilation.
    dilated: AxisVec<usize>,

    /// Extent of each target axis.
    target_shape: Coordinate,
}

impl CoordinateTransform {
    /// Create a transform which maps every coordinate in `source_shape` to
    /// itself.
    pub fn new(source_shape: &[usize]) -> CoordinateTransform {
        let rank = source_shape.len();
        CoordinateTransform {
            source_shape: source_shape.into(),
            start: smallvec![0; rank],
            end: source_shape.into(),
            strides: smallvec![1; rank],
            axis_order: (0..rank).collect(),
            padding_below: smallvec![0; rank],
            padding_above: smallvec![0; rank],
            dilation: smallvec![1; rank],
            dilated: source_shape.into(),
            target_shape: source_shape.into(),
        }
    }

    /// Start configuring a transform over `source_shape`.
    ///
    /// Settings which are not specified default to the identity mapping.
    pub fn builder(source_shape: &[usize]) -> TransformBuilder {
        TransformBuilder::new(source_shape)
    }

    pub fn source_shape(&self) -> &[usize] {
        &self.source_shape
    }

    pub fn target_shape(&self) -> &[usize] {
        &self.target_shape
    }

    pub fn start_corner(&self) -> &[usize] {
        &self.start
    }

    pub fn end_corner(&self) -> &[usize] {
        &self.end
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn axis_order(&self) -> &[usize] {
        &self.axis_order
    }

    pub fn padding_below(&self) -> &[isize] {
        &self.padding_below
    }

    pub fn padding_above(&self) -> &[isize] {
        &self.padding_above
    }

    pub fn dilation(&self) -> &[usize] {
        &self.dilation
    }

    pub fn ndim(&self) -> usize {
        self.source_shape.len()
    }

    /// Return the number of coordinates in the target space.
    ///
    /// Saturates at `usize::MAX`.
    pub fn len(&self) -> usize {
        self.target_shape
            .iter()
            .fold(1usize, |count, &size| count.saturating_mul(size))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over target-space coordinates in row-major order.
    ///
    /// Each call starts a new traversal from the first coordinate.
    pub fn iter(&self) -> Coordinates {
        Coordinates::from_shape(&self.target_shape)
    }

    /// Map a target-space coordinate to the source tensor.
    ///
    /// Coordinates in the padding frame, or between dilated elements, are
    /// reported as [`SourceCoordinate::Padding`] or
    /// [`SourceCoordinate::DilationGap`]. Padding takes precedence if a
    /// coordinate is in the padding along one axis and in a gap along
    /// another.
    pub fn to_source_coordinate(
        &self,
        coord: &[usize],
    ) -> Result<SourceCoordinate, TransformError> {
        if coord.len() != self.ndim() {
            return Err(TransformError::RankMismatch {
                what: "coordinate",
                expected: self.ndim(),
                actual: coord.len(),
            });
        }

        if coord
            .iter()
            .zip(self.target_shape.iter())
            .any(|(&pos, &size)| pos >= size)
        {
            return Err(TransformError::CoordinateOutOfBounds);
        }

        let mut source: Coordinate = smallvec![0; self.ndim()];
        let mut in_gap = false;

        for (target_axis, &pos) in coord.iter().enumerate() {
            let axis = self.axis_order[target_axis];

            // Large negative padding can overflow the subtraction.
            let Some(unpadded) = (pos as isize).checked_sub(self.padding_below[axis]) else {
                return Ok(SourceCoordinate::Padding);
            };
            if unpadded < 0 || unpadded >= self.dilated[axis] as isize {
                return Ok(SourceCoordinate::Padding);
            }

            let unpadded = unpadded as usize;
            if unpadded % self.dilation[axis] != 0 {
                in_gap = true;
                continue;
            }
            source[axis] =
                self.start[axis] + (unpadded / self.dilation[axis]) * self.strides[axis];
        }

        if in_gap {
            Ok(SourceCoordinate::DilationGap)
        } else {
            Ok(SourceCoordinate::Source(source))
        }
    }

    /// Return true if `coord` maps to an element of the source tensor.
    pub fn has_source_coordinate(&self, coord: &[usize]) -> bool {
        matches!(
            self.to_source_coordinate(coord),
            Ok(SourceCoordinate::Source(_))
        )
    }

    /// Return the offset in a contiguous row-major source tensor of the
    /// element that `coord` maps to, or `None` for padding and gaps.
    pub fn source_offset(&self, coord: &[usize]) -> Result<Option<usize>, TransformError> {
        let SourceCoordinate::Source(source) = self.to_source_coordinate(coord)? else {
            return Ok(None);
        };
        let offset = source
            .iter()
            .zip(self.source_shape.iter())
            .fold(0, |offset, (&index, &size)| offset * size + index);
        Ok(Some(offset))
    }
}

impl<'a> IntoIterator for &'a CoordinateTransform {
    type Item = Coordinate;
    type IntoIter = Coordinates;

    fn into_iter(self) -> Coordinates {
        self.iter()
    }
}

/// Builder for a [`CoordinateTransform`].
///
/// Settings are validated together when [`build`](TransformBuilder::build)
/// is called.
#[derive(Clone, Debug)]
pub struct TransformBuilder {
    source_shape: AxisVec<usize>,
    start: Option<AxisVec<usize>>,
    end: Option<AxisVec<usize>>,
    strides: Option<AxisVec<usize>>,
    axis_order: Option<AxisVec<usize>>,
    padding_below: Option<AxisVec<isize>>,
    padding_above: Option<AxisVec<isize>>,
    dilation: Option<AxisVec<usize>>,
}

impl TransformBuilder {
    fn new(source_shape: &[usize]) -> TransformBuilder {
        TransformBuilder {
            source_shape: source_shape.into(),
            start: None,
            end: None,
            strides: None,
            axis_order: None,
            padding_below: None,
            padding_above: None,
            dilation: None,
        }
    }

    pub fn start_corner(mut self, start: &[usize]) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn end_corner(mut self, end: &[usize]) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn strides(mut self, strides: &[usize]) -> Self {
        self.strides = Some(strides.into());
        self
    }

    /// Set the source axis which each target axis is taken from.
    pub fn axis_order(mut self, axis_order: &[usize]) -> Self {
        self.axis_order = Some(axis_order.into());
        self
    }

    pub fn padding(mut self, below: &[isize], above: &[isize]) -> Self {
        self.padding_below = Some(below.into());
        self.padding_above = Some(above.into());
        self
    }

    pub fn dilation(mut self, dilation: &[usize]) -> Self {
        self.dilation = Some(dilation.into());
        self
    }

    /// Validate the settings and create the transform.
    pub fn build(self) -> Result<CoordinateTransform, TransformError> {
        let rank = self.source_shape.len();

        let check_len = |what: &'static str, len: usize| {
            if len == rank {
                Ok(())
            } else {
                Err(TransformError::RankMismatch {
                    what,
                    expected: rank,
                    actual: len,
                })
            }
        };

        let start = self.start.unwrap_or_else(|| smallvec![0; rank]);
        let end = self.end.unwrap_or_else(|| self.source_shape.clone());
        let strides = self.strides.unwrap_or_else(|| smallvec![1; rank]);
        let axis_order = self.axis_order.unwrap_or_else(|| (0..rank).collect());
        let padding_below = self.padding_below.unwrap_or_else(|| smallvec![0; rank]);
        let padding_above = self.padding_above.unwrap_or_else(|| smallvec![0; rank]);
        let dilation = self.dilation.unwrap_or_else(|| smallvec![1; rank]);

        check_len("start corner", start.len())?;
        check_len("end corner", end.len())?;
        check_len("strides", strides.len())?;
        check_len("axis order", axis_order.len())?;
        check_len("padding below", padding_below.len())?;
        check_len("padding above", padding_above.len())?;
        check_len("dilation", dilation.len())?;

        let mut seen: AxisVec<bool> = smallvec![false; rank];
        for &axis in &axis_order {
            if axis >= rank || seen[axis] {
                return Err(TransformError::InvalidAxisOrder);
            }
            seen[axis] = true;
        }

        let mut dilated = AxisVec::with_capacity(rank);
        let mut extents: AxisVec<usize> = AxisVec::with_capacity(rank);

        for axis in 0..rank {
            if strides[axis] == 0 {
                return Err(TransformError::ZeroStride { axis });
            }
            if dilation[axis] == 0 {
                return Err(TransformError::ZeroDilation { axis });
            }
            if start[axis] > end[axis] {
                return Err(TransformError::StartAfterEnd {
                    axis,
                    start: start[axis],
                    end: end[axis],
                });
            }
            if end[axis] > self.source_shape[axis] {
                return Err(TransformError::EndOutOfBounds {
                    axis,
                    end: end[axis],
                    size: self.source_shape[axis],
                });
            }

            let len = (end[axis] - start[axis]).div_ceil(strides[axis]);
            let dilated_axis = dilated_len(len, dilation[axis])
                .filter(|&n| isize::try_from(n).is_ok())
                .ok_or(TransformError::ExtentOverflow { axis })?;
            let padded = padded_len(dilated_axis, padding_below[axis], padding_above[axis]);
            if padded < 0 {
                return Err(TransformError::NegativeExtent { axis });
            }
            let extent = to_extent(padded).ok_or(TransformError::ExtentOverflow { axis })?;
            dilated.push(dilated_axis);
            extents.push(extent);
        }

        let target_shape = axis_order.iter().map(|&axis| extents[axis]).collect();

        Ok(CoordinateTransform {
            source_shape: self.source_shape,
            start,
            end,
            strides,
            axis_order,
            padding_below,
            padding_above,
            dilation,
            dilated,
            target_shape,
        })
    }
}
