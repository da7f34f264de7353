use std::fmt;
use std::ops::{Index, IndexMut};

use smallvec::SmallVec;

use crate::dimension::{Dimension, Rank};
use crate::errors::ShapeError;
use crate::shape::{write_list, AxisSet, Shape};

/// Shape of a tensor where the rank, or the size of individual dimensions,
/// may be unknown.
///
/// If the rank is unknown then nothing is known about the dimensions. If the
/// rank is known then the number of dimensions is fixed for the lifetime of
/// the shape, although individual dimensions may be replaced.
///
/// ```
/// use tensor_ir_shape::{partial_shape, PartialShape};
///
/// let mut a = partial_shape![1, ?, 3];
/// let b = partial_shape![?, 2, 3];
/// assert!(PartialShape::merge_into(&mut a, &b));
/// assert_eq!(a, partial_shape![1, 2, 3]);
/// assert_eq!(a.to_string(), "{1,2,3}");
/// ```
///
/// The derived `PartialEq` is [`same_scheme`](PartialShape::same_scheme)
/// equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PartialShape {
    /// Dimensions, or `None` if the rank is unknown.
    dims: Option<SmallVec<[Dimension; 4]>>,
}

impl PartialShape {
    /// Create a shape with a known rank from a list of dimensions.
    pub fn new(dims: impl IntoIterator<Item = Dimension>) -> PartialShape {
        PartialShape {
            dims: Some(dims.into_iter().collect()),
        }
    }

    /// Return a shape with unknown rank.
    pub fn dynamic() -> PartialShape {
        PartialShape { dims: None }
    }

    /// Return a shape with a known rank and unknown dimensions.
    pub fn dynamic_with_rank(rank: usize) -> PartialShape {
        PartialShape::new(std::iter::repeat_n(Dimension::Dynamic, rank))
    }

    pub fn scalar() -> PartialShape {
        PartialShape {
            dims: Some(SmallVec::new()),
        }
    }

    pub fn rank(&self) -> Rank {
        self.dims
            .as_ref()
            .map(|dims| Rank::Fixed(dims.len()))
            .unwrap_or(Rank::Dynamic)
    }

    /// Return the rank if known.
    pub fn ndim(&self) -> Option<usize> {
        self.dims.as_ref().map(|dims| dims.len())
    }

    pub fn rank_is_static(&self) -> bool {
        self.dims.is_some()
    }

    /// Return the dimensions, or `None` if the rank is unknown.
    pub fn dims(&self) -> Option<&[Dimension]> {
        self.dims.as_deref()
    }

    /// Return true if the rank and all dimensions are known.
    pub fn is_complete(&self) -> bool {
        self.dims
            .as_ref()
            .is_some_and(|dims| dims.iter().all(|d| d.is_known()))
    }

    /// Return true if the rank or any dimension is unknown.
    pub fn is_dynamic(&self) -> bool {
        !self.is_complete()
    }

    /// Return true if `self` and `other` could describe the same tensor.
    pub fn compatible(&self, other: &PartialShape) -> bool {
        match (&self.dims, &other.dims) {
            (Some(a), Some(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| a.compatible(b))
            }
            _ => true,
        }
    }

    /// Return true if both shapes have unknown rank, or if they have the same
    /// rank and each pair of dimensions is either dynamic or equal.
    pub fn same_scheme(&self, other: &PartialShape) -> bool {
        match (&self.dims, &other.dims) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| a.same_scheme(b))
            }
            _ => false,
        }
    }

    /// Convert to a concrete shape.
    ///
    /// Fails with [`ShapeError::IncompleteShape`] unless the shape is
    /// complete.
    pub fn to_shape(&self) -> Result<Shape, ShapeError> {
        let incomplete = || ShapeError::IncompleteShape {
            shape: self.clone(),
        };
        let dims = self.dims.as_ref().ok_or_else(incomplete)?;
        dims.iter()
            .map(|d| d.value().ok_or_else(incomplete))
            .collect()
    }

    /// Merge the information in `src` into `dst`.
    ///
    /// After a successful merge `dst` is the most specific shape consistent
    /// with both inputs. Returns false if the shapes conflict, in which case
    /// the contents of `dst` are unspecified.
    pub fn merge_into(dst: &mut PartialShape, src: &PartialShape) -> bool {
        let Some(src_dims) = src.dims.as_ref() else {
            return true;
        };
        let Some(dst_dims) = dst.dims.as_mut() else {
            dst.dims = Some(src_dims.clone());
            return true;
        };
        if dst_dims.len() != src_dims.len() {
            return false;
        }
        for (dst_dim, src_dim) in dst_dims.iter_mut().zip(src_dims.iter()) {
            let Some(merged) = Dimension::merge(*dst_dim, *src_dim) else {
                return false;
            };
            *dst_dim = merged;
        }
        true
    }

    /// Return the merge of `a` and `b`, or `None` if they conflict.
    pub fn merge(a: &PartialShape, b: &PartialShape) -> Option<PartialShape> {
        let mut merged = a.clone();
        PartialShape::merge_into(&mut merged, b).then_some(merged)
    }

    /// Add two shapes dimension-wise.
    ///
    /// The result has unknown rank if either input does. Fails if both ranks
    /// are known and differ, or if a sum overflows.
    pub fn elementwise_add(&self, other: &PartialShape) -> Result<PartialShape, ShapeError> {
        let (Some(a), Some(b)) = (&self.dims, &other.dims) else {
            return Ok(PartialShape::dynamic());
        };
        if a.len() != b.len() {
            return Err(ShapeError::RankMismatch {
                lhs: a.len(),
                rhs: b.len(),
            });
        }
        let dims = a
            .iter()
            .zip(b.iter())
            .enumerate()
            .map(|(axis, (&a, &b))| {
                a.checked_add(b)
                    .ok_or(ShapeError::DimensionOverflow { axis })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PartialShape::new(dims))
    }

    /// Keep only the axes in `axes`.
    ///
    /// A shape of unknown rank stays unknown.
    pub fn project(&self, axes: &AxisSet) -> PartialShape {
        self.map_dims(|axis| axes.contains(axis))
    }

    /// Remove the axes in `axes`.
    ///
    /// A shape of unknown rank stays unknown.
    pub fn reduce(&self, axes: &AxisSet) -> PartialShape {
        self.map_dims(|axis| !axes.contains(axis))
    }

    fn map_dims(&self, keep: impl Fn(usize) -> bool) -> PartialShape {
        match &self.dims {
            Some(dims) => PartialShape::new(
                dims.iter()
                    .enumerate()
                    .filter(|(axis, _)| keep(*axis))
                    .map(|(_, dim)| *dim),
            ),
            None => PartialShape::dynamic(),
        }
    }
}

impl Index<usize> for PartialShape {
    type Output = Dimension;

    /// Return the dimension at `axis`.
    ///
    /// Panics if the rank is unknown or `axis` is out of bounds.
    fn index(&self, axis: usize) -> &Dimension {
        match &self.dims {
            Some(dims) => &dims[axis],
            None => panic!("cannot index a shape of unknown rank"),
        }
    }
}

impl IndexMut<usize> for PartialShape {
    fn index_mut(&mut self, axis: usize) -> &mut Dimension {
        match &mut self.dims {
            Some(dims) => &mut dims[axis],
            None => panic!("cannot index a shape of unknown rank"),
        }
    }
}

impl From<&Shape> for PartialShape {
    fn from(shape: &Shape) -> PartialShape {
        PartialShape::new(shape.iter().map(|&size| Dimension::Fixed(size)))
    }
}

impl From<Shape> for PartialShape {
    fn from(shape: Shape) -> PartialShape {
        PartialShape::from(&shape)
    }
}

impl From<&[usize]> for PartialShape {
    fn from(dims: &[usize]) -> PartialShape {
        PartialShape::new(dims.iter().map(|&size| Dimension::Fixed(size)))
    }
}

impl fmt::Display for PartialShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dims {
            Some(dims) => write_list(f, dims.iter()),
            None => write!(f, "?"),
        }
    }
}

/// Construct a [`PartialShape`] of known rank.
///
/// Each entry is either a size or `?` for an unknown dimension.
///
/// ```
/// use tensor_ir_shape::{partial_shape, Dimension, PartialShape};
///
/// let shape = partial_shape![2, ?];
/// assert_eq!(shape, PartialShape::new([Dimension::Fixed(2), Dimension::Dynamic]));
/// ```
#[macro_export]
macro_rules! partial_shape {
    (@dim ?) => {
        $crate::Dimension::Dynamic
    };

    (@dim $size:expr) => {
        $crate::Dimension::Fixed($size)
    };

    ($($dim:tt),* $(,)?) => {
        $crate::PartialShape::new([$($crate::partial_shape!(@dim $dim)),*])
    };
}
