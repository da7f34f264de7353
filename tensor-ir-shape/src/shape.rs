use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;

use smallvec::SmallVec;

/// Write `items` as `{a,b,c}`.
pub(crate) fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
) -> fmt::Result {
    write!(f, "{{")?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "}}")
}

/// Shape of a tensor whose rank and dimension sizes are all known.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape(SmallVec<[usize; 4]>);

impl Shape {
    pub fn new(dims: &[usize]) -> Shape {
        Shape(dims.into())
    }

    /// Return the shape of a scalar.
    pub fn scalar() -> Shape {
        Shape(SmallVec::new())
    }

    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Return the number of elements in a tensor of this shape.
    ///
    /// This is 1 for a scalar. Returns `None` if the count overflows
    /// `usize`.
    pub fn num_elements(&self) -> Option<usize> {
        if self.0.contains(&0) {
            return Some(0);
        }
        self.0.iter().try_fold(1usize, |count, &size| count.checked_mul(size))
    }

    /// Keep only the axes in `axes`.
    ///
    /// Axes beyond the rank of the shape are ignored.
    pub fn project(&self, axes: &AxisSet) -> Shape {
        self.0
            .iter()
            .enumerate()
            .filter(|(axis, _)| axes.contains(*axis))
            .map(|(_, size)| *size)
            .collect()
    }

    /// Remove the axes in `axes`.
    pub fn reduce(&self, axes: &AxisSet) -> Shape {
        self.0
            .iter()
            .enumerate()
            .filter(|(axis, _)| !axes.contains(*axis))
            .map(|(_, size)| *size)
            .collect()
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Shape {
        Shape::new(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Shape {
        Shape(dims.into())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Shape {
        Shape::new(&dims)
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Shape {
        Shape(iter.into_iter().collect())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self.0.iter())
    }
}

/// Ordered set of axis indices, such as the axes of a reduction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AxisSet(BTreeSet<usize>);

impl AxisSet {
    pub fn new() -> AxisSet {
        AxisSet(BTreeSet::new())
    }

    pub fn contains(&self, axis: usize) -> bool {
        self.0.contains(&axis)
    }

    pub fn insert(&mut self, axis: usize) -> bool {
        self.0.insert(axis)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the largest axis in the set.
    pub fn max(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Iterate over the axes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for AxisSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> AxisSet {
        AxisSet(iter.into_iter().collect())
    }
}

impl From<&[usize]> for AxisSet {
    fn from(axes: &[usize]) -> AxisSet {
        axes.iter().copied().collect()
    }
}

impl<const N: usize> From<[usize; N]> for AxisSet {
    fn from(axes: [usize; N]) -> AxisSet {
        axes.into_iter().collect()
    }
}

impl fmt::Display for AxisSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self.0.iter())
    }
}

#[cfg(test)]
mod tests {
    use tensor_ir_testing::TestCases;

    use super::{AxisSet, Shape};

    #[test]
    fn test_project_and_reduce() {
        #[derive(Debug)]
        struct Case {
            shape: Shape,
            axes: AxisSet,
            projected: Shape,
            reduced: Shape,
        }

        let cases = [
            Case {
                shape: [2, 3, 4].into(),
                axes: [1].into(),
                projected: [3].into(),
                reduced: [2, 4].into(),
            },
            Case {
                shape: [2, 3, 4].into(),
                axes: AxisSet::new(),
                projected: Shape::scalar(),
                reduced: [2, 3, 4].into(),
            },
            Case {
                shape: [2, 3, 4].into(),
                axes: [0, 2].into(),
                projected: [2, 4].into(),
                reduced: [3].into(),
            },
        ];

        cases.test_each(|case| {
            assert_eq!(case.shape.project(&case.axes), case.projected);
            assert_eq!(case.shape.reduce(&case.axes), case.reduced);
        });
    }

    #[test]
    fn test_num_elements() {
        #[derive(Debug)]
        struct Case {
            shape: Shape,
            expected: Option<usize>,
        }

        let cases = [
            Case {
                shape: Shape::scalar(),
                expected: Some(1),
            },
            Case {
                shape: [2, 3, 4].into(),
                expected: Some(24),
            },
            Case {
                shape: [2, 0, 4].into(),
                expected: Some(0),
            },
            Case {
                shape: [usize::MAX, 2].into(),
                expected: None,
            },
            Case {
                shape: [usize::MAX, 2, 0].into(),
                expected: Some(0),
            },
        ];

        cases.test_each(|case| {
            assert_eq!(case.shape.num_elements(), case.expected);
        });
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::from([2, 3]).to_string(), "{2,3}");
        assert_eq!(Shape::scalar().to_string(), "{}");
        assert_eq!(AxisSet::from([2, 0, 2]).to_string(), "{0,2}");
    }
}
