use std::iter::FusedIterator;

use smallvec::smallvec;

use crate::transform::Coordinate;

/// Iterator over the coordinates of a [`CoordinateTransform`]'s target
/// space, in row-major order.
///
/// A zero-rank space yields a single empty coordinate.
///
/// [`CoordinateTransform`]: crate::CoordinateTransform
#[derive(Clone, Debug)]
pub struct Coordinates {
    /// Exclusive upper bound of each axis.
    shape: Coordinate,

    next: Option<Coordinate>,

    /// Number of coordinates not yet returned.
    remaining: usize,
}

impl Coordinates {
    pub(crate) fn from_shape(shape: &[usize]) -> Coordinates {
        let remaining = shape
            .iter()
            .fold(1usize, |count, &size| count.saturating_mul(size));
        Coordinates {
            shape: shape.into(),
            next: (remaining > 0).then(|| smallvec![0; shape.len()]),
            remaining,
        }
    }
}

impl Iterator for Coordinates {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        let current = self.next.take()?;
        self.remaining -= 1;

        let mut next = current.clone();
        for (index, &size) in next.iter_mut().zip(self.shape.iter()).rev() {
            *index += 1;
            if *index < size {
                self.next = Some(next);
                return Some(current);
            }
            *index = 0;
        }

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Coordinates {}

impl FusedIterator for Coordinates {}
