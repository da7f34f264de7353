use std::fmt;
use std::ops::Add;

/// Size of one axis of a tensor, which may be unknown until runtime.
///
/// The derived `PartialEq` compares structure: `Dynamic == Dynamic` holds and
/// a dynamic dimension never equals a fixed one. Use
/// [`compatible`](Dimension::compatible) to ask whether two dimensions could
/// describe the same axis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// A size known when the graph is built.
    Fixed(usize),

    /// A size that is not known until runtime.
    #[default]
    Dynamic,
}

/// Number of axes in a tensor, which may be unknown.
///
/// Ranks follow the same compatibility and merge rules as dimensions.
pub type Rank = Dimension;

impl Dimension {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic)
    }

    /// Return the size, if known.
    pub fn value(&self) -> Option<usize> {
        match *self {
            Self::Fixed(size) => Some(size),
            Self::Dynamic => None,
        }
    }

    /// Return true if `self` and `other` could describe the same axis.
    ///
    /// A dynamic dimension is compatible with anything. Two fixed dimensions
    /// are compatible if they are equal.
    pub fn compatible(&self, other: &Dimension) -> bool {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => a == b,
            _ => true,
        }
    }

    /// Return true if `self` and `other` are both dynamic or both fixed with
    /// the same size.
    pub fn same_scheme(&self, other: &Dimension) -> bool {
        self == other
    }

    /// Return the most specific dimension consistent with both `a` and `b`.
    ///
    /// Returns `None` if both are fixed and differ.
    pub fn merge(a: Dimension, b: Dimension) -> Option<Dimension> {
        match (a, b) {
            (Self::Dynamic, other) | (other, Self::Dynamic) => Some(other),
            (Self::Fixed(x), Self::Fixed(y)) => (x == y).then_some(a),
        }
    }

    /// Add two dimensions, returning `None` if the sum overflows.
    ///
    /// The sum is dynamic if either side is.
    pub fn checked_add(self, rhs: Dimension) -> Option<Dimension> {
        match (self, rhs) {
            (Self::Fixed(a), Self::Fixed(b)) => a.checked_add(b).map(Self::Fixed),
            _ => Some(Self::Dynamic),
        }
    }
}

impl From<usize> for Dimension {
    fn from(size: usize) -> Self {
        Self::Fixed(size)
    }
}

impl From<Option<usize>> for Dimension {
    fn from(size: Option<usize>) -> Self {
        size.map(Self::Fixed).unwrap_or(Self::Dynamic)
    }
}

impl Add for Dimension {
    type Output = Dimension;

    /// Add two dimensions. The sum is dynamic if either side is.
    ///
    /// # Panics
    ///
    /// Panics if the sum of two fixed sizes overflows. Use
    /// [`checked_add`](Dimension::checked_add) for sizes from untrusted input.
    fn add(self, rhs: Dimension) -> Dimension {
        match self.checked_add(rhs) {
            Some(sum) => sum,
            None => panic!("dimension overflow in {} + {}", self, rhs),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(size) => write!(f, "{}", size),
            Self::Dynamic => write!(f, "?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use tensor_ir_testing::TestCases;

    use super::Dimension;

    const DYN: Dimension = Dimension::Dynamic;

    fn fixed(size: usize) -> Dimension {
        Dimension::Fixed(size)
    }

    #[test]
    fn test_merge() {
        #[derive(Debug)]
        struct Case {
            a: Dimension,
            b: Dimension,
            expected: Option<Dimension>,
        }

        let cases = [
            Case {
                a: DYN,
                b: DYN,
                expected: Some(DYN),
            },
            Case {
                a: fixed(3),
                b: DYN,
                expected: Some(fixed(3)),
            },
            Case {
                a: DYN,
                b: fixed(3),
                expected: Some(fixed(3)),
            },
            Case {
                a: fixed(3),
                b: fixed(3),
                expected: Some(fixed(3)),
            },
            Case {
                a: fixed(3),
                b: fixed(4),
                expected: None,
            },
        ];

        cases.test_each(|case| {
            assert_eq!(Dimension::merge(case.a, case.b), case.expected);
            assert_eq!(Dimension::merge(case.b, case.a), case.expected);
            assert_eq!(case.a.compatible(&case.b), case.expected.is_some());
        });
    }

    #[test]
    fn test_same_scheme() {
        assert!(DYN.same_scheme(&DYN));
        assert!(fixed(2).same_scheme(&fixed(2)));
        assert!(!fixed(2).same_scheme(&fixed(3)));
        assert!(!fixed(2).same_scheme(&DYN));
        assert!(!DYN.same_scheme(&fixed(2)));
    }

    #[test]
    fn test_add() {
        assert_eq!(fixed(2) + fixed(3), fixed(5));
        assert_eq!(fixed(2) + DYN, DYN);
        assert_eq!(DYN + fixed(3), DYN);
        assert_eq!(DYN + DYN, DYN);

        assert_eq!(fixed(2).checked_add(fixed(3)), Some(fixed(5)));
        assert_eq!(fixed(usize::MAX).checked_add(fixed(1)), None);
        assert_eq!(fixed(usize::MAX).checked_add(DYN), Some(DYN));
        assert_eq!(DYN.checked_add(fixed(usize::MAX)), Some(DYN));
    }

    #[test]
    #[should_panic(expected = "dimension overflow")]
    fn test_add_overflow_panics() {
        let _ = fixed(usize::MAX) + fixed(1);
    }

    #[test]
    fn test_value_and_display() {
        assert_eq!(fixed(7).value(), Some(7));
        assert_eq!(DYN.value(), None);
        assert!(fixed(7).is_known());
        assert!(DYN.is_dynamic());
        assert_eq!(Dimension::from(Some(4)), fixed(4));
        assert_eq!(Dimension::from(None), DYN);
        assert_eq!(fixed(7).to_string(), "7");
        assert_eq!(DYN.to_string(), "?");
    }
}
