use smallvec::smallvec;
use tensor_ir_coord::{CoordinateTransform, TransformError};
use tensor_ir_shape::{Dimension, PartialShape};

use crate::operator::{
    input_count_error, shape_error, Operator, OutputTypes, PortType, ValidationError,
};

/// Extract a strided sub-tensor.
///
/// Along each axis the output takes elements `lower_bounds[i]`,
/// `lower_bounds[i] + strides[i]` and so on, stopping before
/// `upper_bounds[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Slice {
    pub lower_bounds: Vec<usize>,
    pub upper_bounds: Vec<usize>,
    pub strides: Vec<usize>,
}

impl Slice {
    /// Create a slice with unit strides.
    pub fn new(lower_bounds: Vec<usize>, upper_bounds: Vec<usize>) -> Slice {
        let strides = vec![1; lower_bounds.len()];
        Slice {
            lower_bounds,
            upper_bounds,
            strides,
        }
    }

    /// Return the transform that maps output coordinates to coordinates in
    /// an input of shape `input_shape`.
    pub fn coordinate_transform(
        &self,
        input_shape: &[usize],
    ) -> Result<CoordinateTransform, TransformError> {
        CoordinateTransform::builder(input_shape)
            .start_corner(&self.lower_bounds)
            .end_corner(&self.upper_bounds)
            .strides(&self.strides)
            .build()
    }

    fn check_attrs(&self) -> Result<(), ValidationError> {
        let rank = self.lower_bounds.len();
        if self.upper_bounds.len() != rank || self.strides.len() != rank {
            return Err(ValidationError::InvalidAttribute(format!(
                "Ranks of lower bounds ({}), upper bounds ({}) and strides ({}) do not match",
                rank,
                self.upper_bounds.len(),
                self.strides.len()
            )));
        }
        for axis in 0..rank {
            if self.strides[axis] == 0 {
                return Err(ValidationError::InvalidAttribute(format!(
                    "Stride for axis {} is zero",
                    axis
                )));
            }
            if self.lower_bounds[axis] > self.upper_bounds[axis] {
                return Err(ValidationError::InvalidAttribute(format!(
                    "Lower bound for axis {} ({}) is greater than upper bound ({})",
                    axis, self.lower_bounds[axis], self.upper_bounds[axis]
                )));
            }
        }
        Ok(())
    }
}

impl Operator for Slice {
    fn name(&self) -> &'static str {
        "Slice"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        let [input] = inputs else {
            return Err(input_count_error(1, inputs));
        };
        self.check_attrs()?;

        let rank = self.lower_bounds.len();
        if let Some(input_rank) = input.shape.ndim() {
            if input_rank != rank {
                return Err(shape_error!(
                    "Input rank ({}) does not match the rank of the slice bounds ({})",
                    input_rank,
                    rank
                ));
            }
            for axis in 0..rank {
                if let Dimension::Fixed(size) = input.shape[axis] {
                    if self.upper_bounds[axis] > size {
                        return Err(shape_error!(
                            "Upper bound for axis {} ({}) exceeds input dimension ({}) (input shape: {})",
                            axis,
                            self.upper_bounds[axis],
                            size,
                            input.shape
                        ));
                    }
                }
            }
        }

        let shape = PartialShape::new((0..rank).map(|axis| {
            let len = self.upper_bounds[axis] - self.lower_bounds[axis];
            Dimension::Fixed(len.div_ceil(self.strides[axis]))
        }));

        Ok(smallvec![PortType::new(input.element_type, shape)])
    }
}

#[cfg(test)]
mod tests {
    use tensor_ir_shape::{partial_shape, PartialShape};
    use tensor_ir_testing::TestCases;

    use super::Slice;
    use crate::element::ElementType;
    use crate::operator::{Operator, PortType, ValidationErrorKind};

    #[test]
    fn test_slice_shapes() {
        #[derive(Debug)]
        struct Case {
            input: PartialShape,
            op: Slice,
            expected: Result<PartialShape, ValidationErrorKind>,
        }

        let cases = [
            Case {
                input: partial_shape![6],
                op: Slice::new(vec![2], vec![5]),
                expected: Ok(partial_shape![3]),
            },
            Case {
                input: partial_shape![6, 8],
                op: Slice {
                    lower_bounds: vec![2, 1],
                    upper_bounds: vec![5, 7],
                    strides: vec![3, 2],
                },
                expected: Ok(partial_shape![1, 3]),
            },
            Case {
                input: PartialShape::dynamic(),
                op: Slice::new(vec![0, 0], vec![4, 4]),
                expected: Ok(partial_shape![4, 4]),
            },
            Case {
                input: partial_shape![?, 8],
                op: Slice::new(vec![10, 0], vec![20, 8]),
                expected: Ok(partial_shape![10, 8]),
            },
            Case {
                input: partial_shape![6],
                op: Slice::new(vec![2], vec![7]),
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                input: partial_shape![6, 8],
                op: Slice::new(vec![2], vec![5]),
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                input: partial_shape![6],
                op: Slice::new(vec![5], vec![2]),
                expected: Err(ValidationErrorKind::Attribute),
            },
            Case {
                input: partial_shape![6],
                op: Slice {
                    lower_bounds: vec![0],
                    upper_bounds: vec![6],
                    strides: vec![0],
                },
                expected: Err(ValidationErrorKind::Attribute),
            },
        ];

        cases.test_each(|case| {
            let input = PortType::new(ElementType::F32, case.input.clone());
            let result = case
                .op
                .infer_types(&[input])
                .map(|outputs| outputs[0].shape.clone())
                .map_err(|err| err.kind());
            assert_eq!(result, case.expected);
        });
    }

    #[test]
    fn test_slice_coordinate_transform() {
        let op = Slice {
            lower_bounds: vec![1, 0],
            upper_bounds: vec![3, 6],
            strides: vec![1, 2],
        };
        let transform = op.coordinate_transform(&[4, 6]).unwrap();
        assert_eq!(transform.target_shape(), [2, 3]);

        let offsets: Vec<_> = transform
            .iter()
            .map(|coord| transform.source_offset(&coord).unwrap().unwrap())
            .collect();
        assert_eq!(offsets, [6, 8, 10, 12, 14, 16]);
    }
}
