use smallvec::smallvec;
use tensor_ir_shape::{Dimension, PartialShape};

use crate::operator::{
    check_axis, input_count_error, merge_element_types, shape_error, Operator, OutputTypes,
    PortType, ValidationError,
};

/// Concatenate tensors along an axis.
///
/// All inputs must have the same element type and rank, and equal
/// dimensions on every axis except `axis`. The output dimension along
/// `axis` is the sum of the inputs' dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct Concat {
    pub axis: usize,
}

impl Operator for Concat {
    fn name(&self) -> &'static str {
        "Concat"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        if inputs.is_empty() {
            return Err(input_count_error(1, inputs));
        }

        let element_type = merge_element_types(&inputs.iter().collect::<Vec<_>>())?;

        // Shape of the inputs with the concatenation axis masked out.
        let mut scheme = PartialShape::dynamic();
        let mut axis_size = Dimension::Fixed(0);

        for input in inputs {
            if input.shape.rank_is_static() {
                check_axis("Concatenation", self.axis, &input.shape)?;
                axis_size = axis_size
                    .checked_add(input.shape[self.axis])
                    .ok_or_else(|| {
                        shape_error!(
                            "Concatenation axis (axis {}) size overflows",
                            self.axis
                        )
                    })?;

                let mut masked = input.shape.clone();
                masked[self.axis] = Dimension::Dynamic;
                if !PartialShape::merge_into(&mut scheme, &masked) {
                    return Err(shape_error!(
                        "Argument shapes are inconsistent; they must have the same rank, and must have equal dimension everywhere except on the concatenation axis (axis {})",
                        self.axis
                    ));
                }
            } else {
                axis_size = Dimension::Dynamic;
            }
        }

        if scheme.rank_is_static() {
            scheme[self.axis] = axis_size;
        }

        Ok(smallvec![PortType::new(element_type, scheme)])
    }
}

#[cfg(test)]
mod tests {
    use tensor_ir_shape::{partial_shape, PartialShape};
    use tensor_ir_testing::TestCases;

    use super::Concat;
    use crate::element::ElementType;
    use crate::operator::{Operator, PortType, ValidationError, ValidationErrorKind};

    #[test]
    fn test_concat_shapes() {
        #[derive(Debug)]
        struct Case {
            axis: usize,
            inputs: Vec<PartialShape>,
            expected: Result<PartialShape, ValidationErrorKind>,
        }

        let cases = [
            Case {
                axis: 1,
                inputs: vec![
                    partial_shape![2, 3, 4],
                    partial_shape![2, 7, 4],
                    partial_shape![2, 2, 4],
                ],
                expected: Ok(partial_shape![2, 12, 4]),
            },
            Case {
                axis: 1,
                inputs: vec![partial_shape![2, ?, 4], partial_shape![?, 7, 4]],
                expected: Ok(partial_shape![2, ?, 4]),
            },
            Case {
                axis: 0,
                inputs: vec![PartialShape::dynamic(), partial_shape![3, 5]],
                expected: Ok(partial_shape![?, 5]),
            },
            Case {
                axis: 0,
                inputs: vec![PartialShape::dynamic(), PartialShape::dynamic()],
                expected: Ok(PartialShape::dynamic()),
            },
            Case {
                axis: 1,
                inputs: vec![partial_shape![2, 3, 4], partial_shape![2, 7, 5]],
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                axis: 0,
                inputs: vec![partial_shape![2, 3], partial_shape![2, 3, 4]],
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                axis: 3,
                inputs: vec![partial_shape![2, 3, 4]],
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                axis: 0,
                inputs: vec![],
                expected: Err(ValidationErrorKind::Arity),
            },
            Case {
                axis: 1,
                inputs: vec![partial_shape![2, (usize::MAX)], partial_shape![2, 1]],
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                axis: 1,
                inputs: vec![partial_shape![2, (usize::MAX)], partial_shape![2, ?]],
                expected: Ok(partial_shape![2, ?]),
            },
        ];

        cases.test_each(|case| {
            let op = Concat { axis: case.axis };
            let inputs: Vec<_> = case
                .inputs
                .iter()
                .map(|shape| PortType::new(ElementType::F32, shape.clone()))
                .collect();
            let result = op
                .infer_types(&inputs)
                .map(|outputs| outputs[0].shape.clone())
                .map_err(|err| err.kind());
            assert_eq!(result, case.expected);
        });
    }

    #[test]
    fn test_concat_element_types() {
        let op = Concat { axis: 0 };
        let inputs = [
            PortType::new(ElementType::F32, partial_shape![2]),
            PortType::new(ElementType::I32, partial_shape![2]),
        ];
        let err = op.infer_types(&inputs).unwrap_err();
        assert!(matches!(err, ValidationError::ElementType { .. }));
    }

    #[test]
    fn test_axis_out_of_bounds() {
        let op = Concat { axis: 3 };
        let inputs = [PortType::new(ElementType::F32, partial_shape![2, 3, 4])];
        let err = op.infer_types(&inputs).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Concatenation axis (3) is out of bounds (input has rank 3)"
        );
    }
}
