use smallvec::smallvec;
use tensor_ir_shape::PartialShape;

use crate::element::ElementType;
use crate::operator::{
    input_count_error, merge_element_types, shape_error, Differentiability, Operator,
    OutputTypes, PortType, TypeConstraint, ValidationError,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BinaryKind {
    /// Numeric operation whose output has the input type.
    Arithmetic,

    /// Comparison producing a boolean output.
    Comparison,

    /// Operation on boolean inputs.
    Logical,
}

/// Merge the shapes of two same-shaped operands.
pub(crate) fn merge_argument_shapes(
    lhs: &PartialShape,
    rhs: &PartialShape,
) -> Result<PartialShape, ValidationError> {
    PartialShape::merge(lhs, rhs)
        .ok_or_else(|| shape_error!("Argument shapes are inconsistent ({} vs {})", lhs, rhs))
}

fn infer_binary_types(
    kind: BinaryKind,
    inputs: &[PortType],
) -> Result<OutputTypes, ValidationError> {
    let [lhs, rhs] = inputs else {
        return Err(input_count_error(2, inputs));
    };

    let element_type = match kind {
        BinaryKind::Arithmetic => {
            let merged = merge_element_types(&[lhs, rhs])?;
            TypeConstraint::NotBoolean.check("Argument", merged)?;
            merged
        }
        BinaryKind::Comparison => {
            merge_element_types(&[lhs, rhs])?;
            ElementType::Boolean
        }
        BinaryKind::Logical => {
            TypeConstraint::Boolean.check("Argument", lhs.element_type)?;
            TypeConstraint::Boolean.check("Argument", rhs.element_type)?;
            ElementType::Boolean
        }
    };
    let shape = merge_argument_shapes(&lhs.shape, &rhs.shape)?;

    Ok(smallvec![PortType::new(element_type, shape)])
}

macro_rules! binary_op {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct $name;

        impl Operator for $name {
            fn name(&self) -> &'static str {
                stringify!($name)
            }

            fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
                infer_binary_types($kind, inputs)
            }

            fn differentiability(&self) -> Differentiability {
                match $kind {
                    BinaryKind::Arithmetic => Differentiability::Differentiable,
                    BinaryKind::Comparison | BinaryKind::Logical => {
                        Differentiability::NonDifferentiable
                    }
                }
            }
        }
    };
}

binary_op!(
    /// Elementwise addition.
    Add,
    BinaryKind::Arithmetic
);
binary_op!(Subtract, BinaryKind::Arithmetic);
binary_op!(Multiply, BinaryKind::Arithmetic);
binary_op!(Divide, BinaryKind::Arithmetic);
binary_op!(
    /// Elementwise equality test, producing a boolean tensor.
    Equal,
    BinaryKind::Comparison
);
binary_op!(Greater, BinaryKind::Comparison);
binary_op!(Less, BinaryKind::Comparison);
binary_op!(
    /// Elementwise logical AND of two boolean tensors.
    And,
    BinaryKind::Logical
);
binary_op!(Or, BinaryKind::Logical);

#[cfg(test)]
mod tests {
    use tensor_ir_shape::{partial_shape, PartialShape};
    use tensor_ir_testing::TestCases;

    use super::{Add, And, Greater};
    use crate::element::ElementType;
    use crate::operator::{Operator, PortType, ValidationError, ValidationErrorKind};

    #[test]
    fn test_arithmetic_types() {
        #[derive(Debug)]
        struct Case {
            lhs: PortType,
            rhs: PortType,
            expected: Result<PortType, ValidationErrorKind>,
        }

        let cases = [
            Case {
                lhs: PortType::new(ElementType::F32, partial_shape![2, 4]),
                rhs: PortType::new(ElementType::F32, partial_shape![2, 4]),
                expected: Ok(PortType::new(ElementType::F32, partial_shape![2, 4])),
            },
            // Dynamic type and dims are refined by the other operand.
            Case {
                lhs: PortType::new(ElementType::Dynamic, partial_shape![2, ?]),
                rhs: PortType::new(ElementType::I32, partial_shape![?, 4]),
                expected: Ok(PortType::new(ElementType::I32, partial_shape![2, 4])),
            },
            Case {
                lhs: PortType::new(ElementType::F32, PartialShape::dynamic()),
                rhs: PortType::new(ElementType::F32, partial_shape![3]),
                expected: Ok(PortType::new(ElementType::F32, partial_shape![3])),
            },
            Case {
                lhs: PortType::new(ElementType::F32, partial_shape![2, 4]),
                rhs: PortType::new(ElementType::I32, partial_shape![2, 4]),
                expected: Err(ValidationErrorKind::Type),
            },
            Case {
                lhs: PortType::new(ElementType::Boolean, partial_shape![2]),
                rhs: PortType::new(ElementType::Boolean, partial_shape![2]),
                expected: Err(ValidationErrorKind::Type),
            },
            Case {
                lhs: PortType::new(ElementType::F32, partial_shape![2, 4]),
                rhs: PortType::new(ElementType::F32, partial_shape![2, 5]),
                expected: Err(ValidationErrorKind::Shape),
            },
        ];

        cases.test_each(|case| {
            let result = Add
                .infer_types(&[case.lhs.clone(), case.rhs.clone()])
                .map(|outputs| outputs[0].clone())
                .map_err(|err| err.kind());
            assert_eq!(result, case.expected);
        });
    }

    #[test]
    fn test_comparison_output_is_boolean() {
        let inputs = [
            PortType::new(ElementType::I64, partial_shape![3]),
            PortType::new(ElementType::I64, partial_shape![3]),
        ];
        let outputs = Greater.infer_types(&inputs).unwrap();
        assert_eq!(
            outputs[0],
            PortType::new(ElementType::Boolean, partial_shape![3])
        );
    }

    #[test]
    fn test_logical_requires_boolean() {
        let inputs = [
            PortType::new(ElementType::Boolean, partial_shape![3]),
            PortType::new(ElementType::Dynamic, partial_shape![3]),
        ];
        assert!(And.infer_types(&inputs).is_ok());

        let inputs = [
            PortType::new(ElementType::Boolean, partial_shape![3]),
            PortType::new(ElementType::F32, partial_shape![3]),
        ];
        let err = And.infer_types(&inputs).unwrap_err();
        assert_eq!(err.to_string(), "Argument element type (f32) must be boolean");
    }

    #[test]
    fn test_shape_mismatch_message() {
        let inputs = [
            PortType::new(ElementType::F32, partial_shape![2, 4]),
            PortType::new(ElementType::F32, partial_shape![2, 5]),
        ];
        let err = Add.infer_types(&inputs).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Shape("Argument shapes are inconsistent ({2,4} vs {2,5})".into())
        );
    }

    #[test]
    fn test_input_count() {
        let inputs = [PortType::new(ElementType::F32, partial_shape![2])];
        let err = Add.infer_types(&inputs).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InputCount {
                expected: 2,
                actual: 1
            }
        );
    }
}
