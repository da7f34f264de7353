use smallvec::smallvec;

use crate::operator::{
    input_count_error, Differentiability, Operator, OutputTypes, PortType, TypeConstraint,
    ValidationError,
};

/// Check the single input of a unary operator against `constraint` and
/// return an output of the same type and shape.
fn infer_unary_types(
    constraint: TypeConstraint,
    inputs: &[PortType],
) -> Result<OutputTypes, ValidationError> {
    let [input] = inputs else {
        return Err(input_count_error(1, inputs));
    };
    constraint.check("Argument", input.element_type)?;
    Ok(smallvec![input.clone()])
}

macro_rules! unary_op {
    ($(#[$meta:meta])* $name:ident, $constraint:expr, $differentiability:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct $name;

        impl Operator for $name {
            fn name(&self) -> &'static str {
                stringify!($name)
            }

            fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
                infer_unary_types($constraint, inputs)
            }

            fn differentiability(&self) -> Differentiability {
                $differentiability
            }
        }
    };
}

unary_op!(
    Abs,
    TypeConstraint::NotBoolean,
    Differentiability::Differentiable
);
unary_op!(
    Negative,
    TypeConstraint::NotBoolean,
    Differentiability::Differentiable
);
unary_op!(
    /// Rectified linear unit, `max(x, 0)`.
    Relu,
    TypeConstraint::NotBoolean,
    Differentiability::Differentiable
);
unary_op!(
    /// Logical negation of a boolean tensor.
    Not,
    TypeConstraint::Boolean,
    Differentiability::NonDifferentiable
);

#[cfg(test)]
mod tests {
    use tensor_ir_shape::partial_shape;

    use super::{Negative, Not, Relu};
    use crate::element::ElementType;
    use crate::operator::{Operator, PortType, ValidationErrorKind};

    #[test]
    fn test_output_matches_input() {
        let input = PortType::new(ElementType::F32, partial_shape![1, ?, 5]);
        let outputs = Relu.infer_types(&[input.clone()]).unwrap();
        assert_eq!(outputs.as_slice(), [input]);
    }

    #[test]
    fn test_type_constraints() {
        let boolean = PortType::new(ElementType::Boolean, partial_shape![3]);
        let float = PortType::new(ElementType::F32, partial_shape![3]);

        let err = Negative.infer_types(&[boolean.clone()]).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::Type);
        assert_eq!(
            err.to_string(),
            "Argument element type (boolean) must not be boolean"
        );

        assert!(Not.infer_types(&[boolean]).is_ok());
        assert_eq!(
            Not.infer_types(&[float]).unwrap_err().kind(),
            ValidationErrorKind::Type
        );
    }

    #[test]
    fn test_input_count() {
        let err = Relu.infer_types(&[]).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::Arity);
    }
}
