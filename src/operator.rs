//! The [`Operator`] trait implemented by every operator, and the errors
//! reported when an operator's inputs are invalid.

use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display};

use smallvec::SmallVec;
use tensor_ir_shape::PartialShape;

use crate::element::ElementType;

/// Element type and shape of an operator input or output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PortType {
    pub element_type: ElementType,
    pub shape: PartialShape,
}

impl PortType {
    pub fn new(element_type: ElementType, shape: PartialShape) -> PortType {
        PortType {
            element_type,
            shape,
        }
    }
}

impl Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.element_type, self.shape)
    }
}

/// Types of an operator's outputs, in port order.
pub type OutputTypes = SmallVec<[PortType; 1]>;

/// Whether, and how, gradients propagate through an operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Differentiability {
    /// The operator has a gradient with respect to its inputs.
    Differentiable,

    /// The operator's outputs do not depend smoothly on its inputs, so it
    /// contributes no gradient.
    NonDifferentiable,

    /// The operator can only be used in forward (inference) graphs.
    ForwardOnly,
}

/// Outcome of a successful request for an operator's adjoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdjointKind {
    /// The operator has a gradient rule.
    Defined,

    /// The operator contributes no gradient.
    None,
}

/// An operation was requested that the operator does not support.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsupportedError {
    pub op: &'static str,
    pub operation: &'static str,
}

impl Display for UnsupportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is not supported by {}: forward-propagation-only operation",
            self.operation, self.op
        )
    }
}

impl Error for UnsupportedError {}

/// A requirement on the element type of an operator input or output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeConstraint {
    Quantized,
    Real,
    Boolean,
    NotBoolean,
    Static,
    OneOf(&'static [ElementType]),

    /// The type must match that of another input or attribute.
    SameAs {
        what: &'static str,
        expected: ElementType,
    },
}

impl Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quantized => write!(f, "must be a quantized type"),
            Self::Real => write!(f, "must be a floating point type"),
            Self::Boolean => write!(f, "must be boolean"),
            Self::NotBoolean => write!(f, "must not be boolean"),
            Self::Static => write!(f, "must be static"),
            Self::OneOf(types) => {
                write!(f, "must be one of ")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                Ok(())
            }
            Self::SameAs { what, expected } => {
                write!(f, "must match {} element type ({})", what, expected)
            }
        }
    }
}

impl TypeConstraint {
    /// Check `actual` against this constraint.
    ///
    /// A dynamic type satisfies every constraint except
    /// [`Static`](TypeConstraint::Static), since it may resolve to a valid
    /// type at runtime.
    pub fn check(&self, what: &'static str, actual: ElementType) -> Result<(), ValidationError> {
        let ok = match self {
            Self::Static => actual.is_static(),
            _ if actual.is_dynamic() => true,
            Self::Quantized => actual.is_quantized(),
            Self::Real => actual.is_real(),
            Self::Boolean => actual == ElementType::Boolean,
            Self::NotBoolean => actual != ElementType::Boolean,
            Self::OneOf(types) => types.contains(&actual),
            Self::SameAs { expected, .. } => ElementType::merge(*expected, actual).is_some(),
        };
        if ok {
            Ok(())
        } else {
            Err(ValidationError::ElementType {
                what,
                constraint: self.clone(),
                actual,
            })
        }
    }
}

/// Category of a [`ValidationError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The operator received the wrong number of inputs.
    Arity,

    /// An element type constraint was violated.
    Type,

    /// A shape constraint was violated.
    Shape,

    /// An attribute has an invalid value.
    Attribute,
}

/// Error when an operator's inputs or attributes are invalid.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationError {
    /// The number of inputs is wrong. `expected` is the minimum count for
    /// variadic operators.
    InputCount { expected: usize, actual: usize },

    ElementType {
        /// Description of the input or output, eg. "Input" or "Scale".
        what: &'static str,
        constraint: TypeConstraint,
        actual: ElementType,
    },

    /// Shapes are inconsistent. The message includes the shapes involved.
    Shape(String),

    AxisOutOfBounds {
        /// Role of the axis, eg. "Concatenation" or "Reduction".
        what: &'static str,
        axis: usize,
        rank: usize,
    },

    InvalidAttribute(String),
}

impl ValidationError {
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            Self::InputCount { .. } => ValidationErrorKind::Arity,
            Self::ElementType { .. } => ValidationErrorKind::Type,
            Self::Shape(_) | Self::AxisOutOfBounds { .. } => ValidationErrorKind::Shape,
            Self::InvalidAttribute(_) => ValidationErrorKind::Attribute,
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputCount { expected, actual } => {
                write!(f, "expected {} inputs but got {}", expected, actual)
            }
            Self::ElementType {
                what,
                constraint,
                actual,
            } => write!(f, "{} element type ({}) {}", what, actual, constraint),
            Self::Shape(msg) => write!(f, "{}", msg),
            Self::AxisOutOfBounds { what, axis, rank } => write!(
                f,
                "{} axis ({}) is out of bounds (input has rank {})",
                what, axis, rank
            ),
            Self::InvalidAttribute(msg) => write!(f, "invalid attribute: {}", msg),
        }
    }
}

impl Error for ValidationError {}

/// Create a [`ValidationError::Shape`] error from a format string.
macro_rules! shape_error {
    ($($arg:tt)*) => {
        $crate::operator::ValidationError::Shape(format!($($arg)*))
    };
}

pub(crate) use shape_error;

/// Return the error for an operator that received `inputs.len()` inputs
/// instead of `expected`.
pub(crate) fn input_count_error(expected: usize, inputs: &[PortType]) -> ValidationError {
    ValidationError::InputCount {
        expected,
        actual: inputs.len(),
    }
}

/// Merge the element types of `inputs`, failing if two are different static
/// types.
pub(crate) fn merge_element_types(inputs: &[&PortType]) -> Result<ElementType, ValidationError> {
    let mut merged = ElementType::Dynamic;
    for input in inputs {
        merged = ElementType::merge(merged, input.element_type).ok_or(
            ValidationError::ElementType {
                what: "Argument",
                constraint: TypeConstraint::SameAs {
                    what: "other argument",
                    expected: merged,
                },
                actual: input.element_type,
            },
        )?;
    }
    Ok(merged)
}

/// Check that `axis` is less than `shape`'s rank, if the rank is known.
pub(crate) fn check_axis(
    what: &'static str,
    axis: usize,
    shape: &PartialShape,
) -> Result<(), ValidationError> {
    match shape.ndim() {
        Some(rank) if axis >= rank => Err(ValidationError::AxisOutOfBounds { what, axis, rank }),
        _ => Ok(()),
    }
}

/// Shared contract implemented by every operator.
///
/// Operators are validated once, when they are added to a graph, by
/// [`infer_types`](Operator::infer_types). This checks the number and types
/// of inputs and computes the types of the outputs. The number of outputs
/// returned is fixed for a given operator and its attributes.
pub trait Operator: Debug {
    /// Return the operator type name, eg. "Add".
    fn name(&self) -> &'static str;

    /// Check the operator's inputs and compute its output types.
    ///
    /// Input and output shapes may be partially known. Constraints that
    /// involve unknown dimensions or types are assumed to hold.
    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError>;

    fn differentiability(&self) -> Differentiability {
        Differentiability::Differentiable
    }

    /// Request the operator's backward adjoint.
    ///
    /// This fails for operators which only support forward execution.
    fn generate_adjoints(&self) -> Result<AdjointKind, UnsupportedError> {
        match self.differentiability() {
            Differentiability::Differentiable => Ok(AdjointKind::Defined),
            Differentiability::NonDifferentiable => Ok(AdjointKind::None),
            Differentiability::ForwardOnly => Err(UnsupportedError {
                op: self.name(),
                operation: "adjoint generation",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use tensor_ir_shape::partial_shape;
    use tensor_ir_testing::TestCases;

    use super::{check_axis, merge_element_types, PortType, TypeConstraint, ValidationError};
    use crate::element::ElementType;

    #[test]
    fn test_type_constraint_check() {
        #[derive(Debug)]
        struct Case {
            constraint: TypeConstraint,
            actual: ElementType,
            ok: bool,
        }

        let cases = [
            Case {
                constraint: TypeConstraint::Quantized,
                actual: ElementType::U8,
                ok: true,
            },
            Case {
                constraint: TypeConstraint::Quantized,
                actual: ElementType::F32,
                ok: false,
            },
            Case {
                constraint: TypeConstraint::Quantized,
                actual: ElementType::Dynamic,
                ok: true,
            },
            Case {
                constraint: TypeConstraint::Static,
                actual: ElementType::Dynamic,
                ok: false,
            },
            Case {
                constraint: TypeConstraint::OneOf(&[ElementType::I32, ElementType::I64]),
                actual: ElementType::I64,
                ok: true,
            },
            Case {
                constraint: TypeConstraint::SameAs {
                    what: "Input",
                    expected: ElementType::I8,
                },
                actual: ElementType::U8,
                ok: false,
            },
        ];

        cases.test_each(|case| {
            let result = case.constraint.check("Input", case.actual);
            assert_eq!(result.is_ok(), case.ok);
        });
    }

    #[test]
    fn test_error_messages() {
        let err = TypeConstraint::Quantized
            .check("Input", ElementType::F32)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Input element type (f32) must be a quantized type"
        );

        let err = TypeConstraint::OneOf(&[ElementType::I32, ElementType::I64])
            .check("Index", ElementType::F32)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Index element type (f32) must be one of i32, i64"
        );

        let err = check_axis("Reduction", 2, &partial_shape![2, 3]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Reduction axis (2) is out of bounds (input has rank 2)"
        );
    }

    #[test]
    fn test_merge_element_types() {
        let a = PortType::new(ElementType::Dynamic, partial_shape![1]);
        let b = PortType::new(ElementType::F32, partial_shape![1]);
        let c = PortType::new(ElementType::I32, partial_shape![1]);

        assert_eq!(merge_element_types(&[&a, &b]), Ok(ElementType::F32));
        assert!(matches!(
            merge_element_types(&[&a, &b, &c]),
            Err(ValidationError::ElementType { .. })
        ));
    }
}
