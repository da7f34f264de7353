use smallvec::smallvec;
use tensor_ir_shape::{PartialShape, Shape};

use crate::element::ElementType;
use crate::operator::{
    input_count_error, shape_error, Differentiability, Operator, OutputTypes, PortType,
    TypeConstraint, ValidationError,
};

/// Generate a random mask, eg. for dropout.
///
/// Each element of the output is one with the given `probability` and zero
/// otherwise. The single input is a scalar flag indicating whether the
/// graph is being run for training.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateMask {
    pub shape: Shape,
    pub element_type: ElementType,
    pub seed: u32,
    pub probability: f64,
}

impl Operator for GenerateMask {
    fn name(&self) -> &'static str {
        "GenerateMask"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        let [training] = inputs else {
            return Err(input_count_error(1, inputs));
        };

        if !(0.0..=1.0).contains(&self.probability) {
            return Err(ValidationError::InvalidAttribute(format!(
                "Probability ({}) must be in the range [0, 1]",
                self.probability
            )));
        }
        TypeConstraint::Static.check("Output", self.element_type)?;

        if !training.shape.compatible(&PartialShape::scalar()) {
            return Err(shape_error!(
                "Training flag must be a scalar (shape: {})",
                training.shape
            ));
        }

        Ok(smallvec![PortType::new(
            self.element_type,
            PartialShape::from(&self.shape)
        )])
    }

    fn differentiability(&self) -> Differentiability {
        Differentiability::NonDifferentiable
    }
}
