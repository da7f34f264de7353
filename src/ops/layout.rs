use smallvec::smallvec;
use tensor_ir_shape::AxisSet;

use crate::operator::{check_axis, input_count_error, Operator, OutputTypes, PortType, ValidationError};

/// Reverse the order of elements along a set of axes.
#[derive(Clone, Debug, PartialEq)]
pub struct Reverse {
    pub axes: AxisSet,
}

impl Operator for Reverse {
    fn name(&self) -> &'static str {
        "Reverse"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        let [input] = inputs else {
            return Err(input_count_error(1, inputs));
        };
        for axis in self.axes.iter() {
            check_axis("Reverse", axis, &input.shape)?;
        }
        Ok(smallvec![input.clone()])
    }
}

#[cfg(test)]
mod tests {
    use tensor_ir_shape::{partial_shape, AxisSet, PartialShape};

    use super::Reverse;
    use crate::element::ElementType;
    use crate::operator::{Operator, PortType, ValidationError};

    #[test]
    fn test_reverse() {
        let op = Reverse {
            axes: AxisSet::from([0, 2]),
        };

        let input = PortType::new(ElementType::F32, partial_shape![5, ?, 7]);
        let outputs = op.infer_types(&[input.clone()]).unwrap();
        assert_eq!(outputs[0], input);

        // Axes can't be checked until the rank is known.
        let input = PortType::new(ElementType::F32, PartialShape::dynamic());
        assert!(op.infer_types(&[input]).is_ok());

        let input = PortType::new(ElementType::F32, partial_shape![5, 6]);
        assert_eq!(
            op.infer_types(&[input]),
            Err(ValidationError::AxisOutOfBounds {
                what: "Reverse",
                axis: 2,
                rank: 2
            })
        );
    }
}
