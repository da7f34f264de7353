use smallvec::smallvec;

use crate::element::ElementType;
use crate::operator::{input_count_error, Operator, OutputTypes, PortType, ValidationError};

/// Convert the elements of a tensor to another type.
#[derive(Clone, Debug, PartialEq)]
pub struct Convert {
    pub to: ElementType,
}

impl Operator for Convert {
    fn name(&self) -> &'static str {
        "Convert"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        let [input] = inputs else {
            return Err(input_count_error(1, inputs));
        };
        Ok(smallvec![PortType::new(self.to, input.shape.clone())])
    }
}

#[cfg(test)]
mod tests {
    use tensor_ir_shape::partial_shape;

    use super::Convert;
    use crate::element::ElementType;
    use crate::operator::{Operator, PortType};

    #[test]
    fn test_convert() {
        let op = Convert {
            to: ElementType::I64,
        };
        let input = PortType::new(ElementType::F32, partial_shape![2, ?]);
        let outputs = op.infer_types(&[input]).unwrap();
        assert_eq!(
            outputs[0],
            PortType::new(ElementType::I64, partial_shape![2, ?])
        );
    }
}
