use smallvec::smallvec;
use tensor_ir_shape::{AxisSet, Dimension};

use crate::element::ElementType;
use crate::operator::{
    check_axis, input_count_error, shape_error, Differentiability, Operator, OutputTypes,
    PortType, TypeConstraint, ValidationError,
};

/// Sum the elements of a tensor along a set of axes, removing them from the
/// output shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Sum {
    pub axes: AxisSet,
}

impl Operator for Sum {
    fn name(&self) -> &'static str {
        "Sum"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        let [input] = inputs else {
            return Err(input_count_error(1, inputs));
        };
        for axis in self.axes.iter() {
            check_axis("Reduction", axis, &input.shape)?;
        }
        Ok(smallvec![PortType::new(
            input.element_type,
            input.shape.reduce(&self.axes)
        )])
    }
}

/// Find the `k` largest or smallest elements along an axis.
///
/// Produces two outputs: the indices of the selected elements, with type
/// `index_element_type`, and their values. A `k` of zero selects every
/// element along the axis.
#[derive(Clone, Debug, PartialEq)]
pub struct TopK {
    pub axis: usize,
    pub k: usize,
    pub index_element_type: ElementType,

    /// Select the largest elements if true, or the smallest otherwise.
    pub compute_max: bool,
}

impl Operator for TopK {
    fn name(&self) -> &'static str {
        "TopK"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        let [input] = inputs else {
            return Err(input_count_error(1, inputs));
        };

        TypeConstraint::OneOf(&[ElementType::I32, ElementType::I64])
            .check("Index", self.index_element_type)?;

        let mut shape = input.shape.clone();
        if let Some(rank) = shape.ndim() {
            if rank == 0 {
                return Err(shape_error!("Input tensor's rank must be greater than 0"));
            }
            check_axis("TopK", self.axis, &shape)?;

            if let Dimension::Fixed(size) = shape[self.axis] {
                if self.k > size {
                    return Err(shape_error!(
                        "K ({}) exceeds the length of the TopK axis ({})",
                        self.k,
                        size
                    ));
                }
            }
            if self.k != 0 {
                shape[self.axis] = Dimension::Fixed(self.k);
            }
        }

        Ok(smallvec![
            PortType::new(self.index_element_type, shape.clone()),
            PortType::new(input.element_type, shape),
        ])
    }

    fn differentiability(&self) -> Differentiability {
        Differentiability::ForwardOnly
    }
}
