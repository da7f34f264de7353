use smallvec::smallvec;
use tensor_ir_coord::{padded_dilated_extent, CoordinateTransform, TransformError};
use tensor_ir_shape::{Dimension, PartialShape};

use crate::operator::{
    input_count_error, shape_error, Operator, OutputTypes, PortType, TypeConstraint,
    ValidationError,
};

/// Pad a tensor with a scalar value.
///
/// The inputs are the data and a scalar padding value. Along each axis,
/// `padding_interior[i]` copies of the value are inserted between adjacent
/// elements, then `padding_below[i]` and `padding_above[i]` elements are
/// added at the edges. Edge padding may be negative, which crops the input.
#[derive(Clone, Debug, PartialEq)]
pub struct Pad {
    pub padding_below: Vec<isize>,
    pub padding_above: Vec<isize>,
    pub padding_interior: Vec<usize>,
}

impl Pad {
    /// Return the transform that maps output coordinates to coordinates in
    /// an input of shape `input_shape`.
    pub fn coordinate_transform(
        &self,
        input_shape: &[usize],
    ) -> Result<CoordinateTransform, TransformError> {
        let dilation: Vec<usize> = self
            .padding_interior
            .iter()
            .map(|n| n.saturating_add(1))
            .collect();
        CoordinateTransform::builder(input_shape)
            .padding(&self.padding_below, &self.padding_above)
            .dilation(&dilation)
            .build()
    }
}

impl Operator for Pad {
    fn name(&self) -> &'static str {
        "Pad"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        let [data, pad_value] = inputs else {
            return Err(input_count_error(2, inputs));
        };

        TypeConstraint::SameAs {
            what: "argument",
            expected: data.element_type,
        }
        .check("Padding value", pad_value.element_type)?;

        if !pad_value.shape.compatible(&PartialShape::scalar()) {
            return Err(shape_error!(
                "Argument for padding value is not a scalar (shape: {})",
                pad_value.shape
            ));
        }

        let rank = self.padding_below.len();
        if self.padding_above.len() != rank || self.padding_interior.len() != rank {
            return Err(ValidationError::InvalidAttribute(format!(
                "Ranks for padding below ({}), padding above ({}) and interior padding ({}) do not match",
                rank,
                self.padding_above.len(),
                self.padding_interior.len()
            )));
        }

        let mut shape = PartialShape::dynamic_with_rank(rank);
        if !PartialShape::merge_into(&mut shape, &data.shape) {
            return Err(shape_error!(
                "Rank for padding does not match the rank of the data argument (padding rank: {}, data shape: {})",
                rank,
                data.shape
            ));
        }

        for axis in 0..rank {
            let Dimension::Fixed(size) = shape[axis] else {
                continue;
            };
            // A saturated dilation still overflows for two or more elements,
            // and has no effect on fewer.
            let extent = padded_dilated_extent(
                size,
                self.padding_below[axis],
                self.padding_above[axis],
                self.padding_interior[axis].saturating_add(1),
            )
            .ok_or_else(|| {
                shape_error!(
                    "Padding gives a negative or oversized extent on axis {} (data shape: {})",
                    axis,
                    data.shape
                )
            })?;
            shape[axis] = Dimension::Fixed(extent);
        }

        Ok(smallvec![PortType::new(data.element_type, shape)])
    }
}
