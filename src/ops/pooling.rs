use smallvec::smallvec;
use tensor_ir_shape::{Dimension, PartialShape};

use crate::operator::{
    input_count_error, shape_error, Operator, OutputTypes, PortType, ValidationError,
};

/// Window and padding settings shared by pooling operators.
struct PoolWindow<'a> {
    window_shape: &'a [usize],
    strides: &'a [usize],
    padding_below: &'a [usize],
    padding_above: &'a [usize],

    /// Whether a window may lie entirely within the padding region.
    allow_all_padding: bool,
}

impl PoolWindow<'_> {
    fn check_attrs(&self) -> Result<(), ValidationError> {
        let spatial_rank = self.window_shape.len();
        if self.strides.len() != spatial_rank
            || self.padding_below.len() != spatial_rank
            || self.padding_above.len() != spatial_rank
        {
            return Err(ValidationError::InvalidAttribute(format!(
                "Ranks for window shape ({}), strides ({}), padding below ({}) and padding above ({}) do not match",
                spatial_rank,
                self.strides.len(),
                self.padding_below.len(),
                self.padding_above.len()
            )));
        }
        if let Some(axis) = self.strides.iter().position(|&s| s == 0) {
            return Err(ValidationError::InvalidAttribute(format!(
                "Window stride for spatial dimension {} is zero",
                axis
            )));
        }
        Ok(())
    }

    /// Compute the output shape of a pooling operation over a batch of
    /// shape `[N, C, spatial...]`.
    fn output_shape(&self, data: &PartialShape) -> Result<PartialShape, ValidationError> {
        self.check_attrs()?;

        let spatial_rank = self.window_shape.len();
        if spatial_rank == 0 {
            return Err(ValidationError::InvalidAttribute(
                "Window shape must have at least one spatial dimension".to_string(),
            ));
        }

        let mut shape = PartialShape::dynamic_with_rank(spatial_rank + 2);
        if !PartialShape::merge_into(&mut shape, data) {
            return Err(shape_error!(
                "Data batch shape ({}) does not have rank {} (one batch axis, one channel axis and {} spatial dimensions)",
                data,
                spatial_rank + 2,
                spatial_rank
            ));
        }

        if shape[0] == Dimension::Fixed(0) {
            return Err(shape_error!("Batch size is zero (data shape: {})", data));
        }
        if shape[1] == Dimension::Fixed(0) {
            return Err(shape_error!("Channel count is zero (data shape: {})", data));
        }

        for i in 0..spatial_rank {
            let window = self.window_shape[i];
            let below = self.padding_below[i];
            let above = self.padding_above[i];

            if window == 0 {
                return Err(shape_error!(
                    "Window shape dimension {} has zero length (window shape: {:?})",
                    i,
                    self.window_shape
                ));
            }
            if !self.allow_all_padding && (window <= below || window <= above) {
                return Err(shape_error!(
                    "Window will sometimes reside entirely within the padding region, but padding is not included in the computation (window shape: {:?}, padding below: {:?}, padding above: {:?})",
                    self.window_shape,
                    self.padding_below,
                    self.padding_above
                ));
            }

            let axis = i + 2;
            let Dimension::Fixed(size) = shape[axis] else {
                continue;
            };
            let Some(padded) = size
                .checked_add(below)
                .and_then(|padded| padded.checked_add(above))
            else {
                return Err(shape_error!(
                    "Data input spatial dimension {} overflows after padding (data shape: {}, padding below: {:?}, padding above: {:?})",
                    i,
                    data,
                    self.padding_below,
                    self.padding_above
                ));
            };
            if padded == 0 {
                return Err(shape_error!(
                    "Data input spatial dimension {} has zero length even after padding (data shape: {})",
                    i,
                    data
                ));
            }
            if window > padded {
                return Err(shape_error!(
                    "Window shape after padding is larger than the spatial dimensions (window shape: {:?}, padded spatial dimension {}: {})",
                    self.window_shape,
                    i,
                    padded
                ));
            }
            shape[axis] = Dimension::Fixed((padded - window) / self.strides[i] + 1);
        }

        Ok(shape)
    }
}

/// Max pooling over the spatial dimensions of a `[N, C, spatial...]` batch.
#[derive(Clone, Debug, PartialEq)]
pub struct MaxPool {
    pub window_shape: Vec<usize>,
    pub strides: Vec<usize>,
    pub padding_below: Vec<usize>,
    pub padding_above: Vec<usize>,
}

impl Operator for MaxPool {
    fn name(&self) -> &'static str {
        "MaxPool"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        let [data] = inputs else {
            return Err(input_count_error(1, inputs));
        };
        let window = PoolWindow {
            window_shape: &self.window_shape,
            strides: &self.strides,
            padding_below: &self.padding_below,
            padding_above: &self.padding_above,
            allow_all_padding: true,
        };
        let shape = window.output_shape(&data.shape)?;
        Ok(smallvec![PortType::new(data.element_type, shape)])
    }
}

/// Average pooling over the spatial dimensions of a `[N, C, spatial...]`
/// batch.
///
/// If `include_padding` is false, padding elements are excluded from the
/// average, so every window must overlap the data.
#[derive(Clone, Debug, PartialEq)]
pub struct AvgPool {
    pub window_shape: Vec<usize>,
    pub strides: Vec<usize>,
    pub padding_below: Vec<usize>,
    pub padding_above: Vec<usize>,
    pub include_padding: bool,
}

impl Operator for AvgPool {
    fn name(&self) -> &'static str {
        "AvgPool"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        let [data] = inputs else {
            return Err(input_count_error(1, inputs));
        };
        let window = PoolWindow {
            window_shape: &self.window_shape,
            strides: &self.strides,
            padding_below: &self.padding_below,
            padding_above: &self.padding_above,
            allow_all_padding: self.include_padding,
        };
        let shape = window.output_shape(&data.shape)?;
        Ok(smallvec![PortType::new(data.element_type, shape)])
    }
}

#[cfg(test)]
mod tests {
    use tensor_ir_shape::{partial_shape, PartialShape};
    use tensor_ir_testing::TestCases;

    use super::{AvgPool, MaxPool};
    use crate::element::ElementType;
    use crate::operator::{Operator, PortType, ValidationError, ValidationErrorKind};

    fn max_pool(window_shape: &[usize], strides: &[usize]) -> MaxPool {
        let zeros = vec![0; window_shape.len()];
        MaxPool {
            window_shape: window_shape.to_vec(),
            strides: strides.to_vec(),
            padding_below: zeros.clone(),
            padding_above: zeros,
        }
    }

    #[test]
    fn test_max_pool_shapes() {
        #[derive(Debug)]
        struct Case {
            data: PartialShape,
            op: MaxPool,
            expected: Result<PartialShape, ValidationErrorKind>,
        }

        let cases = [
            Case {
                data: partial_shape![64, 3, 100],
                op: max_pool(&[10], &[1]),
                expected: Ok(partial_shape![64, 3, 91]),
            },
            Case {
                data: partial_shape![64, 3, 100],
                op: max_pool(&[10], &[2]),
                expected: Ok(partial_shape![64, 3, 46]),
            },
            Case {
                data: partial_shape![64, 3, 5],
                op: max_pool(&[2], &[2]),
                expected: Ok(partial_shape![64, 3, 2]),
            },
            Case {
                data: partial_shape![64, 3, 10, 20],
                op: max_pool(&[3, 4], &[1, 1]),
                expected: Ok(partial_shape![64, 3, 8, 17]),
            },
            Case {
                data: partial_shape![?, 3, ?, 20],
                op: max_pool(&[3, 4], &[1, 2]),
                expected: Ok(partial_shape![?, 3, ?, 9]),
            },
            Case {
                data: PartialShape::dynamic(),
                op: max_pool(&[3, 4], &[1, 1]),
                expected: Ok(partial_shape![?, ?, ?, ?]),
            },
            Case {
                data: partial_shape![64, 3],
                op: max_pool(&[3], &[1]),
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                data: partial_shape![0, 3, 10],
                op: max_pool(&[3], &[1]),
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                data: partial_shape![64, 0, 10],
                op: max_pool(&[3], &[1]),
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                data: partial_shape![64, 3, 10],
                op: max_pool(&[11], &[1]),
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                data: partial_shape![64, 3, 10],
                op: max_pool(&[0], &[1]),
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                data: partial_shape![64, 3, 10],
                op: max_pool(&[3], &[0]),
                expected: Err(ValidationErrorKind::Attribute),
            },
            Case {
                data: partial_shape![64, 3, 10],
                op: max_pool(&[3], &[1, 1]),
                expected: Err(ValidationErrorKind::Attribute),
            },
        ];

        cases.test_each(|case| {
            let input = PortType::new(ElementType::F32, case.data.clone());
            let result = case
                .op
                .infer_types(&[input])
                .map(|outputs| outputs[0].shape.clone())
                .map_err(|err| err.kind());
            assert_eq!(result, case.expected);
        });
    }

    #[test]
    fn test_zero_spatial_dim_after_padding() {
        let op = max_pool(&[1], &[1]);
        let input = PortType::new(ElementType::F32, partial_shape![6, 2, 0]);
        let err = op.infer_types(&[input]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Shape(
                "Data input spatial dimension 0 has zero length even after padding (data shape: {6,2,0})"
                    .into()
            )
        );
    }

    #[test]
    fn test_padding_overflow() {
        #[derive(Debug)]
        struct Case {
            data: PartialShape,
            padding_below: usize,
            padding_above: usize,
            expected: Result<PartialShape, ValidationErrorKind>,
        }

        let cases = [
            Case {
                data: partial_shape![1, 1, 4],
                padding_below: usize::MAX,
                padding_above: 0,
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                data: partial_shape![1, 1, 4],
                padding_below: usize::MAX - 4,
                padding_above: 1,
                expected: Err(ValidationErrorKind::Shape),
            },
            Case {
                data: partial_shape![1, 1, 4],
                padding_below: usize::MAX - 4,
                padding_above: 0,
                expected: Ok(partial_shape![1, 1, (usize::MAX - 1)]),
            },
            Case {
                data: partial_shape![1, 1, ?],
                padding_below: usize::MAX,
                padding_above: usize::MAX,
                expected: Ok(partial_shape![1, 1, ?]),
            },
        ];

        cases.test_each(|case| {
            let op = MaxPool {
                window_shape: vec![2],
                strides: vec![1],
                padding_below: vec![case.padding_below],
                padding_above: vec![case.padding_above],
            };
            let input = PortType::new(ElementType::F32, case.data.clone());
            let result = op
                .infer_types(&[input])
                .map(|outputs| outputs[0].shape.clone())
                .map_err(|err| err.kind());
            assert_eq!(result, case.expected);
        });
    }

    #[test]
    fn test_avg_pool_padded() {
        let op = AvgPool {
            window_shape: vec![2, 3, 2],
            strides: vec![2, 3, 4],
            padding_below: vec![5, 6, 4],
            padding_above: vec![6, 4, 5],
            include_padding: true,
        };
        let input = PortType::new(ElementType::F32, partial_shape![64, 3, 7, 8, 10]);
        let outputs = op.infer_types(&[input]).unwrap();
        assert_eq!(
            outputs[0],
            PortType::new(ElementType::F32, partial_shape![64, 3, 9, 6, 5])
        );
    }

    #[test]
    fn test_avg_pool_window_in_padding() {
        let mut op = AvgPool {
            window_shape: vec![2],
            strides: vec![1],
            padding_below: vec![2],
            padding_above: vec![0],
            include_padding: false,
        };
        let input = PortType::new(ElementType::F32, partial_shape![1, 1, 4]);
        let err = op.infer_types(&[input.clone()]).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::Shape);

        op.include_padding = true;
        let outputs = op.infer_types(&[input]).unwrap();
        assert_eq!(outputs[0].shape, partial_shape![1, 1, 5]);
    }
}
