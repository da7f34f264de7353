use std::fmt;
use std::str::FromStr;

use smallvec::smallvec;
use tensor_ir_shape::{AxisSet, PartialShape};

use crate::element::ElementType;
use crate::operator::{
    check_axis, input_count_error, shape_error, Differentiability, Operator, OutputTypes,
    PortType, TypeConstraint, ValidationError,
};

/// Rounding applied when a scaled value lies between two integers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RoundMode {
    /// Round halfway cases away from zero, eg. 2.5 to 3 and -2.5 to -3.
    #[default]
    HalfAwayFromZero,

    /// Round halfway cases towards zero, eg. 2.5 to 2 and -2.5 to -2.
    HalfTowardZero,

    /// Round halfway cases to the nearest even integer.
    HalfToEven,

    /// Round halfway cases towards positive infinity.
    HalfUp,

    /// Round halfway cases towards negative infinity.
    HalfDown,

    /// Round every value towards zero.
    TowardZero,

    /// Round every value away from zero.
    TowardInfinity,

    /// Round every value up.
    Up,

    /// Round every value down.
    Down,
}

impl RoundMode {
    fn as_str(self) -> &'static str {
        match self {
            RoundMode::HalfAwayFromZero => "half_away_from_zero",
            RoundMode::HalfTowardZero => "half_toward_zero",
            RoundMode::HalfToEven => "half_to_even",
            RoundMode::HalfUp => "half_up",
            RoundMode::HalfDown => "half_down",
            RoundMode::TowardZero => "toward_zero",
            RoundMode::TowardInfinity => "toward_infinity",
            RoundMode::Up => "up",
            RoundMode::Down => "down",
        }
    }
}

impl fmt::Display for RoundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unrecognized [`RoundMode`] name.
#[derive(Clone, Debug, PartialEq)]
pub struct UnknownRoundMode(pub String);

impl fmt::Display for UnknownRoundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown round mode \"{}\"", self.0)
    }
}

impl std::error::Error for UnknownRoundMode {}

impl FromStr for RoundMode {
    type Err = UnknownRoundMode;

    fn from_str(s: &str) -> Result<RoundMode, UnknownRoundMode> {
        let mode = match s {
            "half_away_from_zero" => RoundMode::HalfAwayFromZero,
            "half_toward_zero" => RoundMode::HalfTowardZero,
            "half_to_even" => RoundMode::HalfToEven,
            "half_up" => RoundMode::HalfUp,
            "half_down" => RoundMode::HalfDown,
            "toward_zero" => RoundMode::TowardZero,
            "toward_infinity" => RoundMode::TowardInfinity,
            "up" => RoundMode::Up,
            "down" => RoundMode::Down,
            _ => return Err(UnknownRoundMode(s.to_string())),
        };
        Ok(mode)
    }
}

/// Check the axes and the scale and offset shapes shared by [`Quantize`]
/// and [`Dequantize`], and return the output shape.
///
/// The scale and offset must have the shape of the input projected onto the
/// quantization axes, and must agree with each other. Dims known only from
/// the parameters are filled into the output.
fn quantization_output_shape(
    axes: &AxisSet,
    input: &PortType,
    scale: &PortType,
    offset: &PortType,
) -> Result<PartialShape, ValidationError> {
    for axis in axes.iter() {
        check_axis("Quantization", axis, &input.shape)?;
    }

    let mut params_shape = input.shape.project(axes);
    if !PartialShape::merge_into(&mut params_shape, &scale.shape) {
        return Err(shape_error!(
            "Scale shape ({}) must match input shape projected along the quantization axes ({})",
            scale.shape,
            input.shape.project(axes)
        ));
    }
    let expected = params_shape.clone();
    if !PartialShape::merge_into(&mut params_shape, &offset.shape) {
        return Err(shape_error!(
            "Offset shape ({}) must match scale shape and input shape projected along the quantization axes ({})",
            offset.shape,
            expected
        ));
    }

    let mut shape = input.shape.clone();
    let (Some(rank), Some(dims)) = (shape.ndim(), params_shape.dims()) else {
        return Ok(shape);
    };
    for (axis, &dim) in (0..rank).filter(|axis| axes.contains(*axis)).zip(dims) {
        if shape[axis].is_dynamic() {
            shape[axis] = dim;
        }
    }
    Ok(shape)
}

/// Quantize a floating point tensor.
///
/// The inputs are the data, scale and offset. The output has element type
/// `to` and the shape of the input. `axes` lists the axes along which
/// scale and offset vary.
#[derive(Clone, Debug, PartialEq)]
pub struct Quantize {
    pub to: ElementType,
    pub axes: AxisSet,
    pub round_mode: RoundMode,
}

impl Operator for Quantize {
    fn name(&self) -> &'static str {
        "Quantize"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        let [input, scale, offset] = inputs else {
            return Err(input_count_error(3, inputs));
        };

        TypeConstraint::Quantized.check("Output", self.to)?;
        TypeConstraint::Real.check("Input", input.element_type)?;
        TypeConstraint::SameAs {
            what: "input",
            expected: input.element_type,
        }
        .check("Scale", scale.element_type)?;
        TypeConstraint::SameAs {
            what: "output",
            expected: self.to,
        }
        .check("Offset", offset.element_type)?;

        let shape = quantization_output_shape(&self.axes, input, scale, offset)?;
        Ok(smallvec![PortType::new(self.to, shape)])
    }

    fn differentiability(&self) -> Differentiability {
        Differentiability::ForwardOnly
    }
}

/// Convert a quantized tensor back to floating point.
///
/// The inputs are the data, scale and offset. The output has element type
/// `to` and the shape of the input.
#[derive(Clone, Debug, PartialEq)]
pub struct Dequantize {
    pub to: ElementType,
    pub axes: AxisSet,
}

impl Operator for Dequantize {
    fn name(&self) -> &'static str {
        "Dequantize"
    }

    fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
        let [input, scale, offset] = inputs else {
            return Err(input_count_error(3, inputs));
        };

        TypeConstraint::Quantized.check("Input", input.element_type)?;
        TypeConstraint::Real.check("Output", self.to)?;
        TypeConstraint::Real.check("Scale", scale.element_type)?;
        TypeConstraint::SameAs {
            what: "input",
            expected: input.element_type,
        }
        .check("Offset", offset.element_type)?;

        let shape = quantization_output_shape(&self.axes, input, scale, offset)?;
        Ok(smallvec![PortType::new(self.to, shape)])
    }

    fn differentiability(&self) -> Differentiability {
        Differentiability::ForwardOnly
    }
}
