//! [`ReadOp`] implementations for the built-in operators.

use super::{Attrs, ReadOp, ReadOpError};
use crate::ops;
use crate::ops::RoundMode;

macro_rules! impl_read_op {
    ($op:ident) => {
        impl ReadOp for ops::$op {
            fn op_type() -> &'static str {
                stringify!($op)
            }

            fn read(_attrs: &Attrs) -> Result<Self, ReadOpError> {
                Ok(ops::$op)
            }
        }
    };

    ($op:ident, $read:expr) => {
        impl_read_op!($op, since = 1, $read);
    };

    ($op:ident, since = $version:literal, $read:expr) => {
        impl ReadOp for ops::$op {
            fn op_type() -> &'static str {
                stringify!($op)
            }

            fn since_version() -> u32 {
                $version
            }

            fn read(attrs: &Attrs) -> Result<Self, ReadOpError> {
                $read(attrs)
            }
        }
    };
}

impl_read_op!(Abs);
impl_read_op!(Add);
impl_read_op!(And);

struct PoolAttrs {
    window_shape: Vec<usize>,
    strides: Vec<usize>,
    padding_below: Vec<usize>,
    padding_above: Vec<usize>,
}

fn get_common_pool_attrs(attrs: &Attrs) -> Result<PoolAttrs, ReadOpError> {
    let window_shape = attrs.require("window_shape")?.as_usize_ints()?;
    let spatial_rank = window_shape.len();

    let usize_ints_or = |name: &'static str, default: usize| -> Result<Vec<usize>, ReadOpError> {
        attrs
            .get(name)
            .map(|attr| attr.as_usize_ints())
            .unwrap_or_else(|| Ok(vec![default; spatial_rank]))
    };

    Ok(PoolAttrs {
        strides: usize_ints_or("strides", 1)?,
        padding_below: usize_ints_or("padding_below", 0)?,
        padding_above: usize_ints_or("padding_above", 0)?,
        window_shape,
    })
}

impl_read_op!(AvgPool, |attrs: &Attrs| {
    let PoolAttrs {
        window_shape,
        strides,
        padding_below,
        padding_above,
    } = get_common_pool_attrs(attrs)?;
    let include_padding = attrs
        .get("include_padding")
        .map(|attr| attr.as_bool())
        .transpose()?
        .unwrap_or(false);

    Ok(ops::AvgPool {
        window_shape,
        strides,
        padding_below,
        padding_above,
        include_padding,
    })
});

impl_read_op!(Concat, |attrs: &Attrs| {
    let axis = attrs.require("axis")?.as_usize()?;
    Ok(ops::Concat { axis })
});

impl_read_op!(Convert, |attrs: &Attrs| {
    let to = attrs.require("to")?.as_element_type()?;
    Ok(ops::Convert { to })
});

impl_read_op!(Dequantize, since = 2, |attrs: &Attrs| {
    let to = attrs.require("to")?.as_element_type()?;
    let axes = attrs
        .get("axes")
        .map(|attr| attr.as_axes())
        .transpose()?
        .unwrap_or_default();
    Ok(ops::Dequantize { to, axes })
});

impl_read_op!(Divide);
impl_read_op!(Equal);

impl_read_op!(GenerateMask, since = 2, |attrs: &Attrs| {
    let shape = attrs.require("shape")?.as_shape()?;
    let element_type = attrs.require("element_type")?.as_element_type()?;
    let seed = match attrs.get("seed") {
        Some(attr) => u32::try_from(attr.as_i64()?)
            .map_err(|_| ReadOpError::attr_error("seed", "value out of range"))?,
        None => 0,
    };
    let probability = attrs.require("probability")?.as_f64()?;
    Ok(ops::GenerateMask {
        shape,
        element_type,
        seed,
        probability,
    })
});

impl_read_op!(Greater);
impl_read_op!(Less);

impl_read_op!(MaxPool, |attrs: &Attrs| {
    let PoolAttrs {
        window_shape,
        strides,
        padding_below,
        padding_above,
    } = get_common_pool_attrs(attrs)?;

    Ok(ops::MaxPool {
        window_shape,
        strides,
        padding_below,
        padding_above,
    })
});

impl_read_op!(Multiply);
impl_read_op!(Negative);
impl_read_op!(Not);
impl_read_op!(Or);

impl_read_op!(Pad, |attrs: &Attrs| {
    let padding_below = attrs.require("padding_below")?.as_isize_ints()?;
    let padding_above = attrs.require("padding_above")?.as_isize_ints()?;
    let padding_interior = attrs
        .get("padding_interior")
        .map(|attr| attr.as_usize_ints())
        .transpose()?
        .unwrap_or_else(|| vec![0; padding_below.len()]);
    Ok(ops::Pad {
        padding_below,
        padding_above,
        padding_interior,
    })
});

impl_read_op!(Quantize, since = 2, |attrs: &Attrs| {
    let to = attrs.require("to")?.as_element_type()?;
    let axes = attrs
        .get("axes")
        .map(|attr| attr.as_axes())
        .transpose()?
        .unwrap_or_default();
    let round_mode = attrs
        .get("round_mode")
        .map(|attr| attr.as_string_enum::<RoundMode>())
        .transpose()?
        .unwrap_or_default();
    Ok(ops::Quantize {
        to,
        axes,
        round_mode,
    })
});

impl_read_op!(Relu);

impl_read_op!(Reverse, |attrs: &Attrs| {
    let axes = attrs.require("axes")?.as_axes()?;
    Ok(ops::Reverse { axes })
});

impl_read_op!(Slice, |attrs: &Attrs| {
    let lower_bounds = attrs.require("lower_bounds")?.as_usize_ints()?;
    let upper_bounds = attrs.require("upper_bounds")?.as_usize_ints()?;
    let strides = attrs
        .get("strides")
        .map(|attr| attr.as_usize_ints())
        .transpose()?
        .unwrap_or_else(|| vec![1; lower_bounds.len()]);
    Ok(ops::Slice {
        lower_bounds,
        upper_bounds,
        strides,
    })
});

impl_read_op!(Subtract);

impl_read_op!(Sum, |attrs: &Attrs| {
    let axes = attrs.require("axes")?.as_axes()?;
    Ok(ops::Sum { axes })
});

impl_read_op!(TopK, since = 2, |attrs: &Attrs| {
    let axis = attrs.require("axis")?.as_usize()?;
    let k = attrs.require("k")?.as_usize()?;
    let index_element_type = attrs
        .get("index_element_type")
        .map(|attr| attr.as_element_type())
        .transpose()?
        .unwrap_or(crate::element::ElementType::I64);
    let compute_max = attrs
        .get("compute_max")
        .map(|attr| attr.as_bool())
        .transpose()?
        .unwrap_or(true);
    Ok(ops::TopK {
        axis,
        k,
        index_element_type,
        compute_max,
    })
});
