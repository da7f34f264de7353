//! The closed set of operators that can appear in a graph.
//!
//! Each operator is a struct holding its attributes and implementing
//! [`Operator`]. The [`Op`] enum wraps every operator type so that graph
//! nodes can store any of them by value.

use crate::operator::{
    AdjointKind, Differentiability, Operator, OutputTypes, PortType, UnsupportedError,
    ValidationError,
};

mod binary_elementwise;
mod concat;
mod convert;
mod layout;
mod pad;
mod pooling;
mod quantize;
mod random;
mod reduce;
mod slice;
mod unary_elementwise;

pub use binary_elementwise::{Add, And, Divide, Equal, Greater, Less, Multiply, Or, Subtract};
pub use concat::Concat;
pub use convert::Convert;
pub use layout::Reverse;
pub use pad::Pad;
pub use pooling::{AvgPool, MaxPool};
pub use quantize::{Dequantize, Quantize, RoundMode};
pub use random::GenerateMask;
pub use reduce::{Sum, TopK};
pub use slice::Slice;
pub use unary_elementwise::{Abs, Negative, Not, Relu};

/// Define the [`Op`] enum with one variant per operator type, forwarding
/// [`Operator`] methods to the wrapped operator.
macro_rules! define_ops {
    ($($variant:ident),* $(,)?) => {
        /// Any operator supported by the graph.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Op {
            $($variant($variant)),*
        }

        impl Operator for Op {
            fn name(&self) -> &'static str {
                match self {
                    $(Op::$variant(op) => op.name()),*
                }
            }

            fn infer_types(&self, inputs: &[PortType]) -> Result<OutputTypes, ValidationError> {
                match self {
                    $(Op::$variant(op) => op.infer_types(inputs)),*
                }
            }

            fn differentiability(&self) -> Differentiability {
                match self {
                    $(Op::$variant(op) => op.differentiability()),*
                }
            }

            fn generate_adjoints(&self) -> Result<AdjointKind, UnsupportedError> {
                match self {
                    $(Op::$variant(op) => op.generate_adjoints()),*
                }
            }
        }

        $(
            impl From<$variant> for Op {
                fn from(op: $variant) -> Op {
                    Op::$variant(op)
                }
            }
        )*
    };
}

define_ops!(
    Abs,
    Add,
    And,
    AvgPool,
    Concat,
    Convert,
    Dequantize,
    Divide,
    Equal,
    GenerateMask,
    Greater,
    Less,
    MaxPool,
    Multiply,
    Negative,
    Not,
    Or,
    Pad,
    Quantize,
    Relu,
    Reverse,
    Slice,
    Subtract,
    Sum,
    TopK,
);
