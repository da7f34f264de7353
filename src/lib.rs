//! tensor-ir builds typed, shape-checked graphs of tensor operators.
//!
//! It is the front end of a tensor compiler. Given a description of a
//! computation graph, it creates a node for each operator and checks, as each
//! node is added, that its inputs have acceptable element types and shapes.
//! The output types and shapes of every node are inferred along the way, so
//! later passes (optimization, code generation) can rely on a graph that is
//! known to be well-formed.
//!
//! # Building graphs
//!
//! Graphs can be built directly with [`Graph`]:
//!
//! ```
//! use tensor_ir::ops::{Add, Relu};
//! use tensor_ir::shape::partial_shape;
//! use tensor_ir::{ElementType, Graph, OutputRef, PortType};
//!
//! let mut graph = Graph::new();
//! let x = graph.add_parameter("x", PortType::new(ElementType::F32, partial_shape![?, 4]));
//! let y = graph.add_parameter("y", PortType::new(ElementType::F32, partial_shape![2, ?]));
//! let sum = graph
//!     .add_op(Add)
//!     .inputs(&[OutputRef::new(x, 0), OutputRef::new(y, 0)])
//!     .finalize()
//!     .unwrap();
//! let relu = graph.add_op(Relu).input(OutputRef::new(sum, 0)).finalize().unwrap();
//!
//! assert_eq!(
//!     graph.output_type(OutputRef::new(relu, 0)),
//!     Some(&PortType::new(ElementType::F32, partial_shape![2, 4]))
//! );
//! ```
//!
//! Or from a serialized [`GraphDesc`] using [`BuildOptions`], which looks up
//! each node's operator type in an [`OpRegistry`].
//!
//! # Shapes
//!
//! Shapes may be partially known. See the [`shape`] crate for the shape
//! algebra and [`coord`] for the coordinate transforms used to describe
//! sliced, padded and windowed views of tensors.

mod element;
mod env;
mod graph;
mod model;
mod op_registry;
mod operator;

pub mod ops;

pub use tensor_ir_coord as coord;
pub use tensor_ir_shape as shape;

pub use element::{ElementType, ParseElementTypeError};
pub use graph::{
    Constant, ConstantData, ConstantNode, Graph, InferenceResult, Node, NodeBuilder, NodeError,
    NodeId, OperatorNode, OutputRef, ParameterNode,
};
pub use model::{
    AttrValue, BuildOptions, GraphDesc, LoadError, LoadErrorKind, NodeDesc, TensorDesc,
    ValueInfoDesc, CURRENT_IR_VERSION,
};
pub use op_registry::{Attr, Attrs, OpRegistry, ReadOp, ReadOpError};
pub use operator::{
    AdjointKind, Differentiability, Operator, OutputTypes, PortType, TypeConstraint,
    UnsupportedError, ValidationError, ValidationErrorKind,
};
