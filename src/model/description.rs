//! Serialized description of a graph, as consumed by the graph builder.

use std::collections::BTreeMap;

use serde::Deserialize;
use tensor_ir_shape::{Dimension, PartialShape, Shape};

use crate::element::ElementType;
use crate::graph::ConstantData;
use crate::operator::PortType;

/// Value of a node attribute.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    String(String),
    Strings(Vec<String>),
}

/// Description of an operator node.
///
/// `input` and `output` are value names. Inputs refer to initializers, graph
/// inputs or the outputs of earlier nodes.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeDesc {
    pub name: Option<String>,
    pub op_type: String,
    pub input: Vec<String>,
    pub output: Vec<String>,
    pub attribute: BTreeMap<String, AttrValue>,
}

/// Declared name and type of a graph input or output.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValueInfoDesc {
    pub name: String,
    pub elem_type: ElementType,

    /// Dimension sizes, with `None` for unknown sizes. The whole shape is
    /// `None` if the rank is unknown.
    pub shape: Option<Vec<Option<usize>>>,
}

impl ValueInfoDesc {
    pub fn port_type(&self) -> PortType {
        let shape = match &self.shape {
            Some(dims) => PartialShape::new(dims.iter().map(|dim| match dim {
                Some(size) => Dimension::Fixed(*size),
                None => Dimension::Dynamic,
            })),
            None => PartialShape::dynamic(),
        };
        PortType::new(self.elem_type, shape)
    }
}

/// Description of a constant tensor.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TensorDesc {
    #[serde(default)]
    pub name: Option<String>,
    pub elem_type: ElementType,
    #[serde(default)]
    pub shape: Vec<usize>,
    pub data: ConstantData,
}

impl TensorDesc {
    pub fn shape(&self) -> Shape {
        Shape::new(&self.shape)
    }
}

/// Serialized description of a graph.
///
/// The textual form is JSON:
///
/// ```
/// use tensor_ir::GraphDesc;
///
/// let desc = GraphDesc::from_json(r#"{
///     "ir_version": 1,
///     "input": [{ "name": "x", "elem_type": "f32", "shape": [null, 4] }],
///     "output": [{ "name": "y" }],
///     "node": [{ "op_type": "Relu", "input": ["x"], "output": ["y"] }]
/// }"#).unwrap();
///
/// assert_eq!(desc.node[0].op_type, "Relu");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphDesc {
    pub ir_version: u32,
    pub name: Option<String>,
    pub initializer: Vec<TensorDesc>,
    pub input: Vec<ValueInfoDesc>,
    pub output: Vec<ValueInfoDesc>,
    pub node: Vec<NodeDesc>,
}

impl GraphDesc {
    pub fn from_json(json: &str) -> Result<GraphDesc, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_slice(data: &[u8]) -> Result<GraphDesc, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
