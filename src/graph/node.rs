use std::sync::Arc;

use serde::Deserialize;
use smallvec::smallvec;
use tensor_ir_shape::Shape;

use super::OutputRef;
use crate::element::ElementType;
use crate::operator::{OutputTypes, PortType};
use crate::ops::Op;

/// Element type and shape of each output of a node, as most recently
/// inferred.
///
/// Later passes which refine shapes replace the whole result via
/// [`Graph::refine_outputs`](crate::Graph::refine_outputs), which increments
/// `version`.
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceResult {
    pub version: u32,
    pub outputs: OutputTypes,
}

impl InferenceResult {
    pub(crate) fn new(outputs: OutputTypes) -> InferenceResult {
        InferenceResult {
            version: 0,
            outputs,
        }
    }
}

/// Elements of a constant tensor.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ConstantData {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    UInt(Vec<u64>),
    Float(Vec<f64>),
}

impl ConstantData {
    pub fn len(&self) -> usize {
        match self {
            ConstantData::Bool(data) => data.len(),
            ConstantData::Int(data) => data.len(),
            ConstantData::UInt(data) => data.len(),
            ConstantData::Float(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return true if these values can be stored as elements of type
    /// `element_type`.
    ///
    /// Integer values are accepted for floating point types. An empty list
    /// is accepted for any static type.
    pub fn is_compatible_with(&self, element_type: ElementType) -> bool {
        if element_type.is_dynamic() {
            return false;
        }
        if self.is_empty() {
            return true;
        }
        match self {
            ConstantData::Bool(_) => element_type == ElementType::Boolean,
            ConstantData::Int(values) => {
                (element_type.is_integral() || element_type.is_real())
                    && (element_type.is_signed() || values.iter().all(|&v| v >= 0))
            }
            ConstantData::UInt(_) => element_type.is_integral() || element_type.is_real(),
            ConstantData::Float(_) => element_type.is_real(),
        }
    }
}

/// A tensor whose value is fixed when the graph is built.
#[derive(Clone, Debug, PartialEq)]
pub struct Constant {
    pub name: String,
    pub element_type: ElementType,
    pub shape: Shape,
    pub data: ConstantData,
}

impl Constant {
    pub fn port_type(&self) -> PortType {
        PortType::new(self.element_type, (&self.shape).into())
    }
}

#[derive(Debug)]
pub enum Node {
    Parameter(ParameterNode),
    Constant(ConstantNode),
    Operator(OperatorNode),
}

impl Node {
    /// Return the debug name of this node.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Parameter(node) => Some(node.name.as_str()),
            Node::Constant(node) => Some(node.value.name.as_str()),
            Node::Operator(node) => node.name.as_deref(),
        }
    }

    pub fn inference(&self) -> &InferenceResult {
        match self {
            Node::Parameter(node) => &node.inference,
            Node::Constant(node) => &node.inference,
            Node::Operator(node) => &node.inference,
        }
    }

    pub(super) fn inference_mut(&mut self) -> &mut InferenceResult {
        match self {
            Node::Parameter(node) => &mut node.inference,
            Node::Constant(node) => &mut node.inference,
            Node::Operator(node) => &mut node.inference,
        }
    }

    /// Return the types of this node's outputs.
    pub fn output_types(&self) -> &[PortType] {
        &self.inference().outputs
    }

    /// Return the contained operator, if this an operator node.
    pub fn as_operator(&self) -> Option<&OperatorNode> {
        match self {
            Node::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// Return the contained constant, if this a constant node.
    pub fn as_constant(&self) -> Option<&ConstantNode> {
        match self {
            Node::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterNode> {
        match self {
            Node::Parameter(p) => Some(p),
            _ => None,
        }
    }
}

/// A graph input whose value is supplied at runtime.
#[derive(Debug)]
pub struct ParameterNode {
    name: String,
    inference: InferenceResult,
}

impl ParameterNode {
    pub(super) fn new(name: &str, port: PortType) -> ParameterNode {
        ParameterNode {
            name: name.to_owned(),
            inference: InferenceResult::new(smallvec![port]),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the declared type of the parameter.
    pub fn port_type(&self) -> &PortType {
        &self.inference.outputs[0]
    }
}

#[derive(Debug)]
pub struct ConstantNode {
    value: Arc<Constant>,
    inference: InferenceResult,
}

impl ConstantNode {
    pub(super) fn new(value: Arc<Constant>) -> ConstantNode {
        let port = value.port_type();
        ConstantNode {
            value,
            inference: InferenceResult::new(smallvec![port]),
        }
    }

    pub fn value(&self) -> &Constant {
        &self.value
    }
}

#[derive(Debug)]
pub struct OperatorNode {
    name: Option<String>,
    operator: Op,
    inputs: Box<[OutputRef]>,
    inference: InferenceResult,
}

impl OperatorNode {
    pub(super) fn new(
        name: Option<String>,
        operator: Op,
        inputs: Vec<OutputRef>,
        outputs: OutputTypes,
    ) -> OperatorNode {
        OperatorNode {
            name,
            operator,
            inputs: inputs.into(),
            inference: InferenceResult::new(outputs),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn operator(&self) -> &Op {
        &self.operator
    }

    /// Return the outputs of other nodes which this node consumes.
    pub fn inputs(&self) -> &[OutputRef] {
        &self.inputs
    }
}
