use std::error::Error;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::operator::{Operator, OutputTypes, PortType, ValidationError};
use crate::ops::Op;

mod node;
mod node_id;

pub use node::{
    Constant, ConstantData, ConstantNode, InferenceResult, Node, OperatorNode, ParameterNode,
};
pub use node_id::NodeId;


/// Reference to one output of a node.
///
/// This is how operator inputs refer to the values they consume. The graph
/// owns all nodes, so references never keep a node alive.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct OutputRef {
    pub node: NodeId,
    pub port: usize,
}

impl OutputRef {
    pub fn new(node: NodeId, port: usize) -> OutputRef {
        OutputRef { node, port }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.port)
    }
}

/// Errors when adding or updating nodes in a [`Graph`].
#[derive(Clone, Debug, PartialEq)]
pub enum NodeError {
    /// An operator input refers to a node or port that does not exist.
    InvalidInput(OutputRef),

    /// The node ID does not exist in the graph.
    InvalidNode(NodeId),

    /// Refined outputs have a different port count than the node.
    OutputCount { expected: usize, actual: usize },

    /// The operator rejected its inputs.
    Validation {
        op: &'static str,
        error: ValidationError,
    },
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::InvalidInput(input) => write!(f, "input {} does not exist", input),
            NodeError::InvalidNode(id) => write!(f, "node {} does not exist", id),
            NodeError::OutputCount { expected, actual } => write!(
                f,
                "node has {} outputs but refined types have {}",
                expected, actual
            ),
            NodeError::Validation { op, error } => write!(f, "{} validation failed: {}", op, error),
        }
    }
}

impl Error for NodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NodeError::Validation { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A graph of typed and shape-checked operators.
///
/// Nodes are stored in an arena in insertion order and addressed by
/// [`NodeId`]. Since an operator can only consume outputs of nodes that
/// already exist, insertion order is a topological order.
///
/// The graph also holds the named constant tensors (initializers), a cache
/// mapping value names to the node outputs that produce them, and the list
/// of named graph outputs.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    parameters: Vec<NodeId>,
    initializers: FxHashMap<String, Arc<Constant>>,
    cache: FxHashMap<String, OutputRef>,
    outputs: Vec<(String, OutputRef)>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Graph {
        Graph::default()
    }

    fn next_id(&self) -> NodeId {
        NodeId::from_u32(self.nodes.len() as u32)
    }

    /// Add a graph input with a declared type.
    pub fn add_parameter(&mut self, name: &str, port: PortType) -> NodeId {
        let id = self.next_id();
        self.nodes
            .push(Node::Parameter(ParameterNode::new(name, port)));
        self.parameters.push(id);
        id
    }

    /// Add a node whose single output is a constant tensor.
    pub fn add_constant(&mut self, value: Arc<Constant>) -> NodeId {
        let id = self.next_id();
        self.nodes.push(Node::Constant(ConstantNode::new(value)));
        id
    }

    /// Start adding an operator node.
    ///
    /// The node is validated and added when [`NodeBuilder::finalize`] is
    /// called.
    pub fn add_op(&mut self, op: impl Into<Op>) -> NodeBuilder<'_> {
        NodeBuilder {
            graph: self,
            op: op.into(),
            name: None,
            inputs: Vec::new(),
        }
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.as_usize())
    }

    /// Return the IDs of all nodes in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId::from_u32)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Return the IDs of parameter nodes in the order they were added.
    pub fn parameters(&self) -> &[NodeId] {
        &self.parameters
    }

    /// Return the type of a node output.
    pub fn output_type(&self, output: OutputRef) -> Option<&PortType> {
        self.get_node(output.node)?.output_types().get(output.port)
    }

    /// Replace the inferred output types of a node.
    ///
    /// The number of outputs cannot change. Returns the new version of the
    /// node's [`InferenceResult`].
    pub fn refine_outputs(&mut self, id: NodeId, outputs: OutputTypes) -> Result<u32, NodeError> {
        let node = self
            .nodes
            .get_mut(id.as_usize())
            .ok_or(NodeError::InvalidNode(id))?;
        let inference = node.inference_mut();
        if inference.outputs.len() != outputs.len() {
            return Err(NodeError::OutputCount {
                expected: inference.outputs.len(),
                actual: outputs.len(),
            });
        }
        *inference = InferenceResult {
            version: inference.version + 1,
            outputs,
        };
        Ok(inference.version)
    }

    pub fn add_initializer(&mut self, value: Arc<Constant>) {
        self.initializers.insert(value.name.clone(), value);
    }

    pub fn initializer(&self, name: &str) -> Option<&Arc<Constant>> {
        self.initializers.get(name)
    }

    pub fn initializers(&self) -> &FxHashMap<String, Arc<Constant>> {
        &self.initializers
    }

    /// Record that the value called `name` is produced by `output`.
    ///
    /// This replaces any previous entry with the same name.
    pub fn cache_output(&mut self, name: &str, output: OutputRef) {
        self.cache.insert(name.to_owned(), output);
    }

    /// Find the node output which produces the value called `name`.
    pub fn lookup(&self, name: &str) -> Option<OutputRef> {
        self.cache.get(name).copied()
    }

    pub fn cache(&self) -> &FxHashMap<String, OutputRef> {
        &self.cache
    }

    /// Set the named outputs of the graph.
    pub fn set_outputs(&mut self, outputs: Vec<(String, OutputRef)>) {
        self.outputs = outputs;
    }

    pub fn outputs(&self) -> &[(String, OutputRef)] {
        &self.outputs
    }
}

/// Builder for an operator node, returned by [`Graph::add_op`].
pub struct NodeBuilder<'a> {
    graph: &'a mut Graph,
    op: Op,
    name: Option<String>,
    inputs: Vec<OutputRef>,
}

impl NodeBuilder<'_> {
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    pub fn input(mut self, input: OutputRef) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn inputs(mut self, inputs: &[OutputRef]) -> Self {
        self.inputs.extend_from_slice(inputs);
        self
    }

    /// Validate the operator against the types of its inputs and add it to
    /// the graph.
    ///
    /// The graph is not modified if validation fails.
    pub fn finalize(self) -> Result<NodeId, NodeError> {
        let input_types = self
            .inputs
            .iter()
            .map(|&input| {
                self.graph
                    .output_type(input)
                    .cloned()
                    .ok_or(NodeError::InvalidInput(input))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let outputs = self
            .op
            .infer_types(&input_types)
            .map_err(|error| NodeError::Validation {
                op: self.op.name(),
                error,
            })?;

        let id = self.graph.next_id();
        self.graph.nodes.push(Node::Operator(OperatorNode::new(
            self.name,
            self.op,
            self.inputs,
            outputs,
        )));
        Ok(id)
    }
}
