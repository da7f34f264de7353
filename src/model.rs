//! Building validated graphs from serialized descriptions.

use crate::env::env_flag;
use crate::graph::Graph;
use crate::op_registry::OpRegistry;

mod description;
mod graph_builder;
mod load_error;


pub use description::{AttrValue, GraphDesc, NodeDesc, TensorDesc, ValueInfoDesc};
pub use load_error::{LoadError, LoadErrorKind};

pub(crate) use load_error::{load_error, LoadErrorImpl};

/// The newest IR version understood by the graph builder.
///
/// A description which does not declare a version is treated as using this
/// version.
pub const CURRENT_IR_VERSION: u32 = 2;

/// Options which customize how a graph is built from a description.
///
/// ```
/// use tensor_ir::{BuildOptions, LoadErrorKind};
///
/// let json = r#"{
///     "input": [{ "name": "x", "elem_type": "f32", "shape": [2] }],
///     "output": [{ "name": "y" }],
///     "node": [{ "op_type": "Relu", "input": ["x"], "output": ["y"] }]
/// }"#;
///
/// let graph = BuildOptions::with_all_ops().build_json(json).unwrap();
/// assert_eq!(graph.len(), 2);
///
/// let err = BuildOptions::with_all_ops().build_json("not json").unwrap_err();
/// assert_eq!(err.kind(), LoadErrorKind::ParseError);
/// ```
pub struct BuildOptions {
    registry: OpRegistry,
    ir_version: Option<u32>,
    strict_attributes: bool,
}

impl BuildOptions {
    /// Create a set of options with all operators enabled.
    pub fn with_all_ops() -> BuildOptions {
        Self::with_ops(OpRegistry::with_all_ops())
    }

    /// Create a set of options with a custom set of operators enabled.
    ///
    /// Nodes using an operator missing from `ops` cause the build to fail
    /// with [`LoadErrorKind::UnknownOperators`].
    pub fn with_ops(ops: OpRegistry) -> BuildOptions {
        BuildOptions {
            registry: ops,
            ir_version: None,
            strict_attributes: env_flag("TENSOR_IR_STRICT_ATTRS", false),
        }
    }

    /// Override the IR version declared by the description.
    pub fn ir_version(&mut self, version: Option<u32>) -> &mut Self {
        self.ir_version = version;
        self
    }

    /// Set whether attributes that an operator does not use are an error.
    ///
    /// When disabled, such attributes are logged and ignored. The default is
    /// taken from the `TENSOR_IR_STRICT_ATTRS` environment variable, or
    /// `false` if unset.
    pub fn strict_attributes(&mut self, strict: bool) -> &mut Self {
        self.strict_attributes = strict;
        self
    }

    pub fn registry(&self) -> &OpRegistry {
        &self.registry
    }

    /// Build a graph from a parsed description.
    ///
    /// The graph is only returned if every node is valid.
    pub fn build(&self, desc: &GraphDesc) -> Result<Graph, LoadError> {
        graph_builder::build_graph(self, desc)
    }

    /// Parse a JSON graph description and build it.
    pub fn build_json(&self, json: &str) -> Result<Graph, LoadError> {
        let desc = GraphDesc::from_json(json)
            .map_err(|err| LoadError::new(LoadErrorImpl::ParseFailed(err.into())))?;
        self.build(&desc)
    }
}

impl Graph {
    /// Build a graph from a description with all operators enabled.
    ///
    /// Use [`BuildOptions`] to customize the build.
    pub fn from_desc(desc: &GraphDesc) -> Result<Graph, LoadError> {
        BuildOptions::with_all_ops().build(desc)
    }
}
