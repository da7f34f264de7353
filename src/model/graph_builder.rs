use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::{
    load_error, BuildOptions, GraphDesc, LoadError, LoadErrorImpl, NodeDesc, CURRENT_IR_VERSION,
};
use crate::graph::{Constant, Graph, NodeError, NodeId, OutputRef};

/// Stages of building a graph. Each runs once, in declaration order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BuildState {
    CollectingConstants,
    CollectingParameters,
    CollectingOutputs,
    ValidatingOperators,
    MaterializingNodes,
    Complete,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CollectingConstants => "collecting constants",
            Self::CollectingParameters => "collecting parameters",
            Self::CollectingOutputs => "collecting outputs",
            Self::ValidatingOperators => "validating operators",
            Self::MaterializingNodes => "materializing nodes",
            Self::Complete => "complete",
        };
        write!(f, "{}", name)
    }
}

struct GraphBuilder<'a> {
    options: &'a BuildOptions,
    desc: &'a GraphDesc,
    ir_version: u32,
    state: BuildState,
    graph: Graph,

    /// Names of declared graph outputs, resolved once all nodes exist.
    output_names: Vec<&'a str>,
}

/// Build a graph from `desc`.
///
/// The partially built graph is discarded if any step fails.
pub(super) fn build_graph(options: &BuildOptions, desc: &GraphDesc) -> Result<Graph, LoadError> {
    let ir_version = match options.ir_version {
        Some(version) => version,
        None if desc.ir_version == 0 => CURRENT_IR_VERSION,
        None => desc.ir_version,
    };
    if ir_version > CURRENT_IR_VERSION {
        return Err(load_error!(
            SchemaError,
            None,
            "IR version {} is newer than the supported version {}",
            ir_version,
            CURRENT_IR_VERSION
        ));
    }

    let mut builder = GraphBuilder {
        options,
        desc,
        ir_version,
        state: BuildState::CollectingConstants,
        graph: Graph::new(),
        output_names: Vec::new(),
    };
    log::debug!(
        "building graph {:?} with IR version {}",
        desc.name.as_deref().unwrap_or_default(),
        ir_version
    );

    builder.collect_constants()?;
    builder.transition(BuildState::CollectingParameters);
    builder.collect_parameters();
    builder.transition(BuildState::CollectingOutputs);
    builder.collect_outputs();
    builder.transition(BuildState::ValidatingOperators);
    builder.validate_operators()?;
    builder.transition(BuildState::MaterializingNodes);
    builder.materialize_nodes()?;
    builder.resolve_outputs()?;
    builder.transition(BuildState::Complete);

    Ok(builder.graph)
}

impl<'a> GraphBuilder<'a> {
    fn transition(&mut self, next: BuildState) {
        log::debug!(
            "{} -> {} ({} nodes)",
            self.state,
            next,
            self.graph.len()
        );
        self.state = next;
    }

    /// Create constant nodes for the named initializers.
    fn collect_constants(&mut self) -> Result<(), LoadError> {
        for tensor in &self.desc.initializer {
            let Some(name) = tensor.name.as_deref() else {
                log::warn!("dropping unnamed initializer");
                continue;
            };

            if tensor.elem_type.is_dynamic() {
                return Err(load_error!(
                    SchemaError,
                    None,
                    "initializer \"{}\" has a dynamic element type",
                    name
                ));
            }

            let shape = tensor.shape();
            let Some(num_elements) = shape.num_elements() else {
                return Err(load_error!(
                    SchemaError,
                    None,
                    "initializer \"{}\" shape {} has too many elements",
                    name,
                    shape
                ));
            };
            if tensor.data.len() != num_elements {
                return Err(load_error!(
                    SchemaError,
                    None,
                    "initializer \"{}\" has {} elements but shape {} requires {}",
                    name,
                    tensor.data.len(),
                    shape,
                    num_elements
                ));
            }
            if !tensor.data.is_compatible_with(tensor.elem_type) {
                return Err(load_error!(
                    SchemaError,
                    None,
                    "initializer \"{}\" has values which are not valid for element type {}",
                    name,
                    tensor.elem_type
                ));
            }

            let value = Arc::new(Constant {
                name: name.to_string(),
                element_type: tensor.elem_type,
                shape,
                data: tensor.data.clone(),
            });
            self.graph.add_initializer(value.clone());
            let id = self.graph.add_constant(value);
            self.graph.cache_output(name, OutputRef::new(id, 0));
        }
        Ok(())
    }

    /// Create parameter nodes for the graph inputs.
    ///
    /// An input which shares a name with an initializer is always constant,
    /// so it resolves to the initializer's node instead.
    fn collect_parameters(&mut self) {
        for input in &self.desc.input {
            if self.graph.initializer(&input.name).is_some() {
                log::debug!(
                    "input \"{}\" has an initializer and is treated as constant",
                    input.name
                );
                continue;
            }
            let id = self.graph.add_parameter(&input.name, input.port_type());
            self.graph.cache_output(&input.name, OutputRef::new(id, 0));
        }
    }

    fn collect_outputs(&mut self) {
        let desc = self.desc;
        self.output_names = desc
            .output
            .iter()
            .map(|output| output.name.as_str())
            .collect();
    }

    /// Check that every node's operator type is registered.
    ///
    /// All unknown types are reported together.
    fn validate_operators(&self) -> Result<(), LoadError> {
        let registry = self.options.registry();
        let mut seen = FxHashSet::default();
        let unknown: Vec<String> = self
            .desc
            .node
            .iter()
            .map(|node| node.op_type.as_str())
            .filter(|op_type| !registry.contains(op_type, self.ir_version))
            .filter(|op_type| seen.insert(*op_type))
            .map(|op_type| op_type.to_string())
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(LoadErrorImpl::UnknownOperators(unknown).into())
        }
    }

    fn materialize_nodes(&mut self) -> Result<(), LoadError> {
        let desc = self.desc;
        for node in &desc.node {
            self.materialize_node(node)?;
        }
        Ok(())
    }

    fn materialize_node(&mut self, node: &NodeDesc) -> Result<NodeId, LoadError> {
        let node_name = node.name.as_deref();

        let inputs = node
            .input
            .iter()
            .map(|name| {
                self.graph.lookup(name).ok_or_else(|| {
                    load_error!(
                        SchemaError,
                        node_name,
                        "input \"{}\" is not produced by an earlier node, initializer or graph input",
                        name
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let op = self
            .options
            .registry()
            .read_op(node, self.ir_version, self.options.strict_attributes)
            .map_err(|err| load_error!(OperatorInvalid, node_name, err))?;

        let mut op_builder = self.graph.add_op(op).inputs(&inputs);
        if let Some(name) = node_name {
            op_builder = op_builder.name(name);
        }
        let id = op_builder.finalize().map_err(|err| match err {
            NodeError::Validation { op, error } => {
                LoadError::for_node(node_name, LoadErrorImpl::ValidationFailed { op, error })
            }
            err => load_error!(SchemaError, node_name, err),
        })?;

        let output_count = self
            .graph
            .get_node(id)
            .map(|n| n.output_types().len())
            .unwrap_or(0);
        if node.output.len() > output_count {
            return Err(load_error!(
                SchemaError,
                node_name,
                "{} node declares {} outputs but the operator produces {}",
                node.op_type,
                node.output.len(),
                output_count
            ));
        }

        for (port, name) in node.output.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            self.graph.cache_output(name, OutputRef::new(id, port));
        }

        if log::log_enabled!(log::Level::Trace) {
            if let Some(n) = self.graph.get_node(id) {
                let types: Vec<String> = n.output_types().iter().map(|t| t.to_string()).collect();
                log::trace!(
                    "added {} node {} {:?} -> [{}]",
                    node.op_type,
                    id,
                    node_name.unwrap_or_default(),
                    types.join(", ")
                );
            }
        }

        Ok(id)
    }

    /// Look up the declared outputs in the name cache.
    fn resolve_outputs(&mut self) -> Result<(), LoadError> {
        let outputs = self
            .output_names
            .iter()
            .map(|&name| {
                self.graph
                    .lookup(name)
                    .map(|output| (name.to_string(), output))
                    .ok_or_else(|| {
                        load_error!(SchemaError, None, "graph output \"{}\" is not defined", name)
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.graph.set_outputs(outputs);
        Ok(())
    }
}
