/// ID of a node in a [`Graph`](crate::Graph).
///
/// IDs are indices into the graph's node list, assigned in insertion order.
#[derive(Copy, Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(u32);

impl NodeId {
    /// Return the underlying u32 value of the ID.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Return the underlying ID value as a usize, for slice indexing.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub fn from_u32(value: u32) -> NodeId {
        NodeId(value)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}
