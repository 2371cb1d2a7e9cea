use std::{
    fmt::{self, Display},
    ops::{Index, IndexMut},
};

use sart_data_structures::{index_storage::IndexStorage, FxHashMap, FxIndexMap};

use super::{Graph, LevelId, NodeId, NodeRef};
use crate::{design::Direction, node::Node, Error, Result};

/// One instantiated module: its own ports, wires and primitives, the links
/// made at this level, and the subnets of its non-primitive instances.
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    pub module: String,
    pub depth: usize,
    pub(crate) parent: Option<LevelId>,
    pub(crate) nodes: IndexStorage<NodeId, Node>,
    by_name: FxHashMap<String, NodeId>,
    ports: Vec<NodeId>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    inouts: Vec<NodeId>,
    pub(crate) graph: Graph,
    pub(crate) subnets: FxIndexMap<String, LevelId>,
}

impl Index<NodeId> for Level {
    type Output = Node;

    #[inline]
    fn index(&self, node_id: NodeId) -> &Self::Output {
        &self.nodes[node_id]
    }
}

impl IndexMut<NodeId> for Level {
    #[inline]
    fn index_mut(&mut self, node_id: NodeId) -> &mut Self::Output {
        &mut self.nodes[node_id]
    }
}

impl Level {
    pub fn new(
        name: impl Into<String>,
        module: impl Into<String>,
        depth: usize,
        parent: Option<LevelId>,
    ) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            depth,
            parent,
            nodes: Default::default(),
            by_name: Default::default(),
            ports: Default::default(),
            inputs: Default::default(),
            outputs: Default::default(),
            inouts: Default::default(),
            graph: Default::default(),
            subnets: Default::default(),
        }
    }

    /// Adds `node`, keeping the port views in step. A wire whose name is
    /// already known resolves to the existing node; any other clash is an
    /// error.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId> {
        if let Some(node_id) = self.by_name.get(&node.name) {
            if node.is_wire() {
                return Ok(*node_id);
            }
            return Err(Error::DuplicateNode(format!("{}/{}", self.name, node.name)));
        }

        let direction = node.direction();
        let name = node.name.clone();
        let node_id = self.nodes.push(node);
        self.by_name.insert(name, node_id);

        if let Some(direction) = direction {
            self.ports.push(node_id);
            match direction {
                Direction::Input => self.inputs.push(node_id),
                Direction::Output => self.outputs.push(node_id),
                Direction::Inout => self.inouts.push(node_id),
            }
        }

        Ok(node_id)
    }

    #[inline]
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn fullname(&self, node_id: NodeId) -> String {
        format!("{}/{}", self.name, self.nodes[node_id].name)
    }

    #[inline]
    pub fn parent(&self) -> Option<LevelId> {
        self.parent
    }

    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter_with_id()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Ports in declaration order.
    #[inline]
    pub fn ports(&self) -> &[NodeId] {
        &self.ports
    }

    #[inline]
    pub fn port_at(&self, pos: usize) -> Option<NodeId> {
        self.ports.get(pos).copied()
    }

    #[inline]
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    #[inline]
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    #[inline]
    pub fn inouts(&self) -> &[NodeId] {
        &self.inouts
    }

    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Subnets keyed by instance path.
    pub fn subnets(&self) -> impl ExactSizeIterator<Item = (&str, LevelId)> + '_ {
        self.subnets.iter().map(|(name, id)| (name.as_str(), *id))
    }

    #[inline]
    pub fn subnet(&self, name: &str) -> Option<LevelId> {
        self.subnets.get(name).copied()
    }

    #[inline]
    pub fn connect(&mut self, from: NodeRef, to: NodeRef) {
        self.graph.connect(from, to);
    }

    /// Links an actual signal to a pin seen from this level: inputs drive the
    /// pin, outputs are driven by it, inouts go both ways.
    pub fn connect_pin(&mut self, direction: Direction, actual: NodeRef, pin: NodeRef) {
        match direction {
            Direction::Input => self.connect(actual, pin),
            Direction::Output => self.connect(pin, actual),
            Direction::Inout => {
                self.connect(actual, pin);
                self.connect(pin, actual);
            }
        }
    }

    fn count(&self, f: impl Fn(&Node) -> bool) -> usize {
        self.nodes.values().filter(|node| f(node)).count()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn prim_count(&self) -> usize {
        self.count(Node::is_prim)
    }

    pub fn seq_count(&self) -> usize {
        self.count(Node::is_seq)
    }

    pub fn wire_count(&self) -> usize {
        self.count(Node::is_wire)
    }

    pub fn ace_count(&self) -> usize {
        self.count(|node| node.is_ace)
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nl:{:?} Nodes:{} Ports:{} Prims:{} Seqns:{} Wires:{} Subnets:{} Links:{}",
            self.name,
            self.node_count(),
            self.port_count(),
            self.prim_count(),
            self.seq_count(),
            self.wire_count(),
            self.subnets.len(),
            self.graph.edge_count()
        )
    }
}
