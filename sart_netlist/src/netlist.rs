mod graph;
mod ident;
mod level;

use std::{
    fmt::{self, Display},
    ops::{Index, IndexMut},
};

pub use graph::{Edge, EdgeDir, Graph, Incoming, Outgoing};
pub use ident::*;
pub use level::Level;
use sart_data_structures::{index_storage::IndexStorage, FxHashMap};

use crate::node::Node;

/// The instantiated hierarchy. Levels live in one arena; a parent refers to
/// its subnets and a link refers to its ends by index only. The first level
/// added is the top.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    pub(crate) levels: IndexStorage<LevelId, Level>,
    by_name: FxHashMap<String, LevelId>,
}

impl Index<LevelId> for Netlist {
    type Output = Level;

    #[inline]
    fn index(&self, level_id: LevelId) -> &Self::Output {
        &self.levels[level_id]
    }
}

impl IndexMut<LevelId> for Netlist {
    #[inline]
    fn index_mut(&mut self, level_id: LevelId) -> &mut Self::Output {
        &mut self.levels[level_id]
    }
}

impl Index<NodeRef> for Netlist {
    type Output = Node;

    #[inline]
    fn index(&self, node_ref: NodeRef) -> &Self::Output {
        &self.levels[node_ref.level][node_ref.node]
    }
}

impl IndexMut<NodeRef> for Netlist {
    #[inline]
    fn index_mut(&mut self, node_ref: NodeRef) -> &mut Self::Output {
        &mut self.levels[node_ref.level][node_ref.node]
    }
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn top(&self) -> Option<LevelId> {
        self.levels.ids().next()
    }

    pub fn add_level(&mut self, level: Level) -> LevelId {
        let name = level.name.clone();
        let level_id = self.levels.push(level);
        self.by_name.insert(name, level_id);
        level_id
    }

    #[inline]
    pub fn level_id(&self, name: &str) -> Option<LevelId> {
        self.by_name.get(name).copied()
    }

    pub fn levels(&self) -> impl DoubleEndedIterator<Item = (LevelId, &Level)> + '_ {
        self.levels.iter_with_id()
    }

    #[inline]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn node_count(&self) -> usize {
        self.levels.values().map(Level::node_count).sum()
    }

    pub fn link_count(&self) -> usize {
        self.levels
            .values()
            .map(|level| level.graph.edge_count())
            .sum()
    }

    pub fn fullname(&self, node_ref: NodeRef) -> String {
        self.levels[node_ref.level].fullname(node_ref.node)
    }

    /// Resolves `path` seen from `level_id`: a node of the level itself or a
    /// node of one of its direct subnets.
    pub fn locate(&self, level_id: LevelId, path: &NodePath) -> Option<NodeRef> {
        let level = &self.levels[level_id];
        let owner = if path.level == level.name {
            level_id
        } else {
            level.subnet(&path.level)?
        };

        self.levels[owner]
            .node_id(&path.name)
            .map(|node_id| NodeRef::new(owner, node_id))
    }

    pub fn path(&self, node_ref: NodeRef) -> NodePath {
        NodePath::new(
            self.levels[node_ref.level].name.as_str(),
            self.levels[node_ref.level][node_ref.node].name.as_str(),
        )
    }

    /// Visits `level_id` and its subnets depth first, parents before children.
    pub fn walk_tree(&self, level_id: LevelId, f: &mut impl FnMut(LevelId, &Level)) {
        let level = &self.levels[level_id];
        f(level_id, level);
        for (_, subnet) in level.subnets() {
            self.walk_tree(subnet, f);
        }
    }
}

impl Display for Netlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Levels:{} Nodes:{} Links:{}",
            self.level_count(),
            self.node_count(),
            self.link_count()
        )
    }
}
