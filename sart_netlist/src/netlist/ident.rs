use std::fmt::{self, Display};

use sart_data_structures::{idx_ty, index::IndexType};
use serde::{Deserialize, Serialize};

idx_ty!(LevelId);
idx_ty!(NodeId);
idx_ty!(EdgeId);

/// A node addressed across the hierarchy: the owning level and the node's
/// index inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef {
    pub level: LevelId,
    pub node: NodeId,
}

impl NodeRef {
    #[inline]
    pub fn new(level: LevelId, node: NodeId) -> Self {
        Self { level, node }
    }
}

impl Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {})", self.level.as_u32(), self.node.as_u32())
    }
}

/// A node addressed by name, `level/name` once printed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath {
    pub level: String,
    pub name: String,
}

impl NodePath {
    pub fn new(level: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            name: name.into(),
        }
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.level, self.name)
    }
}
