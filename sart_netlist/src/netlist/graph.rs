use sart_data_structures::{index_storage::IndexStorage, FxHashMap};
use smallvec::SmallVec;

use super::{EdgeId, NodeRef};

pub trait EdgeDir {
    const IDX: usize;

    /// The end of `edge` reached when moving in this direction.
    fn target(edge: &Edge) -> NodeRef;
}

/// From driver to load, along links.
pub struct Outgoing;

impl EdgeDir for Outgoing {
    const IDX: usize = 0;

    #[inline]
    fn target(edge: &Edge) -> NodeRef {
        edge.to
    }
}

/// From load to driver, along reverse links.
pub struct Incoming;

impl EdgeDir for Incoming {
    const IDX: usize = 1;

    #[inline]
    fn target(edge: &Edge) -> NodeRef {
        edge.from
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeRef,
    pub to: NodeRef,
}

type Adjacency = FxHashMap<NodeRef, SmallVec<[EdgeId; 2]>>;

/// Edges of one level. The edge list is authoritative, the per-node forward and
/// reverse lists only index into it and are written together in `connect`.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    edges: IndexStorage<EdgeId, Edge>,
    adj: [Adjacency; 2],
}

impl Graph {
    pub fn connect(&mut self, from: NodeRef, to: NodeRef) -> EdgeId {
        let edge_id = self.edges.push(Edge { from, to });
        self.adj[Outgoing::IDX].entry(from).or_default().push(edge_id);
        self.adj[Incoming::IDX].entry(to).or_default().push(edge_id);
        edge_id
    }

    pub fn adjacent<D: EdgeDir>(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        self.adj[D::IDX]
            .get(&node)
            .into_iter()
            .flatten()
            .map(|edge_id| D::target(&self.edges[*edge_id]))
    }

    #[inline]
    pub fn links(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        self.adjacent::<Outgoing>(node)
    }

    #[inline]
    pub fn rlinks(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        self.adjacent::<Incoming>(node)
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges.iter_with_id()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of distinct drivers.
    #[inline]
    pub fn driver_count(&self) -> usize {
        self.adj[Outgoing::IDX].len()
    }
}

#[cfg(test)]
mod tests {
    use sart_data_structures::index::IndexType;

    use super::*;
    use crate::netlist::{LevelId, NodeId};

    fn node(level: u32, node: u32) -> NodeRef {
        NodeRef::new(LevelId::new(level), NodeId::new(node))
    }

    #[test]
    fn links_and_rlinks_agree() {
        let mut graph = Graph::default();
        let (a, b, c) = (node(0, 0), node(0, 1), node(1, 0));

        graph.connect(a, b);
        graph.connect(a, c);
        graph.connect(b, c);

        assert_eq!(graph.links(a).collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(graph.rlinks(c).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(graph.links(c).count(), 0);
        assert_eq!(graph.driver_count(), 2);

        for (_, edge) in graph.edges() {
            assert!(graph.links(edge.from).any(|to| to == edge.to));
            assert!(graph.rlinks(edge.to).any(|from| from == edge.from));
        }
    }

    #[test]
    fn multi_edges_are_kept() {
        let mut graph = Graph::default();
        let (a, b) = (node(0, 0), node(0, 1));

        graph.connect(a, b);
        graph.connect(a, b);

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.links(a).collect::<Vec<_>>(), vec![b, b]);
        assert_eq!(graph.rlinks(b).collect::<Vec<_>>(), vec![a, a]);
    }
}
