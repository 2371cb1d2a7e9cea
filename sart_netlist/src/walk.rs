//! Fixed-point propagation of ACE markers through the hierarchy.
//!
//! A downward walk carries read-port markers along links, an upward walk
//! carries write-port markers along reverse links. Markers only ever
//! accumulate, so a node can change at most once per rule and repeated walks
//! reach a state where nothing changes.

use std::{
    collections::VecDeque,
    fmt::{self, Display},
};

use sart_data_structures::bit_field::BitField;
use tracing::{info, trace};

use crate::{
    netlist::{EdgeDir, Incoming, Level, LevelId, Netlist, NodeId, NodeRef, Outgoing},
    node::Node,
    Result,
};

/// One propagation direction.
pub trait Sweep {
    type Dir: EdgeDir;

    const NAME: &'static str;

    fn field(node: &Node) -> &BitField;

    fn field_mut(node: &mut Node) -> &mut BitField;

    /// Ports through which markers enter a level from its parent.
    fn entries(level: &Level) -> [&[NodeId]; 2];

    /// Ports through which markers leave a level, to its parent and to their
    /// own fan-out.
    fn exits(level: &Level) -> [&[NodeId]; 2];
}

pub struct Down;

impl Sweep for Down {
    type Dir = Outgoing;

    const NAME: &'static str = "Dn";

    #[inline]
    fn field(node: &Node) -> &BitField {
        &node.rp_ace
    }

    #[inline]
    fn field_mut(node: &mut Node) -> &mut BitField {
        &mut node.rp_ace
    }

    fn entries(level: &Level) -> [&[NodeId]; 2] {
        [level.inputs(), level.inouts()]
    }

    fn exits(level: &Level) -> [&[NodeId]; 2] {
        [level.outputs(), level.inouts()]
    }
}

pub struct Up;

impl Sweep for Up {
    type Dir = Incoming;

    const NAME: &'static str = "Up";

    #[inline]
    fn field(node: &Node) -> &BitField {
        &node.wp_ace
    }

    #[inline]
    fn field_mut(node: &mut Node) -> &mut BitField {
        &mut node.wp_ace
    }

    fn entries(level: &Level) -> [&[NodeId]; 2] {
        [level.outputs(), level.inouts()]
    }

    fn exits(level: &Level) -> [&[NodeId]; 2] {
        [level.inputs(), level.inouts()]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Convergence {
    /// Walks made, the last of which changed nothing.
    pub passes: usize,
    pub changed: usize,
}

impl Display for Convergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "converged after {} passes, {} nodes changed",
            self.passes, self.changed
        )
    }
}

impl Netlist {
    /// Walks until a pass changes no node.
    pub fn converge(&mut self) -> Result<Convergence> {
        let mut convergence = Convergence::default();
        loop {
            convergence.passes += 1;
            let changed = self.walk()?;
            convergence.changed += changed;
            if changed == 0 {
                break;
            }
        }

        info!("Walk {convergence}");
        Ok(convergence)
    }

    /// One downward and one upward pass over the whole hierarchy. Returns the
    /// number of node changes; a single pass is not enough to reach the fixed
    /// point, see [`Netlist::converge`].
    pub fn walk(&mut self) -> Result<usize> {
        let dn = self.walk_dn()?;
        let up = self.walk_up()?;
        Ok(dn + up)
    }

    pub fn walk_dn(&mut self) -> Result<usize> {
        self.walk_top::<Down>()
    }

    pub fn walk_up(&mut self) -> Result<usize> {
        self.walk_top::<Up>()
    }

    fn walk_top<S: Sweep>(&mut self) -> Result<usize> {
        let changed = match self.top() {
            Some(top) => self.walk_level::<S>(top)?,
            None => 0,
        };
        info!("{} walk changed {changed} nodes", S::NAME);
        Ok(changed)
    }

    fn walk_level<S: Sweep>(&mut self, level_id: LevelId) -> Result<usize> {
        let mut changed = 0;

        let level = &self[level_id];
        let sources = level
            .nodes()
            .filter(|(_, node)| node.is_ace)
            .map(|(node_id, _)| NodeRef::new(level_id, node_id))
            .collect::<Vec<_>>();
        let entries = S::entries(level)
            .into_iter()
            .flatten()
            .filter(|node_id| {
                let node = &level[**node_id];
                !node.is_ace && !S::field(node).all_unset()
            })
            .map(|node_id| NodeRef::new(level_id, *node_id))
            .collect::<Vec<_>>();
        let subnets = level.subnets.values().copied().collect::<Vec<_>>();

        for source in sources.into_iter().chain(entries) {
            changed += self.relay::<S>(level_id, source)?;
        }

        for subnet_id in subnets {
            changed += self.walk_level::<S>(subnet_id)?;

            let subnet = &self[subnet_id];
            let exits = S::exits(subnet)
                .into_iter()
                .flatten()
                .filter(|node_id| !S::field(&subnet[**node_id]).all_unset())
                .map(|node_id| NodeRef::new(subnet_id, *node_id))
                .collect::<Vec<_>>();

            for exit in exits {
                changed += self.relay::<S>(level_id, exit)?;
            }
        }

        // exits can also fan out inside their own level
        let level = &self[level_id];
        let exits = S::exits(level)
            .into_iter()
            .flatten()
            .filter(|node_id| {
                let node = &level[**node_id];
                !node.is_ace && !S::field(node).all_unset()
            })
            .map(|node_id| NodeRef::new(level_id, *node_id))
            .collect::<Vec<_>>();

        for exit in exits {
            changed += self.relay::<S>(level_id, exit)?;
        }

        Ok(changed)
    }

    /// Propagates the markers of `source` to each of its neighbours in
    /// `level_id`.
    fn relay<S: Sweep>(&mut self, level_id: LevelId, source: NodeRef) -> Result<usize> {
        let bits = S::field(&self[source]).clone();
        let targets = self[level_id]
            .graph
            .adjacent::<S::Dir>(source)
            .collect::<Vec<_>>();

        let mut changed = 0;
        for target in targets {
            changed += self.propagate::<S>(level_id, target, &bits)?;
        }
        Ok(changed)
    }

    /// Breadth-first merge of `bits` starting at `start`. ACE nodes absorb
    /// and are left as they are. A node that already holds every bit ends the
    /// branch. A port that changes ends it too; [`Netlist::walk_level`]
    /// resumes it later as an entry or exit.
    fn propagate<S: Sweep>(
        &mut self,
        level_id: LevelId,
        start: NodeRef,
        bits: &BitField,
    ) -> Result<usize> {
        let mut changed = 0;
        let mut queue = VecDeque::from([start]);

        while let Some(node_ref) = queue.pop_front() {
            let node = &mut self[node_ref];
            if node.is_ace || !S::field_mut(node).set_bits_of(bits)? {
                continue;
            }

            changed += 1;
            let is_port = node.is_port();
            trace!("{} {} <- {bits}", S::NAME, self.fullname(node_ref));

            if !is_port {
                queue.extend(self[level_id].graph.adjacent::<S::Dir>(node_ref));
            }
        }

        Ok(changed)
    }

    /// Propagates the read-port markers of `source` from `start` along the
    /// links of `level_id`.
    pub fn prop_dn(
        &mut self,
        level_id: LevelId,
        start: NodeRef,
        source: NodeRef,
    ) -> Result<usize> {
        let bits = Down::field(&self[source]).clone();
        self.propagate::<Down>(level_id, start, &bits)
    }

    /// Propagates the write-port markers of `source` from `start` along the
    /// reverse links of `level_id`.
    pub fn prop_up(
        &mut self,
        level_id: LevelId,
        start: NodeRef,
        source: NodeRef,
    ) -> Result<usize> {
        let bits = Up::field(&self[source]).clone();
        self.propagate::<Up>(level_id, start, &bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ace::{AceMarker, AceRule, AceRules, Selector},
        builder::Builder,
        design::{Design, Direction, Instance, ModuleDesc},
    };

    fn marked(design: &Design, top: &str, rules: &AceRules) -> Netlist {
        let mut netlist = Builder::new(design, rules.len()).build(top).unwrap();
        AceMarker::new(rules).unwrap().run(&mut netlist).unwrap();
        netlist
    }

    fn rule(module: &str, name: &str) -> AceRule {
        AceRule::new(Selector::any().module(module).name(name), 1.0, 1.0)
    }

    fn node<'n>(netlist: &'n Netlist, level: &str, name: &str) -> &'n Node {
        let level_id = netlist.level_id(level).unwrap();
        &netlist[level_id][netlist[level_id].node_id(name).unwrap()]
    }

    fn sub() -> ModuleDesc {
        ModuleDesc::new("sub")
            .port("a", Direction::Input)
            .port("y", Direction::Output)
            .inst(
                Instance::prim("ff", "dff", true)
                    .conn("a", Direction::Input)
                    .conn("y", Direction::Output),
            )
    }

    #[test]
    fn seq_between_ports() {
        let design = Design::new().with(
            ModuleDesc::new("top")
                .port("in", Direction::Input)
                .port("out", Direction::Output)
                .inst(
                    Instance::prim("ff", "dff", true)
                        .conn("in", Direction::Input)
                        .conn("out", Direction::Output),
                ),
        );
        let rules = [AceRule::new(Selector::any().name("^out$"), 0.5, 0.8)]
            .into_iter()
            .collect::<AceRules>();
        let mut netlist = marked(&design, "top", &rules);

        let convergence = netlist.converge().unwrap();

        assert_eq!(
            convergence,
            Convergence {
                passes: 2,
                changed: 2
            }
        );
        let ff = node(&netlist, "top", "ff");
        assert!(ff.rp_ace.all_unset());
        assert_eq!(ff.wp_ace.test(), vec![0]);
        assert_eq!(node(&netlist, "top", "in").wp_ace.test(), vec![0]);
        assert!(node(&netlist, "top", "in").rp_ace.all_unset());
    }

    #[test]
    fn markers_cross_subnet_boundaries() {
        let design = Design::new()
            .with(
                ModuleDesc::new("top")
                    .port("i", Direction::Input)
                    .port("o", Direction::Output)
                    .inst(
                        Instance::module("u0", "sub")
                            .conn("i", Direction::Input)
                            .conn("o", Direction::Output),
                    ),
            )
            .with(sub());
        let rules = [rule("^top$", "^i$"), rule("^top$", "^o$")]
            .into_iter()
            .collect::<AceRules>();
        let mut netlist = marked(&design, "top", &rules);

        netlist.converge().unwrap();

        for name in ["a", "ff", "y"] {
            let node = node(&netlist, "top/u0", name);
            assert_eq!(node.rp_ace.test(), vec![0], "{name}");
            assert_eq!(node.wp_ace.test(), vec![1], "{name}");
        }
        // sources keep their own bits only
        assert_eq!(node(&netlist, "top", "o").rp_ace.test(), vec![1]);
        assert_eq!(node(&netlist, "top", "i").wp_ace.test(), vec![0]);
    }

    #[test]
    fn late_subnet_needs_another_pass() {
        // u1 feeds u0, but u0 is walked first
        let design = Design::new()
            .with(
                ModuleDesc::new("top")
                    .port("i", Direction::Input)
                    .port("o", Direction::Output)
                    .inst(
                        Instance::module("u0", "sub")
                            .conn("n", Direction::Input)
                            .conn("o", Direction::Output),
                    )
                    .inst(
                        Instance::module("u1", "sub")
                            .conn("i", Direction::Input)
                            .conn("n", Direction::Output),
                    ),
            )
            .with(sub());
        let rules = [rule("^top$", "^i$")].into_iter().collect::<AceRules>();
        let mut netlist = marked(&design, "top", &rules);

        assert_eq!(netlist.walk().unwrap(), 5);
        assert!(node(&netlist, "top/u0", "ff").rp_ace.all_unset());
        assert_eq!(netlist.walk().unwrap(), 3);
        assert_eq!(netlist.walk().unwrap(), 0);

        assert_eq!(node(&netlist, "top/u0", "ff").rp_ace.test(), vec![0]);
        assert_eq!(node(&netlist, "top", "o").rp_ace.test(), vec![0]);
    }

    #[test]
    fn converge_counts_passes() {
        let design = Design::new()
            .with(
                ModuleDesc::new("top")
                    .port("i", Direction::Input)
                    .port("o", Direction::Output)
                    .inst(
                        Instance::module("u0", "sub")
                            .conn("n", Direction::Input)
                            .conn("o", Direction::Output),
                    )
                    .inst(
                        Instance::module("u1", "sub")
                            .conn("i", Direction::Input)
                            .conn("n", Direction::Output),
                    ),
            )
            .with(sub());
        let rules = [rule("^top$", "^i$")].into_iter().collect::<AceRules>();
        let mut netlist = marked(&design, "top", &rules);

        assert_eq!(
            netlist.converge().unwrap(),
            Convergence {
                passes: 3,
                changed: 8
            }
        );
        // one more walk after the fixed point is a no-op
        assert_eq!(netlist.walk().unwrap(), 0);
    }

    #[test]
    fn output_port_with_local_fanout() {
        let design = Design::new().with(
            ModuleDesc::new("top")
                .port("i", Direction::Input)
                .port("o", Direction::Output)
                .inst(
                    Instance::prim("x0", "buf", false)
                        .conn("i", Direction::Input)
                        .conn("o", Direction::Output),
                )
                .inst(
                    Instance::prim("ff", "dff", true)
                        .conn("o", Direction::Input)
                        .conn("q", Direction::Output),
                ),
        );
        let rules = [rule("", "^i$")].into_iter().collect::<AceRules>();
        let mut netlist = marked(&design, "top", &rules);

        assert_eq!(
            netlist.converge().unwrap(),
            Convergence {
                passes: 2,
                changed: 4
            }
        );
        for name in ["x0", "o", "ff", "q"] {
            assert_eq!(node(&netlist, "top", name).rp_ace.test(), vec![0], "{name}");
        }
    }

    #[test]
    fn registered_output_read_back_in_subnet() {
        let design = Design::new()
            .with(
                ModuleDesc::new("top")
                    .port("i", Direction::Input)
                    .port("o", Direction::Output)
                    .inst(
                        Instance::module("u0", "reg")
                            .conn("i", Direction::Input)
                            .conn("o", Direction::Output),
                    ),
            )
            .with(
                ModuleDesc::new("reg")
                    .port("d", Direction::Input)
                    .port("q", Direction::Output)
                    .inst(
                        Instance::prim("ff", "dff", true)
                            .conn("d", Direction::Input)
                            .conn("q", Direction::Output),
                    )
                    .inst(
                        Instance::prim("fb", "inv", false)
                            .conn("q", Direction::Input)
                            .conn("n", Direction::Output),
                    ),
            );
        let rules = [rule("^top$", "^i$"), rule("^top$", "^o$")]
            .into_iter()
            .collect::<AceRules>();
        let mut netlist = marked(&design, "top", &rules);

        netlist.converge().unwrap();

        assert_eq!(node(&netlist, "top/u0", "fb").rp_ace.test(), vec![0]);
        assert_eq!(node(&netlist, "top/u0", "n").rp_ace.test(), vec![0]);
        assert!(node(&netlist, "top/u0", "fb").wp_ace.all_unset());
        assert_eq!(node(&netlist, "top/u0", "ff").wp_ace.test(), vec![1]);
        assert_eq!(netlist.walk().unwrap(), 0);
    }

    #[test]
    fn combinational_cycle_terminates() {
        let design = Design::new().with(
            ModuleDesc::new("top")
                .port("i", Direction::Input)
                .inst(
                    Instance::prim("x0", "nand", false)
                        .conn("i", Direction::Input)
                        .conn("n0", Direction::Output)
                        .conn("n1", Direction::Input),
                )
                .inst(
                    Instance::prim("x1", "inv", false)
                        .conn("n0", Direction::Input)
                        .conn("n1", Direction::Output),
                ),
        );
        let rules = [rule("", "^i$")].into_iter().collect::<AceRules>();
        let mut netlist = marked(&design, "top", &rules);

        assert_eq!(
            netlist.converge().unwrap(),
            Convergence {
                passes: 2,
                changed: 4
            }
        );
        for name in ["x0", "n0", "x1", "n1"] {
            assert_eq!(node(&netlist, "top", name).rp_ace.test(), vec![0], "{name}");
        }
    }

    #[test]
    fn ace_nodes_absorb() {
        let chain = Design::new().with(
            ModuleDesc::new("top")
                .port("i", Direction::Input)
                .port("o", Direction::Output)
                .inst(
                    Instance::prim("x0", "buf", false)
                        .conn("i", Direction::Input)
                        .conn("n0", Direction::Output),
                )
                .inst(
                    Instance::prim("x1", "buf", false)
                        .conn("n0", Direction::Input)
                        .conn("n1", Direction::Output),
                )
                .inst(
                    Instance::prim("x2", "buf", false)
                        .conn("n1", Direction::Input)
                        .conn("o", Direction::Output),
                ),
        );
        let rules = [rule("", "^i$"), rule("", "^x1$")]
            .into_iter()
            .collect::<AceRules>();
        let mut netlist = marked(&chain, "top", &rules);

        netlist.converge().unwrap();

        let x1 = node(&netlist, "top", "x1");
        assert_eq!(x1.rp_ace.test(), vec![1]);
        assert_eq!(x1.wp_ace.test(), vec![1]);
        assert_eq!(node(&netlist, "top", "n0").rp_ace.test(), vec![0]);
        assert_eq!(node(&netlist, "top", "n0").wp_ace.test(), vec![1]);
        assert_eq!(node(&netlist, "top", "n1").rp_ace.test(), vec![1]);
        assert_eq!(node(&netlist, "top", "o").rp_ace.test(), vec![1]);
        assert_eq!(node(&netlist, "top", "i").wp_ace.test(), vec![0]);
    }

    #[test]
    fn prop_dn_from_source() {
        let design = Design::new().with(
            ModuleDesc::new("top").port("i", Direction::Input).inst(
                Instance::prim("x0", "buf", false)
                    .conn("i", Direction::Input)
                    .conn("n0", Direction::Output),
            ),
        );
        let rules = [rule("", "^i$")].into_iter().collect::<AceRules>();
        let mut netlist = marked(&design, "top", &rules);
        let top = netlist.top().unwrap();
        let i = NodeRef::new(top, netlist[top].node_id("i").unwrap());
        let x0 = NodeRef::new(top, netlist[top].node_id("x0").unwrap());

        assert_eq!(netlist.prop_dn(top, x0, i).unwrap(), 2);
        assert_eq!(netlist.prop_dn(top, x0, i).unwrap(), 0);
        // starting at an ACE node does nothing
        assert_eq!(netlist.prop_up(top, i, x0).unwrap(), 0);
    }
}
