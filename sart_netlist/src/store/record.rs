use serde::{Deserialize, Serialize};

use crate::{
    netlist::{LevelId, Netlist, NodePath},
    node::Node,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub from: NodePath,
    pub to: NodePath,
}

/// Self-contained form of one level. Links refer to their ends by name, so a
/// record can be written before its subnets are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub name: String,
    pub module: String,
    pub depth: usize,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
    #[serde(default)]
    pub subnets: Vec<String>,
}

impl Netlist {
    pub fn record(&self, level_id: LevelId) -> LevelRecord {
        let level = &self[level_id];

        LevelRecord {
            name: level.name.clone(),
            module: level.module.clone(),
            depth: level.depth,
            nodes: level.nodes().map(|(_, node)| node.clone()).collect(),
            links: level
                .graph
                .edges()
                .map(|(_, edge)| LinkRecord {
                    from: self.path(edge.from),
                    to: self.path(edge.to),
                })
                .collect(),
            subnets: level.subnets().map(|(name, _)| name.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builder::Builder,
        design::{Design, Direction, Instance, ModuleDesc},
    };

    #[test]
    fn record_of_level() {
        let design = Design::new()
            .with(
                ModuleDesc::new("top").port("i", Direction::Input).inst(
                    Instance::module("u0", "sub").conn("i", Direction::Input),
                ),
            )
            .with(ModuleDesc::new("sub").port("a", Direction::Input));
        let netlist = Builder::new(&design, 1).build("top").unwrap();

        let record = netlist.record(netlist.top().unwrap());

        assert_eq!(record.name, "top");
        assert_eq!(record.nodes.len(), 1);
        assert_eq!(record.subnets, ["top/u0"]);
        assert_eq!(
            record.links,
            [LinkRecord {
                from: NodePath::new("top", "i"),
                to: NodePath::new("top/u0", "a"),
            }]
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json["links"][0],
            serde_json::json!({
                "from": {"level": "top", "name": "i"},
                "to": {"level": "top/u0", "name": "a"},
            })
        );
        assert_eq!(json["nodes"][0]["rp_ace"], "00");
    }
}
