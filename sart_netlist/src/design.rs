//! Per-module descriptions of ports, instances and connections as produced by
//! the netlist parser.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use sart_data_structures::FxIndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Direction {
    Input,
    Output,
    Inout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDecl {
    pub name: String,
    pub direction: Direction,
    pub position: usize,
}

/// Pin `position` of an instance tied to the signal `actual` of the
/// instantiating module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub position: usize,
    pub actual: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub is_prim: bool,
    #[serde(default)]
    pub is_seq: bool,
    #[serde(default)]
    pub conns: Vec<Connection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDesc {
    pub name: String,
    #[serde(default)]
    pub ports: Vec<PortDecl>,
    #[serde(default)]
    pub insts: Vec<Instance>,
}

impl ModuleDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ports: Vec::new(),
            insts: Vec::new(),
        }
    }

    pub fn port(mut self, name: impl Into<String>, direction: Direction) -> Self {
        let position = self.ports.len();
        self.ports.push(PortDecl {
            name: name.into(),
            direction,
            position,
        });
        self
    }

    pub fn inst(mut self, inst: Instance) -> Self {
        self.insts.push(inst);
        self
    }

    /// Ports sorted by declared position.
    pub fn ordered_ports(&self) -> Vec<&PortDecl> {
        let mut ports = self.ports.iter().collect::<Vec<_>>();
        ports.sort_by_key(|port| port.position);
        ports
    }
}

impl Instance {
    pub fn prim(name: impl Into<String>, ty: impl Into<String>, is_seq: bool) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            is_prim: true,
            is_seq,
            conns: Vec::new(),
        }
    }

    pub fn module(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            is_prim: false,
            is_seq: false,
            conns: Vec::new(),
        }
    }

    /// Connects the next pin to `actual`.
    pub fn conn(mut self, actual: impl Into<String>, direction: Direction) -> Self {
        let position = self.conns.len();
        self.conns.push(Connection {
            position,
            actual: actual.into(),
            direction,
        });
        self
    }
}

/// Lookup of module descriptions by module name.
pub trait ModuleSource {
    fn module(&self, name: &str) -> Result<&ModuleDesc>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Design {
    modules: FxIndexMap<String, ModuleDesc>,
}

impl Design {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: ModuleDesc) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn with(mut self, module: ModuleDesc) -> Self {
        self.add(module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleDesc> + '_ {
        self.modules.values()
    }

    /// Reads a JSON list of module descriptions.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let modules: Vec<ModuleDesc> = serde_json::from_reader(reader)?;
        Ok(modules.into_iter().collect())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl FromIterator<ModuleDesc> for Design {
    fn from_iter<I: IntoIterator<Item = ModuleDesc>>(iter: I) -> Self {
        let mut design = Self::new();
        for module in iter {
            design.add(module);
        }
        design
    }
}

impl ModuleSource for Design {
    fn module(&self, name: &str) -> Result<&ModuleDesc> {
        self.modules
            .get(name)
            .ok_or_else(|| Error::MissingModule(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_names() {
        assert_eq!(Direction::Inout.to_string(), "INOUT");
        assert_eq!("OUTPUT".parse::<Direction>().unwrap(), Direction::Output);
        assert_eq!(
            serde_json::to_string(&Direction::Input).unwrap(),
            "\"INPUT\""
        );
    }

    #[test]
    fn ordered_ports() {
        let mut module = ModuleDesc::new("m");
        module.ports = vec![
            PortDecl {
                name: "b".into(),
                direction: Direction::Output,
                position: 1,
            },
            PortDecl {
                name: "a".into(),
                direction: Direction::Input,
                position: 0,
            },
        ];

        let names = module
            .ordered_ports()
            .into_iter()
            .map(|port| port.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn from_json() {
        let json = r#"[
            {
                "name": "top",
                "ports": [{"name": "i", "direction": "INPUT", "position": 0}],
                "insts": [{
                    "name": "x0",
                    "type": "inv",
                    "is_prim": true,
                    "conns": [{"position": 0, "actual": "i", "direction": "INPUT"}]
                }]
            }
        ]"#;

        let design = Design::from_reader(json.as_bytes()).unwrap();
        let top = design.module("top").unwrap();

        assert_eq!(top.insts[0].ty, "inv");
        assert!(top.insts[0].is_prim);
        assert!(!top.insts[0].is_seq);
        assert!(matches!(
            design.module("missing"),
            Err(Error::MissingModule(name)) if name == "missing"
        ));
    }
}
