pub mod ace;
pub mod builder;
pub mod cfg;
pub mod design;
pub mod error;
pub mod netlist;
pub mod node;
pub mod stats;
pub mod store;
pub mod walk;

pub use crate::{
    error::{Error, Result},
    netlist::{Level, LevelId, Netlist, NodeId, NodeRef},
    node::{Node, NodeKind},
};
