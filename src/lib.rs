pub mod flow;

pub use sart_data_structures as data_structures;
pub use sart_netlist as netlist;

pub mod prelude {
    pub use sart_data_structures::{bit_field::BitField, histogram::Histogram};
    pub use sart_netlist::{
        ace::{AceMarker, AceRule, AceRules, MarkCounts, Selector},
        builder::Builder,
        cfg::SartCfg,
        design::{Design, Direction, Instance, ModuleDesc, ModuleSource},
        stats::{Avf, LevelStats, NetStats},
        store::{DirStore, LevelStore, MemStore, SaveQueue},
        walk::Convergence,
        Error, Netlist, Result,
    };

    pub use crate::flow::{Flow, FlowReport};
}
