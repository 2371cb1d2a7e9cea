use std::io;

use sart_data_structures::bit_field::BitFieldError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    BitField(#[from] BitFieldError),
    #[error("cannot find module '{0}'")]
    MissingModule(String),
    #[error("module '{0}' instantiates itself")]
    RecursiveModule(String),
    #[error("cannot locate actual node '{level}/{name}'")]
    MissingActual { level: String, name: String },
    #[error(
        "seeking port position {pos} in subnet '{subnet}' of '{level}', available ports: {count}"
    )]
    PortPosOutOfRange {
        pos: usize,
        subnet: String,
        level: String,
        count: usize,
    },
    #[error("node '{0}' already exists")]
    DuplicateNode(String),
    #[error("no ACE rules given")]
    NoRules,
    #[error("invalid selector in ACE rule {idx}: {source}")]
    InvalidSelector {
        idx: usize,
        #[source]
        source: regex::Error,
    },
    #[error("bit {pos} of node '{node}' has no ACE rule ({count} rules)")]
    RuleOutOfRange {
        pos: usize,
        node: String,
        count: usize,
    },
    #[error("cannot find level '{0}' in store")]
    MissingLevel(String),
    #[error("no design to build netlist from")]
    MissingDesign,
    #[error("cannot resolve link end '{0}'")]
    UnresolvedLink(String),
    #[error("save queue is closed")]
    StoreClosed,
    #[error("store lock poisoned")]
    Poisoned,
    #[error("store worker failed: {0}")]
    StoreWorker(String),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
