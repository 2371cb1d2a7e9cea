use std::fmt::{self, Display};

use sart_data_structures::bit_field::BitField;
use serde::{Deserialize, Serialize};

use crate::{design::Direction, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    Port { direction: Direction },
    Prim { cell: String, is_seq: bool },
    Wire,
}

/// A port, wire or primitive instance of one hierarchy level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub is_ace: bool,
    pub rp_ace: BitField,
    pub wp_ace: BitField,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind, width: usize) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            kind,
            is_ace: false,
            rp_ace: BitField::new(width)?,
            wp_ace: BitField::new(width)?,
        })
    }

    pub fn port(name: impl Into<String>, direction: Direction, width: usize) -> Result<Self> {
        Self::new(name, NodeKind::Port { direction }, width)
    }

    pub fn prim(
        name: impl Into<String>,
        cell: impl Into<String>,
        is_seq: bool,
        width: usize,
    ) -> Result<Self> {
        Self::new(
            name,
            NodeKind::Prim {
                cell: cell.into(),
                is_seq,
            },
            width,
        )
    }

    pub fn wire(name: impl Into<String>, width: usize) -> Result<Self> {
        Self::new(name, NodeKind::Wire, width)
    }

    #[inline]
    pub fn is_port(&self) -> bool {
        matches!(self.kind, NodeKind::Port { .. })
    }

    #[inline]
    pub fn is_prim(&self) -> bool {
        matches!(self.kind, NodeKind::Prim { .. })
    }

    #[inline]
    pub fn is_wire(&self) -> bool {
        matches!(self.kind, NodeKind::Wire)
    }

    #[inline]
    pub fn is_seq(&self) -> bool {
        matches!(self.kind, NodeKind::Prim { is_seq: true, .. })
    }

    pub fn direction(&self) -> Option<Direction> {
        match self.kind {
            NodeKind::Port { direction } => Some(direction),
            _ => None,
        }
    }

    /// Port direction, `WIRE`, or the cell type of a primitive.
    pub fn ty(&self) -> &str {
        match &self.kind {
            NodeKind::Port { direction } => match direction {
                Direction::Input => "INPUT",
                Direction::Output => "OUTPUT",
                Direction::Inout => "INOUT",
            },
            NodeKind::Prim { cell, .. } => cell,
            NodeKind::Wire => "WIRE",
        }
    }

    /// Touched by propagation without being a source itself.
    pub fn is_touched(&self) -> bool {
        !self.is_ace && !(self.rp_ace.all_unset() && self.wp_ace.all_unset())
    }

    /// Drops every marker and the ACE flag, resizing to `width` bits.
    pub fn reset(&mut self, width: usize) -> Result<()> {
        self.is_ace = false;
        self.rp_ace = BitField::new(width)?;
        self.wp_ace = BitField::new(width)?;
        Ok(())
    }

    /// Makes the node a source of rule `pos`.
    pub fn mark(&mut self, pos: usize) -> Result<()> {
        self.is_ace = true;
        self.rp_ace.set([pos])?;
        self.wp_ace.set([pos])?;
        Ok(())
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            NodeKind::Port { .. } => "PORT",
            NodeKind::Prim { .. } => "PRIM",
            NodeKind::Wire => "WIRE",
        };
        write!(f, "[{kind} {}", self.name)?;
        if self.is_ace {
            f.write_str(" ACE")?;
        }
        write!(f, "] r:'{}' w:'{}'", self.rp_ace, self.wp_ace)
    }
}
