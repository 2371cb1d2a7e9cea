//! Persistence of built levels.
//!
//! Levels are written through a [`SaveQueue`] while the hierarchy is being
//! built and read back breadth first by [`Netlist::load`](crate::Netlist::load).

mod dir;
mod load;
mod mem;
mod queue;
mod record;

pub use dir::DirStore;
pub use load::StoredNodes;
pub use mem::MemStore;
pub use queue::SaveQueue;
pub use record::{LevelRecord, LinkRecord};

use crate::Result;

/// Storage of level records keyed by level name. Shared between the save
/// workers and the loader, hence `Send + Sync`.
pub trait LevelStore: Send + Sync {
    /// Inserts or replaces the record of `record.name`.
    fn save(&self, record: &LevelRecord) -> Result<()>;

    fn load(&self, name: &str) -> Result<LevelRecord>;

    fn level_names(&self) -> Result<Vec<String>>;
}
