use std::thread;

use tracing::{debug, info};

use super::{LevelRecord, LevelStore, LinkRecord, SaveQueue};
use crate::{
    ace::NodePopulation,
    netlist::{Level, LevelId, Netlist, NodePath, NodeRef},
    node::Node,
    Error, Result,
};

/// The nodes of every record in a store. Each record is loaded, handed over
/// node by node and saved back.
pub struct StoredNodes<'s>(pub &'s dyn LevelStore);

impl NodePopulation for StoredNodes<'_> {
    fn try_for_each_node(
        &mut self,
        f: &mut dyn FnMut(&str, &mut Node) -> Result<()>,
    ) -> Result<()> {
        for name in self.0.level_names()? {
            let mut record = self.0.load(&name)?;
            for node in &mut record.nodes {
                f(&record.name, node)?;
            }
            self.0.save(&record)?;
        }
        Ok(())
    }
}

/// Loads the records named in `frontier` with up to `workers` threads,
/// keeping the frontier's order.
fn fetch(
    store: &dyn LevelStore,
    frontier: &[(String, Option<LevelId>)],
    workers: usize,
) -> Result<Vec<LevelRecord>> {
    let chunk_size = (frontier.len() + workers - 1) / workers;
    if chunk_size == 0 {
        return Ok(vec![]);
    }

    thread::scope(|s| {
        let handles = frontier
            .chunks(chunk_size)
            .map(|chunk| {
                s.spawn(move || {
                    chunk
                        .iter()
                        .map(|(name, _)| store.load(name))
                        .collect::<Result<Vec<_>>>()
                })
            })
            .collect::<Vec<_>>();

        let mut records = Vec::with_capacity(frontier.len());
        for handle in handles {
            let chunk = handle
                .join()
                .map_err(|_| Error::StoreWorker("loader panicked".into()))??;
            records.extend(chunk);
        }
        Ok(records)
    })
}

impl Netlist {
    /// Rebuilds the hierarchy under `top` from `store`.
    ///
    /// Levels are read breadth first, one depth at a time. Links are resolved
    /// only once every level has been read, since a link may point into a
    /// subnet.
    pub fn load(store: &dyn LevelStore, top: &str, workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let mut netlist = Netlist::new();
        let mut links: Vec<(LevelId, Vec<LinkRecord>)> = vec![];
        let mut frontier = vec![(top.to_string(), None)];

        while !frontier.is_empty() {
            let records = fetch(store, &frontier, workers)?;
            let mut next = vec![];

            for (record, (_, parent)) in records.into_iter().zip(frontier) {
                let LevelRecord {
                    name,
                    module,
                    depth,
                    nodes,
                    links: level_links,
                    subnets,
                } = record;

                let level_id = netlist.add_level(Level::new(name.clone(), module, depth, parent));
                for node in nodes {
                    netlist[level_id].add_node(node)?;
                }
                if let Some(parent) = parent {
                    netlist[parent].subnets.insert(name, level_id);
                }

                links.push((level_id, level_links));
                next.extend(subnets.into_iter().map(|subnet| (subnet, Some(level_id))));
            }

            debug!("Loaded {} levels", netlist.level_count());
            frontier = next;
        }

        for (level_id, level_links) in links {
            for LinkRecord { from, to } in level_links {
                let from = netlist.resolve(level_id, &from)?;
                let to = netlist.resolve(level_id, &to)?;
                netlist[level_id].connect(from, to);
            }
        }

        info!("Loaded {netlist}");
        Ok(netlist)
    }

    fn resolve(&self, level_id: LevelId, path: &NodePath) -> Result<NodeRef> {
        self.locate(level_id, path)
            .ok_or_else(|| Error::UnresolvedLink(path.to_string()))
    }

    /// Queues every level holding a node touched by propagation for saving.
    /// Returns the number of such nodes.
    pub fn update(&self, queue: &SaveQueue) -> Result<usize> {
        let mut count = 0;
        for (level_id, level) in self.levels() {
            let touched = level.nodes().filter(|(_, node)| node.is_touched()).count();
            if touched != 0 {
                queue.enqueue(self.record(level_id))?;
                count += touched;
            }
        }

        info!("Updated {count} nodes");
        Ok(count)
    }
}
