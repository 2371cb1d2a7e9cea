use std::{sync::Arc, time::Instant};

use sart_netlist::{
    ace::{AceMarker, AceRules, MarkCounts},
    builder::Builder,
    cfg::SartCfg,
    design::ModuleSource,
    stats::LevelStats,
    store::{LevelStore, SaveQueue, StoredNodes},
    walk::Convergence,
    Error, Netlist, Result,
};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReport {
    /// Levels written by the build, `None` if the build was skipped.
    pub built: Option<usize>,
    pub marks: MarkCounts,
    pub convergence: Option<Convergence>,
    /// Nodes touched by propagation and written back.
    pub updated: usize,
    pub stats: Option<LevelStats>,
}

/// Build, mark, load, walk and report, in that order, over one store.
pub struct Flow {
    cfg: SartCfg,
    rules: AceRules,
    store: Arc<dyn LevelStore>,
}

impl Flow {
    pub fn new(cfg: SartCfg, rules: AceRules, store: Arc<dyn LevelStore>) -> Self {
        Self { cfg, rules, store }
    }

    pub fn cfg(&self) -> &SartCfg {
        &self.cfg
    }

    pub fn rules(&self) -> &AceRules {
        &self.rules
    }

    fn queue(&self) -> SaveQueue {
        SaveQueue::new(self.store.clone(), self.cfg.workers, self.cfg.queue_depth)
    }

    /// Runs every phase for the hierarchy under `top`. `source` is only
    /// needed when building.
    pub fn run(
        &self,
        source: Option<&dyn ModuleSource>,
        top: &str,
    ) -> Result<(Netlist, FlowReport)> {
        let marker = AceMarker::new(&self.rules)?;

        let built = if self.cfg.skip_build {
            None
        } else {
            let source = source.ok_or(Error::MissingDesign)?;
            Some(self.build(source, top)?)
        };

        let start = Instant::now();
        let marks = marker.run(&mut StoredNodes(self.store.as_ref()))?;
        info!(
            "Reset {} nodes, marked {} nodes. Elapsed: {:?}",
            marks.reset,
            marks.marked,
            start.elapsed()
        );

        let start = Instant::now();
        let mut netlist = Netlist::load(self.store.as_ref(), top, self.cfg.workers)?;
        info!("Netlist loaded. Elapsed: {:?}", start.elapsed());

        let (convergence, updated) = if self.cfg.skip_walk {
            (None, 0)
        } else {
            let start = Instant::now();
            let convergence = netlist.converge()?;
            info!("Walks done. Elapsed: {:?}", start.elapsed());

            let queue = self.queue();
            let updated = netlist.update(&queue)?;
            queue.finish()?;
            (Some(convergence), updated)
        };

        let stats = netlist.stats_tree(&self.rules)?;

        Ok((
            netlist,
            FlowReport {
                built,
                marks,
                convergence,
                updated,
                stats,
            },
        ))
    }

    fn build(&self, source: &dyn ModuleSource, top: &str) -> Result<usize> {
        let start = Instant::now();
        let queue = self.queue();

        Builder::new(source, self.rules.len())
            .with_queue(&queue)
            .build(top)?;
        let saved = queue.finish()?;

        info!("Netlist built. Elapsed: {:?}", start.elapsed());
        Ok(saved)
    }
}
