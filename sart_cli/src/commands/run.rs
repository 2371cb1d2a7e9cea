use std::{path::PathBuf, sync::Arc};

use clap::Args;
use sart::prelude::*;
use tracing::info;

use super::Run;
use crate::{
    init_logger,
    output::{self, Color},
};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// JSON list of module descriptions
    #[arg(long)]
    design: Option<PathBuf>,
    /// Top module
    #[arg(long)]
    top: String,
    /// JSON list of ACE rules
    #[arg(long)]
    rules: PathBuf,
    /// Directory holding built levels, kept in memory if not given
    #[arg(long)]
    store: Option<PathBuf>,
    /// Use colors
    #[arg(long, value_enum, default_value_t = Color::Auto)]
    color: Color,
    #[command(flatten)]
    cfg: SartCfg,
}

impl Run for RunArgs {
    fn run(&self) -> anyhow::Result<()> {
        init_logger(self.color)?;

        let rules = AceRules::from_path(&self.rules)?;
        info!("Loaded {} ACE rules", rules.len());

        let design = self.design.as_ref().map(|path| Design::from_path(path)).transpose()?;
        let store: Arc<dyn LevelStore> = match &self.store {
            Some(root) => Arc::new(DirStore::new(root)?),
            None => Arc::new(MemStore::new()),
        };

        let flow = Flow::new(self.cfg.clone(), rules, store);
        let source = design.as_ref().map(|design| design as &dyn ModuleSource);
        let (netlist, report) = flow.run(source, &self.top)?;

        if let Some(saved) = report.built {
            output::status(self.color, "Built", format!("{saved} levels"));
        }
        output::status(
            self.color,
            "Marked",
            format!("{} nodes, reset {}", report.marks.marked, report.marks.reset),
        );
        output::status(self.color, "Loaded", &netlist);
        if let Some(convergence) = report.convergence {
            output::status(self.color, "Walked", convergence);
            output::status(self.color, "Updated", format!("{} nodes", report.updated));
        }

        if let Some(stats) = report.stats {
            print!("{}", stats.report(self.cfg.max_depth));
            println!("{}", stats.total);
        }

        Ok(())
    }
}
