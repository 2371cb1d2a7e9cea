use clap::Args;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct SartCfg {
    /// Number of threads writing and reading levels
    #[arg(long, default_value_t = 8)]
    pub workers: usize,
    /// Number of levels waiting to be written before the builder blocks
    #[arg(long, default_value_t = 100)]
    pub queue_depth: usize,
    /// Reuse levels already in the store instead of building them
    #[arg(long)]
    pub skip_build: bool,
    /// Mark only, do not propagate
    #[arg(long)]
    pub skip_walk: bool,
    /// Depth of the statistics report, 0 for the whole hierarchy
    #[arg(long, default_value_t = 1)]
    pub max_depth: usize,
}

impl Default for SartCfg {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_depth: 100,
            skip_build: false,
            skip_walk: false,
            max_depth: 1,
        }
    }
}
