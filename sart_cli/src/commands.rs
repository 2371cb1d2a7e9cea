use clap::Subcommand;

use self::{run::RunArgs, tree::TreeArgs};

mod run;
mod tree;

#[derive(Subcommand)]
pub enum Commands {
    /// Build, mark and walk a design, then report AVF statistics
    Run(RunArgs),
    /// Print the module hierarchy of a design
    Tree(TreeArgs),
}

pub trait Run {
    fn run(&self) -> anyhow::Result<()>;
}

impl Commands {
    pub fn run(&self) -> anyhow::Result<()> {
        match self {
            Self::Run(args) => args.run(),
            Self::Tree(args) => args.run(),
        }
    }
}
