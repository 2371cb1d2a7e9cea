use std::{fmt::Write, path::PathBuf};

use clap::Args;
use sart::prelude::*;

use super::Run;

const INDENT: &str = "|   ";

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// JSON list of module descriptions
    #[arg(long)]
    design: PathBuf,
    /// Top module
    #[arg(long)]
    top: String,
    /// Depth to print, 0 for the whole hierarchy
    #[arg(long, default_value_t = 1)]
    upto: usize,
}

impl Run for TreeArgs {
    fn run(&self) -> anyhow::Result<()> {
        let design = Design::from_path(&self.design)?;
        let mut out = String::new();
        tree(&design, &self.top, self.upto, &mut out)?;
        print!("{out}");
        Ok(())
    }
}

/// Writes one `module (instance)` line per non-primitive instance, indented
/// by depth.
fn tree(source: &dyn ModuleSource, top: &str, upto: usize, out: &mut String) -> Result<()> {
    fn go(
        source: &dyn ModuleSource,
        module: &str,
        inst: &str,
        depth: usize,
        upto: usize,
        stack: &mut Vec<String>,
        out: &mut String,
    ) -> Result<()> {
        if upto != 0 && depth > upto {
            return Ok(());
        }
        if stack.iter().any(|name| name == module) {
            return Err(Error::RecursiveModule(module.to_string()));
        }

        let _ = writeln!(out, "{}{module} ({inst})", INDENT.repeat(depth));

        stack.push(module.to_string());
        for child in source.module(module)?.insts.iter().filter(|inst| !inst.is_prim) {
            go(source, &child.ty, &child.name, depth + 1, upto, stack, out)?;
        }
        stack.pop();

        Ok(())
    }

    go(source, top, top, 0, upto, &mut vec![], out)
}
