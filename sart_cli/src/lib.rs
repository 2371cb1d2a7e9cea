use std::io;

use clap::Parser;
use commands::Commands;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

mod commands;
mod output;
mod styles;

pub use output::Color;

const LOG_ENV_VAR: &str = "SART_LOG";

#[derive(Parser)]
#[command(name = "sart")]
#[command(version, about, long_about = None)]
#[command(styles = styles::get_styles())]
struct SartCli {
    #[command(subcommand)]
    command: Commands,
}

pub fn run_cli() -> anyhow::Result<()> {
    let args = SartCli::parse();

    args.command.run()
}

fn init_logger(color: Color) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default().with(filter);
    let subscriber = subscriber.with(
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(color.use_colors())
            .with_target(false),
    );

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
