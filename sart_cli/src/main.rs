fn main() -> anyhow::Result<()> {
    sart_cli::run_cli()
}
