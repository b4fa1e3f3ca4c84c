use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::error;

use qfilter::config::Cli;

fn run(cli: &Cli) -> anyhow::Result<()> {
    qfilter::filter_directory(cli)
        .with_context(|| format!("quality filtering of {} failed", cli.input.display()))?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}
