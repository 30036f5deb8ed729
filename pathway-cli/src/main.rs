mod cmd;
mod config;

use anyhow::{Result, anyhow};
use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("pathway")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Export a learning path from the content store into Sphinx-ready reStructuredText")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .help("Log progress at info level (overrides RUST_LOG)")
                .action(ArgAction::SetTrue),
        )
        .subcommand(cmd::export::make_subcommand())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = cli().get_matches();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if matches.get_flag("verbose") {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result: Result<()> = match matches.subcommand() {
        Some(("export", args)) => cmd::export::execute(args).await,
        Some((name, _)) => Err(anyhow!("unknown command `{name}`")),
        None => Err(anyhow!("no command given")),
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
