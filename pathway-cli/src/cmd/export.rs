use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use pathway_core::config::{ExportConfig, StoreKind};
use pathway_core::{ContentStore, Converter, Exporter, MemoryStore};
use pathway_mongo::MongoStore;
use tracing::info;

use crate::config::load_export_config;

pub fn add_export_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
                .default_value("./pathway.toml"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for the exported documents"),
        )
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("Content store connection URL"),
        )
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("NAME")
                .help("Database holding the guide, section and page collections"),
        )
        .arg(
            Arg::new("dump")
                .long("dump")
                .value_name("FILE")
                .help("Read content from a JSON dump instead of the database"),
        )
        .arg(
            Arg::new("extension")
                .short('e')
                .long("extension")
                .value_name("EXT")
                .help("File extension of generated documents"),
        )
        .arg(
            Arg::new("converter")
                .long("converter")
                .value_name("KIND")
                .value_parser(["builtin", "command"])
                .help("Markdown converter: built-in RST renderer or an external command"),
        )
        .arg(
            Arg::new("templates")
                .short('t')
                .long("templates")
                .value_name("DIR")
                .help("Directory with navigation template overrides"),
        )
        .arg(
            Arg::new("clean")
                .long("clean")
                .help("Remove the output directory before exporting")
                .action(ArgAction::SetTrue),
        )
}

pub fn make_subcommand() -> Command {
    add_export_args(Command::new("export"))
        .about("Export guides, sections and pages as reStructuredText")
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    // Load cascading configuration
    let config = load_export_config(args)?;
    let converter = Converter::from_config(&config.export.converter);

    match config.store.kind {
        StoreKind::Mongodb => {
            let store = MongoStore::connect(&config.store).await?;
            // Close the connection whether or not the export succeeded
            let result = export(&store, &converter, &config.export).await;
            store.close().await;
            result
        }
        StoreKind::Json => {
            let dump = config
                .store
                .dump
                .as_ref()
                .context("store.dump must be set when store.kind is \"json\"")?;
            let store = MemoryStore::load(dump).await?;
            export(&store, &converter, &config.export).await
        }
    }
}

async fn export<S: ContentStore>(store: &S, converter: &Converter, config: &ExportConfig) -> Result<()> {
    let root = config.output.root.display();
    let exporter = Exporter::new(store, converter, config)?;
    let summary = exporter
        .run()
        .await
        .with_context(|| format!("export to {root} failed"))?;

    info!(?summary, "done");
    println!(
        "Exported {} guides, {} sections and {} pages to {root}",
        summary.guides, summary.sections, summary.pages
    );

    Ok(())
}
