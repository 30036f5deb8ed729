use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use pathway_core::config::{ExportConfig, StoreConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PathwayConfig {
    /// Content store connection
    #[serde(default)]
    pub store: StoreConfig,
    /// Output, navigation and converter settings (from pathway-core)
    #[serde(flatten)]
    pub export: ExportConfig,
}

impl PathwayConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (PATHWAY_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // 1. Start with defaults
        let defaults = Self::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. Add configuration file if it exists
        if let Some(config_file) = args.try_get_one::<String>("config").ok().flatten() {
            builder = builder.add_source(File::from(Path::new(config_file)).required(false));
        }

        // 3. Add environment variables with PATHWAY_ prefix
        builder = builder.add_source(
            Environment::with_prefix("PATHWAY")
                .prefix_separator("_")
                .separator("__") // Use double underscore for nested keys
                .try_parsing(true),
        );

        // 4. Override with CLI arguments (highest priority)
        for (arg, key) in [
            ("output", "output.root"),
            ("extension", "output.extension"),
            ("url", "store.connection_url"),
            ("database", "store.database"),
            ("converter", "converter.kind"),
            ("templates", "templates"),
        ] {
            if let Some(value) = args.try_get_one::<String>(arg).ok().flatten() {
                builder = builder.set_override(key, value.as_str())?;
            }
        }
        // A dump file implies reading from it instead of the database
        if let Some(dump) = args.try_get_one::<String>("dump").ok().flatten() {
            builder = builder
                .set_override("store.dump", dump.as_str())?
                .set_override("store.kind", "json")?;
        }
        if args.try_get_one::<bool>("clean").ok().flatten() == Some(&true) {
            builder = builder.set_override("output.clean", true)?;
        }

        // Build and deserialize
        let config = builder.build()?;
        let pathway_config: PathwayConfig = config.try_deserialize()?;

        Ok(pathway_config)
    }
}

/// Load configuration specifically for export commands
pub fn load_export_config(args: &ArgMatches) -> Result<PathwayConfig> {
    PathwayConfig::load(args)
}
