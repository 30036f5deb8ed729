use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Everything the exporter needs besides the store and converter.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ExportConfig {
    pub output: OutputConfig,
    pub navigation: NavigationConfig,
    pub converter: ConverterConfig,
    /// Directory whose `guide_index.rst` / `root_index.rst` override the built-in templates
    pub templates: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub root: PathBuf,
    pub extension: String,
    /// Remove the output root before exporting
    pub clean: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./documentation/learning-path"),
            extension: "rst".to_string(),
            clean: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct NavigationConfig {
    pub root_title: String,
    pub caption: String,
    pub max_depth: u32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            root_title: "Learning Path".to_string(),
            caption: "Contents:".to_string(),
            max_depth: 2,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConverterKind {
    #[default]
    Builtin,
    Command,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ConverterConfig {
    pub kind: ConverterKind,
    pub command: String,
    pub args: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            kind: ConverterKind::Builtin,
            command: "pandoc".to_string(),
            args: vec![
                "--from".to_string(),
                "markdown".to_string(),
                "--to".to_string(),
                "rst".to_string(),
            ],
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Mongodb,
    Json,
}

/// Where content is read from.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub connection_url: String,
    pub database: String,
    /// JSON dump used when `kind = "json"`
    pub dump: Option<PathBuf>,
    pub collections: CollectionNames,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Mongodb,
            connection_url: "mongodb://localhost:27017".to_string(),
            database: "strapi".to_string(),
            dump: None,
            collections: CollectionNames::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct CollectionNames {
    pub guides: String,
    pub sections: String,
    pub pages: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            guides: "Guide".to_string(),
            sections: "section".to_string(),
            pages: "page".to_string(),
        }
    }
}
