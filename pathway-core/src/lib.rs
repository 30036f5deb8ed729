pub mod config;
pub mod content;
pub mod convert;
pub mod exporter;
pub mod markdown;
pub mod navigation;
pub mod sink;
pub mod slug;
pub mod store;
pub mod template;
pub mod tree;

// Re-export main types
pub use content::{Guide, Page, RecordId, Section};
pub use convert::{CommandConverter, ConvertError, Converter, MarkupConverter, RstConverter};
pub use exporter::{ExportError, ExportSummary, Exporter};
pub use slug::slugify;
pub use store::{ContentStore, MemoryStore, StoreError};
pub use template::{TemplateError, TemplateRenderer};
