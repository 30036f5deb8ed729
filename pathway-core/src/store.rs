//! Read-only access to the content store.
//!
//! [`ContentStore`] is queried strictly by parent identity, so sections and
//! pages whose parent is never fetched are never visited.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::content::{Guide, Page, RecordId, Section};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to connect to content store at {url}")]
    Connect {
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("query on collection `{collection}` failed")]
    Query {
        collection: String,
        #[source]
        source: BoxError,
    },
    #[error("malformed record in collection `{collection}`: {reason}")]
    Decode { collection: String, reason: String },
    #[error("failed to read content dump {}", path.display())]
    DumpIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse content dump {}", path.display())]
    DumpParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait ContentStore {
    /// All guides, in the order the store returns them.
    fn guides(&self) -> impl Future<Output = Result<Vec<Guide>, StoreError>> + Send;

    /// Sections referencing `guide`, in store order.
    fn sections(
        &self,
        guide: &RecordId,
    ) -> impl Future<Output = Result<Vec<Section>, StoreError>> + Send;

    /// Pages referencing `section`, in store order.
    fn pages(
        &self,
        section: &RecordId,
    ) -> impl Future<Output = Result<Vec<Page>, StoreError>> + Send;
}

/// Content store held entirely in memory.
///
/// Can be loaded from a JSON dump of the form
/// `{"guides": [...], "sections": [...], "pages": [...]}` using the same
/// field names as the database collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    guides: Vec<Guide>,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    pages: Vec<Page>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_guide(mut self, guide: Guide) -> Self {
        self.guides.push(guide);
        self
    }

    pub fn add_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn add_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    pub fn from_json(path: &Path, json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|source| StoreError::DumpParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::DumpIo {
                path: path.to_path_buf(),
                source,
            })?;
        let store = Self::from_json(path, &json)?;
        tracing::debug!(
            path = %path.display(),
            guides = store.guides.len(),
            sections = store.sections.len(),
            pages = store.pages.len(),
            "loaded content dump"
        );
        Ok(store)
    }
}

impl ContentStore for MemoryStore {
    async fn guides(&self) -> Result<Vec<Guide>, StoreError> {
        Ok(self.guides.clone())
    }

    async fn sections(&self, guide: &RecordId) -> Result<Vec<Section>, StoreError> {
        Ok(self
            .sections
            .iter()
            .filter(|s| &s.guide == guide)
            .cloned()
            .collect())
    }

    async fn pages(&self, section: &RecordId) -> Result<Vec<Page>, StoreError> {
        Ok(self
            .pages
            .iter()
            .filter(|p| &p.section == section)
            .cloned()
            .collect())
    }
}
