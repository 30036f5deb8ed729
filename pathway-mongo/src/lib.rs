//! MongoDB-backed content store.

mod decode;

use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Database};
use pathway_core::config::{CollectionNames, StoreConfig};
use pathway_core::{ContentStore, Guide, Page, RecordId, Section, StoreError};
use tracing::{debug, info};

use crate::decode::Identities;

/// Content store reading the guide, section and page collections.
///
/// Open with [`MongoStore::connect`] and release with [`MongoStore::close`].
pub struct MongoStore {
    client: Client,
    database: Database,
    collections: CollectionNames,
    guide_ids: Identities,
    section_ids: Identities,
}

impl MongoStore {
    /// Connect and ping the server so connection problems surface before any export work.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let connect_error = |source: mongodb::error::Error| StoreError::Connect {
            url: config.connection_url.clone(),
            source: Box::new(source),
        };

        let client = Client::with_uri_str(&config.connection_url)
            .await
            .map_err(connect_error)?;
        let database = client.database(&config.database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(connect_error)?;

        info!(url = %config.connection_url, database = %config.database, "connected to content store");

        Ok(Self {
            client,
            database,
            collections: config.collections.clone(),
            guide_ids: Identities::default(),
            section_ids: Identities::default(),
        })
    }

    pub async fn close(self) {
        self.client.shutdown().await;
        debug!("content store connection closed");
    }

    async fn fetch(
        &self,
        collection: &str,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<Document>, StoreError> {
        let query_error = |source: mongodb::error::Error| StoreError::Query {
            collection: collection.to_string(),
            source: Box::new(source),
        };

        let coll = self.database.collection::<Document>(collection);
        let mut find = coll.find(filter);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }
        let documents: Vec<Document> = find
            .await
            .map_err(query_error)?
            .try_collect()
            .await
            .map_err(query_error)?;

        debug!(collection, count = documents.len(), "fetched documents");
        Ok(documents)
    }

    fn decode<T>(
        collection: &str,
        documents: &[Document],
        decode: impl Fn(&Document) -> Result<T, String>,
    ) -> Result<Vec<T>, StoreError> {
        documents
            .iter()
            .map(|doc| {
                decode(doc).map_err(|reason| StoreError::Decode {
                    collection: collection.to_string(),
                    reason,
                })
            })
            .collect()
    }
}

// Children are fetched by `Order`, then identity, so equal positions come back
// in a stable order across runs.
fn child_sort() -> Option<Document> {
    Some(doc! { "Order": 1, "_id": 1 })
}

impl ContentStore for MongoStore {
    async fn guides(&self) -> Result<Vec<Guide>, StoreError> {
        let name = &self.collections.guides;
        let documents = self.fetch(name, doc! {}, None).await?;
        let guides = Self::decode(name, &documents, decode::guide)?;
        for (guide, doc) in guides.iter().zip(&documents) {
            self.guide_ids.remember(&guide.id, doc);
        }
        Ok(guides)
    }

    async fn sections(&self, guide: &RecordId) -> Result<Vec<Section>, StoreError> {
        let name = &self.collections.sections;
        let filter = doc! { "guide": self.guide_ids.reference(guide) };
        let documents = self.fetch(name, filter, child_sort()).await?;
        let sections = Self::decode(name, &documents, decode::section)?;
        for (section, doc) in sections.iter().zip(&documents) {
            self.section_ids.remember(&section.id, doc);
        }
        Ok(sections)
    }

    async fn pages(&self, section: &RecordId) -> Result<Vec<Page>, StoreError> {
        let name = &self.collections.pages;
        let filter = doc! { "section": self.section_ids.reference(section) };
        let documents = self.fetch(name, filter, child_sort()).await?;
        Self::decode(name, &documents, decode::page)
    }
}
