//! Mapping raw collection documents onto content records.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use pathway_core::content::order_from_text;
use pathway_core::{Guide, Page, RecordId, Section};

pub fn guide(doc: &Document) -> Result<Guide, String> {
    Ok(Guide {
        id: record_id(doc, "_id")?,
        title: text(doc, "Title"),
        description: text(doc, "Description"),
        slug: text(doc, "Slug"),
    })
}

pub fn section(doc: &Document) -> Result<Section, String> {
    Ok(Section {
        id: record_id(doc, "_id")?,
        title: text(doc, "Title"),
        description: text(doc, "Description"),
        order: order(doc),
        guide: record_id(doc, "guide")?,
    })
}

pub fn page(doc: &Document) -> Result<Page, String> {
    Ok(Page {
        id: record_id(doc, "_id")?,
        title: text(doc, "Title"),
        content: text(doc, "Content"),
        order: order(doc),
        section: record_id(doc, "section")?,
    })
}

/// Stored `_id` values of the records handed out so far.
///
/// Record identities are flattened to strings, so a child query has to look
/// the parent's stored value back up to match `Int32`, `Int64` or plain
/// string ids that merely look like an `ObjectId`.
#[derive(Debug, Default)]
pub struct Identities {
    known: Mutex<HashMap<RecordId, Bson>>,
}

impl Identities {
    pub fn remember(&self, id: &RecordId, doc: &Document) {
        if let Some(stored) = doc.get("_id") {
            self.lock().insert(id.clone(), stored.clone());
        }
    }

    /// Value to match a reference field against.
    ///
    /// Unknown identities that parse as an `ObjectId` are queried as one,
    /// anything else as a plain string.
    pub fn reference(&self, id: &RecordId) -> Bson {
        if let Some(stored) = self.lock().get(id) {
            return stored.clone();
        }
        match ObjectId::parse_str(id.as_str()) {
            Ok(oid) => Bson::ObjectId(oid),
            Err(_) => Bson::String(id.as_str().to_string()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RecordId, Bson>> {
        self.known.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn record_id(doc: &Document, key: &str) -> Result<RecordId, String> {
    match doc.get(key) {
        Some(Bson::ObjectId(oid)) => Ok(RecordId::new(oid.to_hex())),
        Some(Bson::String(s)) => Ok(RecordId::new(s.as_str())),
        Some(Bson::Int32(i)) => Ok(RecordId::new(i.to_string())),
        Some(Bson::Int64(i)) => Ok(RecordId::new(i.to_string())),
        Some(other) => Err(format!("field `{key}` has unsupported type {:?}", other.element_type())),
        None => Err(format!("missing field `{key}`")),
    }
}

fn text(doc: &Document, key: &str) -> String {
    match doc.get(key) {
        Some(Bson::String(s)) => s.clone(),
        None | Some(Bson::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}

fn order(doc: &Document) -> Option<f64> {
    match doc.get("Order")? {
        Bson::Double(f) => Some(*f),
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::String(s) => order_from_text(s),
        _ => None,
    }
}
