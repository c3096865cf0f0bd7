//! Instance metadata registry used by the loader.
//!
//! Metadata is kept in DICOM JSON form (PS3.18 F.2), keyed by image identifier.
//! The store is populated before loads are issued and is only read while a
//! load is in flight.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use dicom_core::Tag;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Render a tag as a DICOM JSON attribute key (`GGGGEEEE`)
pub fn tag_key(tag: Tag) -> String {
    format!("{:04X}{:04X}", tag.0, tag.1)
}

/// A DICOM JSON dataset describing one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    attributes: Map<String, Value>,
}

impl Metadata {
    /// Build from a JSON value; anything other than an object is rejected
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(attributes) => Some(Self { attributes }),
            _ => None,
        }
    }

    /// The `Value` array of an attribute, if present
    pub fn values(&self, tag: Tag) -> Option<&Vec<Value>> {
        self.attributes
            .get(&tag_key(tag))
            .and_then(|attr| attr.get("Value"))
            .and_then(Value::as_array)
    }

    /// First value of an attribute when it is a string
    pub fn string(&self, tag: Tag) -> Option<&str> {
        self.values(tag)
            .and_then(|values| values.first())
            .and_then(Value::as_str)
    }

    /// Transfer Syntax UID (0002,0010), if recorded
    pub fn transfer_syntax_uid(&self) -> Option<&str> {
        self.string(dicom_dictionary_std::tags::TRANSFER_SYNTAX_UID)
    }
}

/// Read access to metadata by image identifier.
///
/// Unknown identifiers yield `None`; lookups never fail.
pub trait MetadataStore: Send + Sync {
    fn get(&self, image_id: &str) -> Option<Arc<Metadata>>;
}

/// Error raised while loading a metadata file
#[derive(Debug, thiserror::Error)]
pub enum MetadataLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid metadata JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Metadata file must be a JSON object keyed by imageId")]
    NotAnObject,
}

/// Metadata store backed by a `HashMap` behind a `RwLock`
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    entries: RwLock<HashMap<String, Arc<Metadata>>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for an image, replacing any previous entry
    pub fn add(&self, image_id: impl Into<String>, metadata: Metadata) {
        let image_id = image_id.into();
        debug!("Registering metadata for {}", image_id);
        self.write().insert(image_id, Arc::new(metadata));
    }

    pub fn remove(&self, image_id: &str) -> Option<Arc<Metadata>> {
        self.write().remove(image_id)
    }

    pub fn purge(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a JSON object of the form `{ "<imageId>": { DICOM JSON }, ... }`.
    ///
    /// Entries whose value is not an object are skipped. Returns the number of
    /// images registered.
    pub fn load_json_file(&self, path: impl AsRef<Path>) -> Result<usize, MetadataLoadError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let doc: Value = serde_json::from_str(&raw)?;
        let Value::Object(images) = doc else {
            return Err(MetadataLoadError::NotAnObject);
        };

        let mut count = 0;
        for (image_id, dataset) in images {
            match Metadata::from_value(dataset) {
                Some(metadata) => {
                    self.add(image_id, metadata);
                    count += 1;
                }
                None => warn!("Skipping metadata for {}: not a DICOM JSON object", image_id),
            }
        }
        Ok(count)
    }

    // A poisoned lock only means another thread panicked mid-insert; the map
    // itself is still usable.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Metadata>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<Metadata>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn get(&self, image_id: &str) -> Option<Arc<Metadata>> {
        self.read().get(image_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset(ts: &str) -> Metadata {
        Metadata::from_value(json!({
            "00020010": { "vr": "UI", "Value": [ts] },
            "00280010": { "vr": "US", "Value": [512] }
        }))
        .expect("object")
    }

    #[test]
    fn transfer_syntax_tag_key() {
        assert_eq!(tag_key(dicom_dictionary_std::tags::TRANSFER_SYNTAX_UID), "00020010");
        assert_eq!(tag_key(Tag(0x7FE0, 0x0010)), "7FE00010");
    }

    #[test]
    fn reads_first_string_value() {
        let md = dataset("1.2.840.10008.1.2.4.90");
        assert_eq!(md.transfer_syntax_uid(), Some("1.2.840.10008.1.2.4.90"));
        // numeric values are not strings
        assert_eq!(md.string(Tag(0x0028, 0x0010)), None);
        assert_eq!(md.values(Tag(0x0028, 0x0010)).map(Vec::len), Some(1));
    }

    #[test]
    fn missing_or_empty_value_array() {
        let md = Metadata::from_value(json!({ "00020010": { "vr": "UI" } })).unwrap();
        assert_eq!(md.transfer_syntax_uid(), None);

        let md = Metadata::from_value(json!({ "00020010": { "vr": "UI", "Value": [] } })).unwrap();
        assert_eq!(md.transfer_syntax_uid(), None);

        assert!(Metadata::from_value(json!(["not", "an", "object"])).is_none());
    }

    #[test]
    fn store_add_get_remove() {
        let store = InMemoryMetadataStore::new();
        assert!(store.get("wadors:a").is_none());

        store.add("wadors:a", dataset("1.2.3"));
        store.add("wadors:b", dataset("4.5.6"));
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get("wadors:a").and_then(|m| m.transfer_syntax_uid().map(str::to_string)),
            Some("1.2.3".to_string())
        );

        assert!(store.remove("wadors:a").is_some());
        assert!(store.get("wadors:a").is_none());

        store.purge();
        assert!(store.is_empty());
    }
}
