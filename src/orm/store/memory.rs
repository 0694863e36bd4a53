use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_std::sync::RwLock;
use async_trait::async_trait;

use bson::oid::ObjectId;
use bson::{Bson, Document};

use crate::orm::error::{Error, Result};
use crate::orm::store::{Record, Store, ID_FIELD};

type Collection = BTreeMap<String, Document>;
type Collections = Arc<RwLock<HashMap<String, Collection>>>;

/// In-process store with the same id format as MongoDB (hex `ObjectId`).
#[derive(Clone, Default)]
pub struct Memory {
    collections: Collections,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_id(id: &str) -> Result<()> {
        ObjectId::parse_str(id)
            .map(|_| ())
            .map_err(|_| Error::MalformedId(id.into()))
    }

    fn records(collection: Option<&Collection>) -> Vec<Record> {
        collection
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, document)| (id.clone(), document.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Store for Memory {
    async fn insert(&self, collection: &str, mut document: Document) -> Result<String> {
        let id = ObjectId::new();
        document.remove(ID_FIELD);

        self.collections
            .write()
            .await
            .entry(collection.into())
            .or_default()
            .insert(id.to_hex(), document);

        Ok(id.to_hex())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Self::check_id(id)?;

        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|document| {
                let mut found = document.clone();
                if let Ok(object_id) = ObjectId::parse_str(id) {
                    found.insert(ID_FIELD, object_id);
                }

                found
            }))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<u64> {
        Self::check_id(id)?;

        Ok(self
            .collections
            .write()
            .await
            .get_mut(collection)
            .and_then(|documents| documents.remove(id))
            .map_or(0, |_| 1))
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>> {
        Ok(Self::records(self.collections.read().await.get(collection)))
    }

    async fn find_by(&self, collection: &str, field: &str, value: Bson) -> Result<Vec<Record>> {
        Ok(Self::records(self.collections.read().await.get(collection))
            .into_iter()
            .filter(|(_, document)| document.get(field) == Some(&value))
            .collect())
    }

    async fn delete_all(&self, collection: &str) -> Result<u64> {
        Ok(self
            .collections
            .write()
            .await
            .remove(collection)
            .map_or(0, |documents| documents.len() as u64))
    }
}
