pub mod memory;

use async_trait::async_trait;

use bson::Document;

use crate::orm::error::Result;

/// Field holding the store-assigned id inside a raw document.
pub const ID_FIELD: &str = "_id";

/// A stored document together with its id, the id field removed.
pub type Record = (String, Document);

/// Collection-scoped document store. Collections are named after model types.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert(&self, collection: &str, document: Document) -> Result<String>;

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<u64>;

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>>;

    /// Documents whose `field` equals `value` exactly.
    async fn find_by(&self, collection: &str, field: &str, value: bson::Bson)
        -> Result<Vec<Record>>;

    async fn delete_all(&self, collection: &str) -> Result<u64>;
}
