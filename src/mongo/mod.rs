use std::fmt::Display;
use std::sync::Arc;

use async_std::sync::RwLock;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use futures_lite::StreamExt;
use log::{debug, info};
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection, Cursor, Database};

use crate::config::MongoConfig;
use crate::orm::error::{Error, Result};
use crate::orm::store::{Record, Store, ID_FIELD};

/// `Store` backed by a MongoDB database, one collection per model type.
#[derive(Clone)]
pub struct MongoDB {
    database: Arc<RwLock<Database>>,
}

impl MongoDB {
    const MONGDB_STR: &'static str = "mongodb";
    const DEFAULT_PORT: u16 = 27017;

    pub async fn new(config: &MongoConfig) -> Result<Self> {
        let connection_str = match (config.string.as_ref(), config.host.as_ref()) {
            (Some(connection_str), _) => String::from(connection_str),
            (None, Some(host)) => {
                let connection_str =
                    format!("{}:{}", host, config.port.unwrap_or(Self::DEFAULT_PORT));

                if let Some(ref user) = config.user {
                    format!(
                        "{}://{}:{}@{}",
                        Self::MONGDB_STR,
                        user,
                        config.password.as_deref().unwrap_or(""),
                        connection_str
                    )
                } else {
                    format!("{}://{}", Self::MONGDB_STR, connection_str)
                }
            }
            (None, None) => {
                return Err(Error::StoreUnavailable(
                    "Missing configuration for MongoDB".into(),
                ))
            }
        };

        let options = ClientOptions::parse(connection_str.as_str())
            .await
            .map_err(|e| Self::unavailable("creating connection to MongoDB", e))?;

        let client = Client::with_options(options)
            .map_err(|e| Self::unavailable("connecting to MongoDB", e))?;

        info!("Using MongoDB database \"{}\"", config.db_name);

        Ok(MongoDB {
            database: Arc::new(RwLock::new(client.database(config.db_name.as_str()))),
        })
    }

    async fn get_collection<S: AsRef<str>>(&self, name: S) -> Collection<Document> {
        self.database.read().await.collection(name.as_ref())
    }

    fn unavailable<C: Display>(context: C, e: mongodb::error::Error) -> Error {
        info!("Error {}: {:#?}", context, e);

        sentry::capture_error(&e);

        Error::StoreUnavailable(e.to_string())
    }

    fn object_id(id: &str) -> Result<ObjectId> {
        ObjectId::parse_str(id).map_err(|_| Error::MalformedId(id.into()))
    }

    fn into_record(mut document: Document) -> Option<Record> {
        match document.remove(ID_FIELD) {
            Some(Bson::ObjectId(id)) => Some((id.to_hex(), document)),
            Some(Bson::String(id)) => Some((id, document)),
            other => {
                debug!("Skipping document with unusable id {:?}", other);

                None
            }
        }
    }

    async fn collect(collection: &str, cursor: Cursor<Document>) -> Result<Vec<Record>> {
        let mut results = Vec::new();

        futures_lite::pin!(cursor);
        while let Some(document) = cursor.next().await {
            let document = document
                .map_err(|e| Self::unavailable(format!("reading {}", collection), e))?;
            if let Some(record) = Self::into_record(document) {
                results.push(record);
            }
        }

        Ok(results)
    }
}

#[async_trait]
impl Store for MongoDB {
    async fn insert(&self, collection: &str, document: Document) -> Result<String> {
        let result = self
            .get_collection(collection)
            .await
            .insert_one(document, None)
            .await
            .map_err(|e| Self::unavailable(format!("inserting into {}", collection), e))?;

        match result.inserted_id {
            Bson::ObjectId(id) => Ok(id.to_hex()),
            other => Err(Error::StoreUnavailable(format!(
                "Unexpected id {} generated for {}",
                other, collection
            ))),
        }
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let object_id = Self::object_id(id)?;

        self.get_collection(collection)
            .await
            .find_one(doc! { ID_FIELD: object_id }, None)
            .await
            .map_err(|e| Self::unavailable(format!("getting {} with key {}", collection, id), e))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<u64> {
        let object_id = Self::object_id(id)?;

        let result = self
            .get_collection(collection)
            .await
            .delete_one(doc! { ID_FIELD: object_id }, None)
            .await
            .map_err(|e| {
                Self::unavailable(format!("deleting {} with key {}", collection, id), e)
            })?;

        Ok(result.deleted_count)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>> {
        let cursor = self
            .get_collection(collection)
            .await
            .find(
                None,
                FindOptions::builder().sort(doc! { ID_FIELD: 1 }).build(),
            )
            .await
            .map_err(|e| Self::unavailable(format!("listing {}", collection), e))?;

        Self::collect(collection, cursor).await
    }

    async fn find_by(&self, collection: &str, field: &str, value: Bson) -> Result<Vec<Record>> {
        let cursor = self
            .get_collection(collection)
            .await
            .find(
                doc! { field: value },
                FindOptions::builder().sort(doc! { ID_FIELD: 1 }).build(),
            )
            .await
            .map_err(|e| {
                Self::unavailable(format!("getting {} with field {}", collection, field), e)
            })?;

        Self::collect(collection, cursor).await
    }

    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let result = self
            .get_collection(collection)
            .await
            .delete_many(doc! {}, None)
            .await
            .map_err(|e| Self::unavailable(format!("clearing {}", collection), e))?;

        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id() {
        let id = ObjectId::new().to_hex();
        assert_eq!(MongoDB::object_id(&id).unwrap().to_hex(), id);
        assert!(matches!(
            MongoDB::object_id("abc123"),
            Err(Error::MalformedId(_))
        ));
    }

    #[test]
    fn test_into_record_strips_id() {
        let id = ObjectId::new();
        let (record_id, document) =
            MongoDB::into_record(doc! { ID_FIELD: id, "name": "Coast" }).unwrap();
        assert_eq!(record_id, id.to_hex());
        assert!(document.get(ID_FIELD).is_none());
        assert_eq!(document.get_str("name").unwrap(), "Coast");

        assert!(MongoDB::into_record(doc! { "name": "Coast" }).is_none());
    }

    #[actix_rt::test]
    async fn test_missing_configuration() {
        let config = MongoConfig {
            string: None,
            host: None,
            port: None,
            db_name: "test".into(),
            user: None,
            password: None,
        };

        assert!(matches!(
            MongoDB::new(&config).await,
            Err(Error::StoreUnavailable(_))
        ));
    }
}
