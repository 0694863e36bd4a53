use std::fmt;
use std::sync::Arc;

use bson::Document;

use log::{debug, warn};

use serde_json::{Map, Value as JsonValue};

use crate::orm::error::{Error, Result};
use crate::orm::key::Key;
use crate::orm::schema::{Registry, Schema};
use crate::orm::store::ID_FIELD;
use crate::orm::value::Value;
use crate::orm::Db;

/// One entity of a registered model type: a slot per declared field plus
/// the key it was loaded from or last stored under.
///
/// Slots are never synced implicitly; `put` writes all of them as a new
/// document.
#[derive(Clone)]
pub struct Model {
    schema: Arc<Schema>,
    key: Option<Key>,
    values: Vec<Value>,
}

impl Model {
    /// Fresh, unbound instance with every slot at its default.
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|field| field.default_value().clone())
            .collect();

        Self {
            schema,
            key: None,
            values,
        }
    }

    pub fn key_from_id<S: Into<String>>(schema: &Arc<Schema>, id: S) -> Result<Key> {
        Key::new(schema.clone(), id)
    }

    /// Builds an unbound instance from a JSON request body whose field
    /// names match the declared fields.
    pub fn from_body(
        schema: Arc<Schema>,
        body: Map<String, JsonValue>,
        registry: &Registry,
    ) -> Result<Self> {
        let mut model = Self::new(schema);
        for (name, value) in body {
            let position = model.position(&name)?;
            let value = model.schema.fields()[position].from_json(value, registry)?;
            model.values[position] = value;
        }

        Ok(model)
    }

    /// Loads the entity the key points at. Fails with `NotFound` when the
    /// document is missing.
    pub async fn from_key(db: &Db, key: Key) -> Result<Self> {
        let mut model = Self::new(key.model().clone());
        model.key = Some(key);
        model.load(db).await?;

        Ok(model)
    }

    pub async fn from_id<S: Into<String>>(db: &Db, schema: &Arc<Schema>, id: S) -> Result<Self> {
        Self::from_key(db, Self::key_from_id(schema, id)?).await
    }

    async fn load(&mut self, db: &Db) -> Result<()> {
        let key = match self.key {
            Some(ref key) => key.clone(),
            None => return Ok(()),
        };

        let document = db
            .store()
            .find_by_id(self.schema.name(), key.id())
            .await?
            .ok_or_else(|| Error::not_found(self.schema.name(), key.id()))?;

        self.fill(document, db.registry())
    }

    fn fill(&mut self, document: Document, registry: &Registry) -> Result<()> {
        for (name, value) in document {
            if name == ID_FIELD {
                continue;
            }

            match self.schema.position(&name) {
                Some(position) => {
                    self.values[position] =
                        self.schema.fields()[position].unpack(value, registry)?;
                }
                None => debug!(
                    "Ignoring undeclared field \"{}\" on {}",
                    name,
                    self.schema.name()
                ),
            }
        }

        Ok(())
    }

    fn from_record(
        schema: &Arc<Schema>,
        (id, document): (String, Document),
        registry: &Registry,
    ) -> Result<Self> {
        let mut model = Self::new(schema.clone());
        model.key = Some(Key::new(schema.clone(), id)?);
        model.fill(document, registry)?;

        Ok(model)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.schema.position(name).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "{} has no field \"{}\"",
                self.schema.name(),
                name
            ))
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn name(&self) -> &'static str {
        self.schema.name()
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema
            .position(name)
            .map(|position| &self.values[position])
    }

    pub fn set<V: Into<Value>>(&mut self, name: &str, value: V) -> Result<()> {
        let position = self.position(name)?;
        self.values[position] = value.into();

        Ok(())
    }

    /// Every declared field mapped to its packed value: the exact payload
    /// written by `put`.
    pub fn to_document(&self) -> Result<Document> {
        let mut document = Document::new();
        for (field, value) in self.schema.fields().iter().zip(self.values.iter()) {
            document.insert(field.name(), field.pack(value)?);
        }

        Ok(document)
    }

    /// Inserts the current slots as a new document and rebinds to its key.
    ///
    /// Always an insert: calling it twice stores two documents.
    pub async fn put(&mut self, db: &Db) -> Result<&Key> {
        let document = self.to_document()?;
        let id = db.store().insert(self.schema.name(), document).await?;
        let key = Key::new(self.schema.clone(), id)?;

        debug!("Stored {}", key);

        Ok(self.key.insert(key))
    }

    pub async fn save(mut self, db: &Db) -> Result<Self> {
        self.put(db).await?;

        Ok(self)
    }

    /// Removes the stored document. An unbound instance is an error.
    pub async fn delete(&self, db: &Db) -> Result<u64> {
        match self.key {
            Some(ref key) => key.delete(db).await,
            None => Err(Error::InvalidArgument(format!(
                "Cannot delete an unsaved {}",
                self.schema.name()
            ))),
        }
    }

    pub async fn query(db: &Db, schema: &Arc<Schema>) -> Result<Vec<Self>> {
        db.store()
            .find_all(schema.name())
            .await?
            .into_iter()
            .map(|record| Self::from_record(schema, record, db.registry()))
            .collect()
    }

    /// Entities whose `field` stores exactly the packed form of `value`.
    pub async fn fetch_by(
        db: &Db,
        schema: &Arc<Schema>,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Self>> {
        let packed = match schema.field(field) {
            Some(declared) => declared.pack_element(value)?,
            None => {
                return Err(Error::InvalidArgument(format!(
                    "{} has no field \"{}\"",
                    schema.name(),
                    field
                )))
            }
        };

        db.store()
            .find_by(schema.name(), field, packed)
            .await?
            .into_iter()
            .map(|record| Self::from_record(schema, record, db.registry()))
            .collect()
    }

    pub async fn delete_all(db: &Db, schema: &Arc<Schema>) -> Result<u64> {
        db.store().delete_all(schema.name()).await
    }

    /// Like `Key::get`: absent documents and malformed ids yield `Ok(None)`.
    pub async fn get_by_id<S: Into<String>>(
        db: &Db,
        schema: &Arc<Schema>,
        id: S,
    ) -> Result<Option<Self>> {
        match Self::key_from_id(schema, id) {
            Ok(key) => key.get(db).await,
            Err(e) => {
                warn!("Looking up {} by id failed: {}", schema.name(), e);

                Ok(None)
            }
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct(self.schema.name());
        debug.field("key", &self.key);
        for (field, value) in self.schema.fields().iter().zip(self.values.iter()) {
            debug.field(field.name(), value);
        }

        debug.finish()
    }
}
