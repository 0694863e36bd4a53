use std::fmt;
use std::sync::Arc;

use base64::prelude::*;

use log::{debug, warn};

use crate::orm::error::{Error, Result};
use crate::orm::model::Model;
use crate::orm::schema::{Registry, Schema};
use crate::orm::Db;

/// Immutable reference to one stored entity: a model type plus a store id.
///
/// Compact form is `<ModelName>:<id>`; the URL-safe form is the compact form
/// in padded base64 with the URL-safe alphabet.
#[derive(Clone)]
pub struct Key {
    model: Arc<Schema>,
    id: String,
}

impl Key {
    pub const SEPARATOR: char = ':';

    /// `model` should come from the `Registry` the key is later decoded with;
    /// a key on an unregistered schema serializes but decodes to `UnknownModel`.
    pub fn new<S: Into<String>>(model: Arc<Schema>, id: S) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "A {} key needs an id",
                model.name()
            )));
        }
        if id.contains(Self::SEPARATOR) {
            return Err(Error::InvalidArgument(format!(
                "A {} key id cannot contain {:?}, got {:?}",
                model.name(),
                Self::SEPARATOR,
                id
            )));
        }

        Ok(Self { model, id })
    }

    pub fn decode(serial: &str, registry: &Registry) -> Result<Self> {
        let (name, id) = Self::split(serial)?;

        Self::new(registry.resolve(name)?, id)
    }

    pub fn decode_urlsafe(token: &str, registry: &Registry) -> Result<Self> {
        let bytes = BASE64_URL_SAFE
            .decode(token.as_bytes())
            .map_err(|e| Error::MalformedKey(format!("invalid base64 encoding: {}", e)))?;
        let serial = String::from_utf8(bytes)
            .map_err(|e| Error::MalformedKey(format!("invalid UTF-8 in key: {}", e)))?;

        Self::decode(&serial, registry)
    }

    fn split(serial: &str) -> Result<(&str, &str)> {
        let parts = serial.split(Self::SEPARATOR).collect::<Vec<_>>();
        match parts.as_slice() {
            [name, id] if !name.is_empty() && !id.is_empty() => Ok((*name, *id)),
            _ => Err(Error::MalformedKey(format!(
                "expected <model>{}<id>, got {:?}",
                Self::SEPARATOR,
                serial
            ))),
        }
    }

    pub fn model(&self) -> &Arc<Schema> {
        &self.model
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    pub fn serialize(&self) -> String {
        format!("{}{}{}", self.model.name(), Self::SEPARATOR, self.id)
    }

    pub fn urlsafe(&self) -> String {
        BASE64_URL_SAFE.encode(self.serialize())
    }

    /// Removes the referenced document. Deleting an absent document yields 0.
    pub async fn delete(&self, db: &Db) -> Result<u64> {
        let deleted = db
            .store()
            .delete_by_id(self.model_name(), self.id())
            .await?;

        debug!("Deleted {} document(s) for {}", deleted, self);

        Ok(deleted)
    }

    /// Loads the referenced entity.
    ///
    /// Missing documents and undecodable data yield `Ok(None)`; store
    /// failures are returned as errors.
    pub async fn get(&self, db: &Db) -> Result<Option<Model>> {
        match Model::from_key(db, self.clone()).await {
            Ok(model) => Ok(Some(model)),
            Err(e) if e.is_unavailable() => Err(e),
            Err(e) => {
                warn!("Dereferencing {} failed: {}", self, e);

                Ok(None)
            }
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.model.name() == other.model.name() && self.id == other.id
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.serialize()).finish()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Key {}>", self.serialize())
    }
}
