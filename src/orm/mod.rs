pub mod error;
pub mod key;
pub mod model;
pub mod property;
pub mod schema;
pub mod store;
pub mod value;

use std::sync::Arc;

pub use crate::orm::error::{Error, Result};
pub use crate::orm::key::Key;
pub use crate::orm::model::Model;
pub use crate::orm::schema::{Field, Registry, Schema};
pub use crate::orm::store::Store;
pub use crate::orm::value::Value;

/// Store handle and model registry, injected wherever entities are loaded or saved.
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn Store>,
    registry: Arc<Registry>,
}

impl Db {
    pub fn new(store: Arc<dyn Store>, registry: Registry) -> Self {
        Self {
            store,
            registry: Arc::new(registry),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        self.registry.as_ref()
    }

    pub fn schema(&self, name: &str) -> Result<Arc<schema::Schema>> {
        self.registry.resolve(name)
    }
}
