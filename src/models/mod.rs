use crate::orm::{Db, Error, Key, Model, Registry, Result, Schema};

pub mod trip;
pub mod user;

pub use crate::models::trip::TripModel;
pub use crate::models::user::UserModel;

/// A concrete model type: a named schema plus a typed wrapper around `Model`.
pub trait ModelType: Sized {
    fn name() -> &'static str;

    fn schema() -> Schema;

    fn wrap(model: Model) -> Self;

    fn model(&self) -> &Model;

    /// Curated projection for API responses.
    fn to_public(&self) -> serde_json::Value;

    fn create(db: &Db) -> Result<Self> {
        Ok(Self::wrap(Model::new(db.schema(Self::name())?)))
    }

    fn from_model(model: Model) -> Result<Self> {
        if model.name() == Self::name() {
            Ok(Self::wrap(model))
        } else {
            Err(Error::InvalidArgument(format!(
                "Expected a {}, got a {}",
                Self::name(),
                model.name()
            )))
        }
    }

    fn key_from_id<S: Into<String>>(db: &Db, id: S) -> Result<Key> {
        Model::key_from_id(&db.schema(Self::name())?, id)
    }

    fn key(&self) -> Option<&Key> {
        self.model().key()
    }
}

/// Loads a typed entity by id. A missing document is a `NotFound` error.
#[cfg(test)]
pub async fn load<T: ModelType>(db: &Db, id: &str) -> Result<T> {
    let model = Model::from_id(db, &db.schema(T::name())?, id).await?;

    T::from_model(model)
}

/// Loads a typed entity by id, `None` when it does not exist.
pub async fn get_by_id<T: ModelType>(db: &Db, id: &str) -> Result<Option<T>> {
    match Model::get_by_id(db, &db.schema(T::name())?, id).await? {
        Some(model) => T::from_model(model).map(Some),
        None => Ok(None),
    }
}

pub async fn query<T: ModelType>(db: &Db) -> Result<Vec<T>> {
    Model::query(db, &db.schema(T::name())?)
        .await?
        .into_iter()
        .map(T::from_model)
        .collect()
}

/// Registry of every model type served by this process.
pub fn registry() -> Result<Registry> {
    let mut registry = Registry::new();
    registry.register(UserModel::schema())?;
    registry.register(TripModel::schema())?;

    Ok(registry)
}
