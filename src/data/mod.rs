use actix_web::web;

use serde_json::{Map, Value as JsonValue};

use crate::config::AuthConfig;
use crate::models::{self, ModelType, TripModel, UserModel};
use crate::orm::{Db, Error, Key, Result};

#[derive(Clone)]
pub struct Data {
    pub db: Db,
    bcrypt_cost: u32,
}

impl Data {
    pub fn new(db: Db, auth: &AuthConfig) -> Self {
        Data {
            db,
            bcrypt_cost: auth.bcrypt_cost,
        }
    }

    pub async fn create_user(&self, email: String, password: String) -> Result<UserModel> {
        let cost = self.bcrypt_cost;
        let mut user = UserModel::new(&self.db, email)?;
        let mut user = web::block(move || user.set_password(&password, cost).map(|_| user))
            .await
            .map_err(|e| Error::Password(e.to_string()))??;

        user.put(&self.db).await?;

        Ok(user)
    }

    /// The user owning `email`, if `password` matches.
    pub async fn authenticate(&self, email: &str, password: String) -> Result<Option<UserModel>> {
        let user = match UserModel::find_by_email(&self.db, email).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        let (user, valid) = web::block(move || {
            let valid = user.check_password(&password);
            (user, valid)
        })
        .await
        .map_err(|e| Error::Password(e.to_string()))?;

        Ok(if valid { Some(user) } else { None })
    }

    pub async fn create_trip(&self, body: Map<String, JsonValue>) -> Result<TripModel> {
        let mut trip = TripModel::from_body(&self.db, body)?;
        trip.put(&self.db).await?;

        Ok(trip)
    }

    pub async fn get_all_trips(&self) -> Result<Vec<TripModel>> {
        models::query::<TripModel>(&self.db).await
    }

    pub async fn get_trip(&self, id: &str) -> Result<Option<TripModel>> {
        models::get_by_id::<TripModel>(&self.db, id).await
    }

    pub async fn delete_all_trips(&self) -> Result<u64> {
        TripModel::delete_all(&self.db).await
    }

    pub async fn delete_trip(&self, id: &str) -> Result<u64> {
        TripModel::key_from_id(&self.db, id)?.delete(&self.db).await
    }

    pub fn decode_key(&self, token: &str) -> Result<Key> {
        Key::decode_urlsafe(token, self.db.registry())
    }
}
