use log::warn;

use serde_json::json;

use crate::models::ModelType;
use crate::orm::property::{ByteStringProperty, StringProperty};
use crate::orm::{Db, Field, Model, Result, Schema, Value};

/// Account holder. The password slot only ever holds a bcrypt hash.
#[derive(Debug, Clone)]
pub struct UserModel(Model);

impl UserModel {
    pub const BCRYPT_ROUNDS: u32 = 12;

    const EMAIL: &'static str = "email";
    const PASSWORD: &'static str = "password";

    pub fn new<S: Into<String>>(db: &Db, email: S) -> Result<Self> {
        let email: String = email.into();
        let mut user = Self::create(db)?;
        user.0.set(Self::EMAIL, email)?;

        Ok(user)
    }

    pub fn email(&self) -> Option<&str> {
        self.0.get(Self::EMAIL).and_then(Value::as_str)
    }

    pub fn password(&self) -> Option<&[u8]> {
        self.0.get(Self::PASSWORD).and_then(Value::as_bytes)
    }

    /// Salted bcrypt hash of `password` with the given work factor.
    pub fn hash_password(password: &str, cost: u32) -> Result<Vec<u8>> {
        Ok(bcrypt::hash(password, cost)?.into_bytes())
    }

    pub fn set_password(&mut self, password: &str, cost: u32) -> Result<()> {
        let hashed = Self::hash_password(password, cost)?;
        self.set_password_hash(hashed)
    }

    pub fn set_password_hash(&mut self, hashed: Vec<u8>) -> Result<()> {
        self.0.set(Self::PASSWORD, hashed)
    }

    /// Re-hashes `password` with the salt stored in the current hash.
    pub fn check_password(&self, password: &str) -> bool {
        let hashed = match self.password().map(std::str::from_utf8) {
            Some(Ok(hashed)) => hashed,
            Some(Err(_)) => {
                warn!("Stored password hash of {:?} is not UTF-8", self.email());
                return false;
            }
            None => return false,
        };

        bcrypt::verify(password, hashed).unwrap_or_else(|e| {
            warn!("Password check for {:?} failed: {}", self.email(), e);
            false
        })
    }

    pub async fn find_by_email(db: &Db, email: &str) -> Result<Option<Self>> {
        let users = Model::fetch_by(
            db,
            &db.schema(Self::name())?,
            Self::EMAIL,
            &Value::from(email),
        )
        .await?;

        Ok(users.into_iter().next().map(Self))
    }

    pub async fn put(&mut self, db: &Db) -> Result<()> {
        self.0.put(db).await.map(|_| ())
    }
}

impl ModelType for UserModel {
    fn name() -> &'static str {
        "UserModel"
    }

    fn schema() -> Schema {
        Schema::new(Self::name())
            .with_field(Field::new(Self::EMAIL, StringProperty).required())
            .with_field(Field::new(Self::PASSWORD, ByteStringProperty).required())
    }

    fn wrap(model: Model) -> Self {
        Self(model)
    }

    fn model(&self) -> &Model {
        &self.0
    }

    fn to_public(&self) -> serde_json::Value {
        json!({
            "email": self.email(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::models;
    use crate::orm::store::memory::Memory;
    use crate::orm::Error;

    const TEST_COST: u32 = 4;

    fn db() -> Db {
        Db::new(Arc::new(Memory::new()), models::registry().unwrap())
    }

    #[test]
    fn test_password_check() {
        let db = db();
        let mut user = UserModel::new(&db, "a@example.com").unwrap();
        assert!(!user.check_password("secret"));

        user.set_password("secret", TEST_COST).unwrap();
        assert!(user.check_password("secret"));
        assert!(!user.check_password("wrong"));
        assert_ne!(user.password().unwrap(), b"secret");
    }

    #[test]
    fn test_public_projection_hides_password() {
        let db = db();
        let mut user = UserModel::new(&db, "a@example.com").unwrap();
        user.set_password("secret", TEST_COST).unwrap();

        let public = user.to_public();
        assert_eq!(public, json!({ "email": "a@example.com" }));
        assert!(public.get("password").is_none());
    }

    #[actix_rt::test]
    async fn test_put_requires_password() {
        let db = db();
        let mut user = UserModel::new(&db, "a@example.com").unwrap();
        assert!(matches!(
            user.put(&db).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(user.key().is_none());
    }

    #[actix_rt::test]
    async fn test_stored_hash_still_verifies() {
        let db = db();
        let mut user = UserModel::new(&db, "a@example.com").unwrap();
        user.set_password("secret", TEST_COST).unwrap();
        user.put(&db).await.unwrap();

        let id = user.key().unwrap().id().to_string();
        let loaded = models::load::<UserModel>(&db, &id).await.unwrap();
        assert_eq!(loaded.email(), Some("a@example.com"));
        assert!(loaded.check_password("secret"));

        let found = UserModel::find_by_email(&db, "a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.key(), user.key());
        assert!(UserModel::find_by_email(&db, "b@example.com")
            .await
            .unwrap()
            .is_none());
    }
}
