use bson::Bson;

use serde_json::{json, Map, Value as JsonValue};

use crate::models::ModelType;
use crate::orm::property::{KeyProperty, Property, StringProperty};
use crate::orm::{Db, Error, Field, Key, Model, Registry, Result, Schema, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Reads the `[x, y]` float pair held by a waypoint slot.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.as_list()? {
            [x, y] => Some(Self::new(x.as_f64()?, y.as_f64()?)),
            _ => None,
        }
    }
}

impl From<Coordinate> for Value {
    fn from(coordinate: Coordinate) -> Self {
        Value::List(vec![Value::Float(coordinate.x), Value::Float(coordinate.y)])
    }
}

/// Stores a `Coordinate`, held as a `[x, y]` float list, as a two element array.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateProperty;

impl CoordinateProperty {
    fn number(value: &Bson) -> Option<f64> {
        match value {
            Bson::Double(value) => Some(*value),
            Bson::Int32(value) => Some(f64::from(*value)),
            Bson::Int64(value) => Some(*value as f64),
            _ => None,
        }
    }
}

impl Property for CoordinateProperty {
    fn pack(&self, value: &Value) -> Result<Bson> {
        match value {
            Value::Null => Ok(Bson::Null),
            Value::List(_) => match Coordinate::from_value(value) {
                Some(coordinate) => Ok(Bson::Array(vec![
                    Bson::Double(coordinate.x),
                    Bson::Double(coordinate.y),
                ])),
                None => Err(Error::InvalidArgument(format!(
                    "Not a coordinate: {:?}",
                    value
                ))),
            },
            other => Err(Error::InvalidArgument(format!(
                "CoordinateProperty cannot hold a {} value",
                other.kind()
            ))),
        }
    }

    fn unpack(&self, value: Bson, _registry: &Registry) -> Result<Value> {
        match value {
            Bson::Null => Ok(Value::Null),
            Bson::Array(ref pair) if pair.len() == 2 => {
                match (Self::number(&pair[0]), Self::number(&pair[1])) {
                    (Some(x), Some(y)) => Ok(Coordinate::new(x, y).into()),
                    _ => Err(Error::InvalidArgument(format!(
                        "Not a coordinate: {}",
                        value
                    ))),
                }
            }
            other => Err(Error::InvalidArgument(format!(
                "Not a coordinate: {}",
                other
            ))),
        }
    }

    /// Accepts `{"x": .., "y": ..}` as well as `[x, y]`.
    fn from_json(&self, value: JsonValue, registry: &Registry) -> Result<Value> {
        match value {
            JsonValue::Object(_) => serde_json::from_value::<Coordinate>(value)
                .map(Value::from)
                .map_err(|e| Error::InvalidArgument(format!("Not a coordinate: {}", e))),
            other => {
                let value = bson::to_bson(&other)
                    .map_err(|e| Error::InvalidArgument(format!("Not a coordinate: {}", e)))?;

                self.unpack(value, registry)
            }
        }
    }
}

/// A named route owned by a user.
#[derive(Debug, Clone)]
pub struct TripModel(Model);

impl TripModel {
    const NAME_FIELD: &'static str = "name";
    const AUTHOR_FIELD: &'static str = "author";
    const WAYPOINTS_FIELD: &'static str = "waypoints";

    pub fn new<S: Into<String>>(db: &Db, name: S, author: Key) -> Result<Self> {
        let name: String = name.into();
        let mut trip = Self::create(db)?;
        trip.0.set(Self::NAME_FIELD, name)?;
        trip.0.set(Self::AUTHOR_FIELD, author)?;

        Ok(trip)
    }

    /// Builds a trip from a request body; `author` is a user id.
    pub fn from_body(db: &Db, mut body: Map<String, JsonValue>) -> Result<Self> {
        let author = match body.remove(Self::AUTHOR_FIELD) {
            Some(JsonValue::String(id)) => Self::author_key(db, id)?,
            Some(other) => {
                return Err(Error::InvalidArgument(format!(
                    "author must be a user id, got {}",
                    other
                )))
            }
            None => return Err(Error::InvalidArgument("author is required".into())),
        };

        let mut trip = Model::from_body(db.schema(Self::name())?, body, db.registry())?;
        trip.set(Self::AUTHOR_FIELD, author)?;

        Ok(Self(trip))
    }

    pub fn author_key<S: Into<String>>(db: &Db, id: S) -> Result<Key> {
        crate::models::UserModel::key_from_id(db, id)
    }

    pub fn trip_name(&self) -> Option<&str> {
        self.0.get(Self::NAME_FIELD).and_then(Value::as_str)
    }

    pub fn author(&self) -> Option<&Key> {
        self.0.get(Self::AUTHOR_FIELD).and_then(Value::as_key)
    }

    pub fn waypoints(&self) -> Vec<Coordinate> {
        self.0
            .get(Self::WAYPOINTS_FIELD)
            .and_then(Value::as_list)
            .map(|values| values.iter().filter_map(Coordinate::from_value).collect())
            .unwrap_or_default()
    }

    pub fn add_waypoint(&mut self, waypoint: Coordinate) -> Result<()> {
        let mut waypoints = self
            .0
            .get(Self::WAYPOINTS_FIELD)
            .and_then(Value::as_list)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        waypoints.push(waypoint.into());

        self.0.set(Self::WAYPOINTS_FIELD, waypoints)
    }

    pub async fn put(&mut self, db: &Db) -> Result<()> {
        self.0.put(db).await.map(|_| ())
    }

    pub async fn delete_all(db: &Db) -> Result<u64> {
        Model::delete_all(db, &db.schema(Self::name())?).await
    }
}

impl ModelType for TripModel {
    fn name() -> &'static str {
        "TripModel"
    }

    fn schema() -> Schema {
        Schema::new(Self::name())
            .with_field(Field::new(Self::NAME_FIELD, StringProperty).required())
            .with_field(Field::new(Self::AUTHOR_FIELD, KeyProperty).required())
            .with_field(
                Field::new(Self::WAYPOINTS_FIELD, CoordinateProperty)
                    .multiple()
                    .with_default(Value::List(Vec::new())),
            )
    }

    fn wrap(model: Model) -> Self {
        Self(model)
    }

    fn model(&self) -> &Model {
        &self.0
    }

    fn to_public(&self) -> JsonValue {
        json!({
            "name": self.trip_name(),
            "author": self.author().map(Key::id),
            "waypoints": self.waypoints(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::models;
    use crate::orm::store::memory::Memory;

    const AUTHOR_ID: &str = "5f1d7c2e9a1b4c3d2e1f0a9b";

    fn db() -> Db {
        Db::new(Arc::new(Memory::new()), models::registry().unwrap())
    }

    #[test]
    fn test_storable_author_is_compact_token() {
        let db = db();
        let author = TripModel::author_key(&db, AUTHOR_ID).unwrap();
        let trip = TripModel::new(&db, "Coast", author.clone()).unwrap();

        let document = trip.model().to_document().unwrap();
        assert_eq!(
            document.get_str("author").unwrap(),
            format!("UserModel:{}", AUTHOR_ID)
        );
        assert_eq!(document.get_str("author").unwrap(), author.serialize());
        assert_eq!(document.get_array("waypoints").unwrap().len(), 0);
    }

    #[test]
    fn test_coordinate_round_trip() {
        let registry = models::registry().unwrap();
        let value = Value::from(Coordinate::new(1.5, -2.0));
        let packed = CoordinateProperty.pack(&value).unwrap();
        assert_eq!(packed, Bson::Array(vec![Bson::Double(1.5), Bson::Double(-2.0)]));
        assert_eq!(CoordinateProperty.unpack(packed, &registry).unwrap(), value);
        assert_eq!(Coordinate::from_value(&value), Some(Coordinate::new(1.5, -2.0)));
    }

    #[test]
    fn test_coordinate_rejects_non_float_pairs() {
        let values = vec![
            Value::List(vec![Value::Float(1.0)]),
            Value::List(vec![Value::Int(1), Value::Int(2)]),
            Value::String("1,2".into()),
        ];

        for value in values {
            assert!(matches!(
                CoordinateProperty.pack(&value),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_coordinate_rejects_bad_arrays() {
        let registry = models::registry().unwrap();
        let result = CoordinateProperty.unpack(Bson::Array(vec![Bson::Double(1.0)]), &registry);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_public_projection() {
        let db = db();
        let author = TripModel::author_key(&db, AUTHOR_ID).unwrap();
        let mut trip = TripModel::new(&db, "Coast", author).unwrap();
        trip.add_waypoint(Coordinate::new(1.0, 2.0)).unwrap();

        assert_eq!(
            trip.to_public(),
            json!({
                "name": "Coast",
                "author": AUTHOR_ID,
                "waypoints": [{ "x": 1.0, "y": 2.0 }],
            })
        );
    }

    #[test]
    fn test_from_body() {
        let db = db();
        let body = json!({
            "name": "Coast",
            "author": AUTHOR_ID,
            "waypoints": [{ "x": 1, "y": 2 }, [3, 4]],
        });

        let trip = TripModel::from_body(&db, body.as_object().cloned().unwrap()).unwrap();
        assert_eq!(trip.trip_name(), Some("Coast"));
        assert_eq!(trip.author().map(Key::id), Some(AUTHOR_ID));
        assert_eq!(
            trip.waypoints(),
            vec![Coordinate::new(1.0, 2.0), Coordinate::new(3.0, 4.0)]
        );
    }

    #[test]
    fn test_from_body_requires_author() {
        let db = db();
        let body = json!({ "name": "Coast" });
        assert!(TripModel::from_body(&db, body.as_object().cloned().unwrap()).is_err());
    }

    #[actix_rt::test]
    async fn test_put_then_load() {
        let db = db();
        let author = TripModel::author_key(&db, AUTHOR_ID).unwrap();
        let mut trip = TripModel::new(&db, "Coast", author.clone()).unwrap();
        trip.add_waypoint(Coordinate::new(1.0, 2.0)).unwrap();
        trip.put(&db).await.unwrap();

        let id = trip.key().unwrap().id().to_string();
        let loaded = models::load::<TripModel>(&db, &id).await.unwrap();
        assert_eq!(loaded.trip_name(), Some("Coast"));
        assert_eq!(loaded.author(), Some(&author));
        assert_eq!(loaded.waypoints(), vec![Coordinate::new(1.0, 2.0)]);

        assert!(models::load::<models::UserModel>(&db, &id).await.is_err());
        assert_eq!(models::query::<TripModel>(&db).await.unwrap().len(), 1);
        assert_eq!(TripModel::delete_all(&db).await.unwrap(), 1);
    }
}
