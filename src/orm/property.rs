use std::fmt;

use bson::spec::BinarySubtype;
use bson::{Binary, Bson};

use serde_json::Value as JsonValue;

use crate::orm::error::{Error, Result};
use crate::orm::key::Key;
use crate::orm::schema::Registry;
use crate::orm::value::Value;

/// Codec between a typed attribute value and its document-storable form.
///
/// Every implementation maps `Value::Null` to `Bson::Null` and back.
pub trait Property: fmt::Debug + Send + Sync {
    fn pack(&self, value: &Value) -> Result<Bson>;

    fn unpack(&self, value: Bson, registry: &Registry) -> Result<Value>;

    /// Reads a value out of a JSON request body.
    fn from_json(&self, value: JsonValue, registry: &Registry) -> Result<Value> {
        let value = bson::to_bson(&value)
            .map_err(|e| Error::InvalidArgument(format!("Not a storable value: {}", e)))?;

        self.unpack(value, registry)
    }
}

fn wrong_type(property: &str, value: &Value) -> Error {
    Error::InvalidArgument(format!(
        "{} cannot hold a {} value",
        property,
        value.kind()
    ))
}

/// Identity codec for values that are already store-native.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProperty;

impl Property for JsonProperty {
    fn pack(&self, value: &Value) -> Result<Bson> {
        Ok(match value {
            Value::Null => Bson::Null,
            Value::Bool(value) => Bson::Boolean(*value),
            Value::Int(value) => Bson::Int64(*value),
            Value::Float(value) => Bson::Double(*value),
            Value::String(value) => Bson::String(value.clone()),
            Value::Bytes(bytes) => Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: bytes.clone(),
            }),
            Value::List(values) => Bson::Array(
                values
                    .iter()
                    .map(|value| self.pack(value))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Json(value) => match Value::from_bson(value.clone()) {
                Value::Json(value) => value,
                typed => {
                    return Err(Error::InvalidArgument(format!(
                        "JsonProperty reads {:?} back as a {} value, store it as one",
                        value.element_type(),
                        typed.kind()
                    )))
                }
            },
            other => return Err(wrong_type("JsonProperty", other)),
        })
    }

    fn unpack(&self, value: Bson, _registry: &Registry) -> Result<Value> {
        Ok(Value::from_bson(value))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringProperty;

impl Property for StringProperty {
    fn pack(&self, value: &Value) -> Result<Bson> {
        match value {
            Value::Null => Ok(Bson::Null),
            Value::String(value) => Ok(Bson::String(value.clone())),
            other => Err(wrong_type("StringProperty", other)),
        }
    }

    fn unpack(&self, value: Bson, _registry: &Registry) -> Result<Value> {
        match value {
            Bson::Null => Ok(Value::Null),
            Bson::String(value) => Ok(Value::String(value)),
            other => Err(Error::InvalidArgument(format!(
                "StringProperty cannot read {:?}",
                other.element_type()
            ))),
        }
    }
}

/// Raw bytes, stored as generic BSON binary. Used for password hashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteStringProperty;

impl Property for ByteStringProperty {
    fn pack(&self, value: &Value) -> Result<Bson> {
        match value {
            Value::Null => Ok(Bson::Null),
            Value::Bytes(bytes) => Ok(Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: bytes.clone(),
            })),
            other => Err(wrong_type("ByteStringProperty", other)),
        }
    }

    fn unpack(&self, value: Bson, _registry: &Registry) -> Result<Value> {
        match value {
            Bson::Null => Ok(Value::Null),
            Bson::Binary(binary) => Ok(Value::Bytes(binary.bytes)),
            other => Err(Error::InvalidArgument(format!(
                "ByteStringProperty cannot read {:?}",
                other.element_type()
            ))),
        }
    }

    fn from_json(&self, value: JsonValue, _registry: &Registry) -> Result<Value> {
        match value {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::String(value) => Ok(Value::Bytes(value.into_bytes())),
            other => Err(Error::InvalidArgument(format!(
                "ByteStringProperty expects a string, got {}",
                other
            ))),
        }
    }
}

/// Reference to another entity, stored as the key's compact token.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyProperty;

impl Property for KeyProperty {
    fn pack(&self, value: &Value) -> Result<Bson> {
        match value {
            Value::Null => Ok(Bson::Null),
            Value::Key(key) => Ok(Bson::String(key.serialize())),
            other => Err(Error::InvalidArgument(format!(
                "KeyProperty must contain a Key, got {}",
                other.kind()
            ))),
        }
    }

    fn unpack(&self, value: Bson, registry: &Registry) -> Result<Value> {
        match value {
            Bson::Null => Ok(Value::Null),
            Bson::String(serial) => Key::decode(&serial, registry).map(Value::Key),
            other => Err(Error::MalformedKey(format!(
                "expected a serialized key, got {:?}",
                other.element_type()
            ))),
        }
    }
}
