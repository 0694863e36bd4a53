use std::collections::HashMap;
use std::sync::Arc;

use bson::Bson;

use serde_json::Value as JsonValue;

use crate::orm::error::{Error, Result};
use crate::orm::property::Property;
use crate::orm::value::Value;

/// One declared attribute of a model type.
#[derive(Debug)]
pub struct Field {
    name: &'static str,
    property: Box<dyn Property>,
    required: bool,
    multiple: bool,
    default: Value,
}

impl Field {
    pub fn new<P: 'static + Property>(name: &'static str, property: P) -> Self {
        Self {
            name,
            property: Box::new(property),
            required: false,
            multiple: false,
            default: Value::Null,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The slot holds a list; each element goes through the codec.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn with_default<V: Into<Value>>(mut self, value: V) -> Self {
        self.default = value.into();
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn pack(&self, value: &Value) -> Result<Bson> {
        match value {
            Value::Null if self.required => Err(Error::InvalidArgument(format!(
                "Field \"{}\" is required",
                self.name
            ))),
            Value::Null => Ok(Bson::Null),
            Value::List(values) if self.multiple => Ok(Bson::Array(
                values
                    .iter()
                    .map(|value| self.property.pack(value))
                    .collect::<Result<Vec<_>>>()?,
            )),
            other if self.multiple => Err(Error::InvalidArgument(format!(
                "Field \"{}\" holds a list, got {}",
                self.name,
                other.kind()
            ))),
            other => self.property.pack(other),
        }
    }

    /// Packs a single element, ignoring `multiple`. Used for equality lookups.
    pub fn pack_element(&self, value: &Value) -> Result<Bson> {
        self.property.pack(value)
    }

    pub fn unpack(&self, value: Bson, registry: &Registry) -> Result<Value> {
        match value {
            Bson::Null => Ok(Value::Null),
            Bson::Array(values) if self.multiple => Ok(Value::List(
                values
                    .into_iter()
                    .map(|value| self.property.unpack(value, registry))
                    .collect::<Result<Vec<_>>>()?,
            )),
            other if self.multiple => Err(Error::InvalidArgument(format!(
                "Field \"{}\" expects a stored array, got {:?}",
                self.name,
                other.element_type()
            ))),
            other => self.property.unpack(other, registry),
        }
    }

    pub fn from_json(&self, value: JsonValue, registry: &Registry) -> Result<Value> {
        match value {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Array(values) if self.multiple => Ok(Value::List(
                values
                    .into_iter()
                    .map(|value| self.property.from_json(value, registry))
                    .collect::<Result<Vec<_>>>()?,
            )),
            other if self.multiple => Err(Error::InvalidArgument(format!(
                "Field \"{}\" expects an array, got {}",
                self.name, other
            ))),
            other => self.property.from_json(other, registry),
        }
    }
}

/// Ordered field list of one concrete model type, built once at registration.
#[derive(Debug)]
pub struct Schema {
    name: &'static str,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        debug_assert!(
            self.position(field.name()).is_none(),
            "field {} declared twice on {}",
            field.name(),
            self.name
        );

        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name() == name)
    }
}

/// Name to model type lookup used when decoding keys.
///
/// Filled once at startup and shared read-only afterwards.
#[derive(Debug, Default)]
pub struct Registry {
    models: HashMap<&'static str, Arc<Schema>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schema: Schema) -> Result<Arc<Schema>> {
        if self.models.contains_key(schema.name()) {
            return Err(Error::DuplicateModel(schema.name().into()));
        }

        let schema = Arc::new(schema);
        self.models.insert(schema.name(), schema.clone());

        Ok(schema)
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<Schema>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownModel(name.into()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names = self.models.keys().copied().collect::<Vec<_>>();
        names.sort_unstable();

        names
    }
}
