//! Typed read-only views over loosely typed JSON objects.
//!
//! Every model declares its fields as a static schema. [`Entity::materialize`]
//! walks that schema once, coercing scalar values the server sometimes sends
//! as strings and filling in empty objects/arrays for absent nested entities.
//! Accessors never fail: a missing or mistyped field yields the type's
//! default.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Semantic type of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Float,
    Bool,
    /// Nested object materialized into another model
    Entity,
    /// Sequence of nested objects
    EntityList,
}

/// One entry of a model schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

impl Field {
    #[must_use]
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }

    #[must_use]
    pub const fn str(name: &'static str) -> Self {
        Self::new(name, FieldType::Str)
    }

    #[must_use]
    pub const fn int(name: &'static str) -> Self {
        Self::new(name, FieldType::Int)
    }

    #[must_use]
    pub const fn float(name: &'static str) -> Self {
        Self::new(name, FieldType::Float)
    }

    #[must_use]
    pub const fn bool(name: &'static str) -> Self {
        Self::new(name, FieldType::Bool)
    }

    #[must_use]
    pub const fn entity(name: &'static str) -> Self {
        Self::new(name, FieldType::Entity)
    }

    #[must_use]
    pub const fn entity_list(name: &'static str) -> Self {
        Self::new(name, FieldType::EntityList)
    }
}

/// Snapshot of a raw JSON object with defaulting accessors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    raw: Map<String, Value>,
}

impl Entity {
    #[must_use]
    pub fn new(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    /// Wraps a JSON object; any other value gives an empty entity
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(raw) => Self::new(raw),
            _ => Self::default(),
        }
    }

    /// Builds an entity from `value`, normalizing the declared `fields`
    #[must_use]
    pub fn materialize(value: Value, fields: &[Field]) -> Self {
        let mut raw = match value {
            Value::Object(raw) => raw,
            _ => Map::new(),
        };

        for field in fields {
            let current = raw.remove(field.name).unwrap_or(Value::Null);
            if let Some(value) = coerce(current, field.ty) {
                raw.insert(field.name.to_string(), value);
            }
        }

        Self { raw }
    }

    #[must_use]
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    #[must_use]
    pub fn into_raw(self) -> Map<String, Value> {
        self.raw
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.raw.contains_key(name)
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }

    /// Text of a string field; numbers and booleans read as their JSON text
    #[must_use]
    pub fn str(&self, name: &str) -> Cow<'_, str> {
        match self.raw.get(name) {
            Some(Value::String(text)) => Cow::Borrowed(text),
            Some(Value::Number(number)) => Cow::Owned(number.to_string()),
            Some(Value::Bool(flag)) => Cow::Owned(flag.to_string()),
            _ => Cow::Borrowed(""),
        }
    }

    #[must_use]
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.raw.get(name).and_then(Value::as_str)
    }

    #[must_use]
    pub fn int(&self, name: &str) -> i64 {
        self.opt_int(name).unwrap_or_default()
    }

    #[must_use]
    pub fn opt_int(&self, name: &str) -> Option<i64> {
        self.raw.get(name).and_then(Value::as_i64)
    }

    /// Unsigned view of an integer field; negative values read as 0
    #[must_use]
    pub fn uint(&self, name: &str) -> u64 {
        self.raw
            .get(name)
            .and_then(Value::as_u64)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn float(&self, name: &str) -> f64 {
        self.raw
            .get(name)
            .and_then(Value::as_f64)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn bool(&self, name: &str) -> bool {
        self.raw
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or_default()
    }

    /// Deserializes a field into `T`, falling back to `T::default()`
    #[must_use]
    pub fn get<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        self.raw
            .get(name)
            .and_then(|value| T::deserialize(value).ok())
            .unwrap_or_default()
    }

    /// Materializes a nested object field
    #[must_use]
    pub fn nested<M: Model>(&self, name: &str) -> M {
        M::materialize(self.raw.get(name).cloned().unwrap_or(Value::Null))
    }

    /// Materializes every element of a nested sequence field
    #[must_use]
    pub fn nested_list<M: Model>(&self, name: &str) -> Vec<M> {
        match self.raw.get(name) {
            Some(Value::Array(items)) => items.iter().cloned().map(M::materialize).collect(),
            _ => Vec::new(),
        }
    }
}

fn coerce(value: Value, ty: FieldType) -> Option<Value> {
    match (ty, value) {
        (FieldType::Entity, value @ Value::Object(_)) => Some(value),
        (FieldType::Entity, _) => Some(Value::Object(Map::new())),
        (FieldType::EntityList, value @ Value::Array(_)) => Some(value),
        (FieldType::EntityList, _) => Some(Value::Array(Vec::new())),
        (_, Value::Null) => None,
        (FieldType::Int, Value::String(text)) => Some(
            text.trim()
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or(Value::String(text)),
        ),
        (FieldType::Float, Value::String(text)) => Some(
            text.trim()
                .parse::<f64>()
                .map(Value::from)
                .unwrap_or(Value::String(text)),
        ),
        (FieldType::Bool, Value::String(text)) => Some(if text == "true" {
            Value::Bool(true)
        } else if text == "false" {
            Value::Bool(false)
        } else {
            Value::String(text)
        }),
        (FieldType::Int, Value::Number(number)) => Some(integral(number)),
        (_, value) => Some(value),
    }
}

/// Whole floats such as `12.0` become integers, anything else is kept
#[allow(clippy::cast_possible_truncation)]
fn integral(number: serde_json::Number) -> Value {
    match number.as_f64() {
        Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 9.0e15 => {
            Value::from(float as i64)
        }
        _ => Value::Number(number),
    }
}

/// A typed model built from an [`Entity`]
pub trait Model: Sized {
    /// Declared fields, consulted by [`Entity::materialize`]
    const FIELDS: &'static [Field];

    fn from_entity(entity: Entity) -> Self;

    fn entity(&self) -> &Entity;

    #[must_use]
    fn materialize(value: Value) -> Self {
        Self::from_entity(Entity::materialize(value, Self::FIELDS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[Field] = &[
        Field::str("title"),
        Field::int("size"),
        Field::float("progress"),
        Field::bool("wanted"),
        Field::entity("detail"),
        Field::entity_list("file"),
    ];

    struct Sample(Entity);

    impl Model for Sample {
        const FIELDS: &'static [Field] = FIELDS;

        fn from_entity(entity: Entity) -> Self {
            Self(entity)
        }

        fn entity(&self) -> &Entity {
            &self.0
        }
    }

    #[test]
    fn test_empty_object_defaults() {
        let sample = Sample::materialize(json!({}));
        let entity = sample.entity();

        assert_eq!(0, entity.int("size"));
        assert_eq!(0, entity.uint("size"));
        assert_eq!("", entity.str("title"));
        assert_eq!(None, entity.opt_str("title"));
        assert!(!entity.bool("wanted"));
        assert!(entity.float("progress").abs() < f64::EPSILON);
        assert_eq!(Some(&json!({})), entity.value("detail"));
        assert_eq!(Some(&json!([])), entity.value("file"));
    }

    #[test]
    fn test_non_object_value_is_empty() {
        let entity = Entity::materialize(json!([1, 2]), &[Field::int("size")]);
        assert!(entity.raw().is_empty());
        assert_eq!(Entity::default(), Entity::from_value(json!("text")));
    }

    #[test]
    fn test_coerce_scalars() {
        let entity = Entity::materialize(
            json!({"title": 42, "size": "1024", "progress": "12.5", "wanted": "true"}),
            FIELDS,
        );

        assert_eq!("42", entity.str("title"));
        assert_eq!(Some(&json!(42)), entity.value("title"));
        assert_eq!(None, entity.opt_str("title"));
        assert_eq!(1024, entity.int("size"));
        assert!((entity.float("progress") - 12.5).abs() < f64::EPSILON);
        assert!(entity.bool("wanted"));
    }

    #[test]
    fn test_whole_float_reads_as_int() {
        let entity = Entity::materialize(json!({"size": 12.0, "title": true}), FIELDS);
        assert_eq!(12, entity.int("size"));
        assert_eq!(Some(12), entity.opt_int("size"));
        assert_eq!("true", entity.str("title"));

        let entity = Entity::materialize(json!({"size": 12.5}), FIELDS);
        assert_eq!(0, entity.int("size"));
        assert_eq!(Some(&json!(12.5)), entity.value("size"));
    }

    #[test]
    fn test_mistyped_field_reads_default() {
        let entity = Entity::materialize(json!({"size": "big", "detail": 5}), FIELDS);
        assert_eq!(0, entity.int("size"));
        assert_eq!(Some(&json!("big")), entity.value("size"));
        assert_eq!(Some(&json!({})), entity.value("detail"));
    }

    #[test]
    fn test_undeclared_fields_are_kept() {
        let entity = Entity::materialize(json!({"extra": [1]}), FIELDS);
        assert!(entity.contains("extra"));
        assert_eq!(vec![1u8], entity.get::<Vec<u8>>("extra"));
        assert_eq!(String::new(), entity.get::<String>("extra"));
    }

    #[test]
    fn test_nested_list() {
        let entity = Entity::materialize(json!({"file": [{"title": "a"}, 3]}), FIELDS);
        let files: Vec<Sample> = entity.nested_list("file");
        assert_eq!(2, files.len());
        assert_eq!("a", files[0].entity().str("title"));
        assert_eq!("", files[1].entity().str("title"));
    }
}
