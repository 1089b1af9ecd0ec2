//! Entities: opaque JSON records carrying at least an `id` and a `name`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of an entity within its collection.
///
/// Matching is strict: `Number(1)` never matches the JSON string `"1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl EntityId {
    /// True when `value` is the same kind and equal.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Number(n) => value.as_i64() == Some(*n),
            Self::Text(s) => value.as_str() == Some(s.as_str()),
        }
    }

    /// Extract an id from a JSON value (integers and strings only).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Id from a path or query string: integers become `Number`, anything else `Text`.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        s.parse::<i64>()
            .map(Self::Number)
            .unwrap_or_else(|_| Self::Text(s.to_string()))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// One record of a collection. Opaque beyond `id`, `name` and the fields filters read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(Map<String, Value>);

impl Entity {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wraps a JSON object; any other JSON kind is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        self.id().and_then(EntityId::from_value)
    }

    /// Name, or empty string when missing or not a string.
    pub fn name(&self) -> &str {
        self.0.get("name").and_then(Value::as_str).unwrap_or("")
    }

    /// Field lookup; dotted paths descend into nested objects (`metadata.tier`).
    pub fn get(&self, field: &str) -> Option<&Value> {
        let mut parts = field.split('.');
        let first = parts.next()?;
        let mut current = self.0.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Numeric view of a field. Strings and booleans are not coerced.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn bool_field(&self, field: &str) -> bool {
        self.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    /// String items of a list-valued field; non-strings are skipped.
    pub fn str_list(&self, field: &str) -> Vec<&str> {
        self.get(field)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        entity.into_value()
    }
}

/// Keeps JSON objects, dropping anything else with a warning.
pub fn entities_from_values(values: Vec<Value>) -> Vec<Entity> {
    let total = values.len();
    let entities: Vec<Entity> = values.into_iter().filter_map(Entity::from_value).collect();
    if entities.len() != total {
        tracing::warn!(
            target: "codex::entity",
            dropped = total - entities.len(),
            "Skipped non-object items in collection"
        );
    }
    entities
}

/// Removes duplicate ids. The last occurrence wins and takes the position of the first.
/// Entities without an id are kept as-is.
pub fn dedup_by_id(entities: Vec<Entity>) -> Vec<Entity> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Entity> = Vec::with_capacity(entities.len());
    for entity in entities {
        let Some(id) = entity.id().map(Value::to_string) else {
            out.push(entity);
            continue;
        };
        match positions.get(&id) {
            Some(&pos) => out[pos] = entity,
            None => {
                positions.insert(id, out.len());
                out.push(entity);
            }
        }
    }
    out
}
