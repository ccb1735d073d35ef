use std::collections::BTreeMap;
use std::num::ParseIntError;

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::DatabaseError;
use crate::query::ColumnType;

/// A single bound parameter or result cell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i32),
    Int64(i64),
    Text(String),
}

impl Value {
    /// Parses command line input for a parameter of type `ty`.
    pub fn parse(ty: ColumnType, raw: &str) -> Result<Self, ParseIntError> {
        Ok(match ty {
            ColumnType::Integer => Value::Integer(raw.trim().parse()?),
            ColumnType::Int64 => Value::Int64(raw.trim().parse()?),
            ColumnType::Text => Value::Text(raw.to_string()),
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "int",
            Value::Int64(_) => "int64",
            Value::Text(_) => "text",
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(v) => serde_json::Value::from(*v),
            Value::Int64(v) => serde_json::Value::from(*v),
            Value::Text(v) => serde_json::Value::from(v.as_str()),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Named parameter values, keyed without the leading `:`.
pub type Params = BTreeMap<String, Value>;

/// One result row, columns in select order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            Value::Integer(v) => Some(*v),
            Value::Int64(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Integer(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }

    /// Fills a model struct whose fields are named after the columns.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DatabaseError> {
        serde_json::from_value(self.to_json()).map_err(|e| DatabaseError::Decode(e.to_string()))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
