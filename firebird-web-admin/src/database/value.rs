//! Typed cell values and ordered rows
//!
//! Firebird values are converted into [`CellValue`] as soon as they leave the
//! driver, and JSON request bodies are converted into the same type before any
//! SQL is built.

use rsfbclient::SqlType;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::database::query::{encode_row_key, is_row_key_column};
use crate::schema::Column;

/// A single column value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    /// Raw bytes; serialized to JSON as a hex string
    Bytes(Vec<u8>),
}

impl CellValue {
    /// Convert a driver value into a cell
    ///
    /// Binary values are decoded as UTF-8 text. The row-key column is the
    /// exception: it is hex-encoded so the client can send it back verbatim.
    pub fn from_sql(column_name: &str, value: SqlType) -> Self {
        match value {
            SqlType::Null => CellValue::Null,
            SqlType::Integer(value) => CellValue::Integer(value),
            SqlType::Floating(value) => CellValue::Float(value),
            SqlType::Boolean(value) => CellValue::Boolean(value),
            SqlType::Text(value) => CellValue::Text(value),
            SqlType::Timestamp(value) => {
                CellValue::Text(value.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            SqlType::Binary(bytes) => {
                if is_row_key_column(column_name) {
                    CellValue::Text(encode_row_key(&bytes))
                } else {
                    match String::from_utf8(bytes) {
                        Ok(text) => CellValue::Text(text),
                        Err(error) => CellValue::Bytes(error.into_bytes()),
                    }
                }
            }
        }
    }

    /// Convert a cell into a positional statement parameter
    pub fn into_sql(self) -> SqlType {
        match self {
            CellValue::Null => SqlType::Null,
            CellValue::Integer(value) => SqlType::Integer(value),
            CellValue::Float(value) => SqlType::Floating(value),
            CellValue::Boolean(value) => SqlType::Boolean(value),
            CellValue::Text(value) => SqlType::Text(value),
            CellValue::Bytes(value) => SqlType::Binary(value),
        }
    }

    /// Type label used for result columns that have no catalog entry
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "UNKNOWN",
            CellValue::Integer(_) => "INTEGER",
            CellValue::Float(_) => "DOUBLE PRECISION",
            CellValue::Boolean(_) => "BOOLEAN",
            CellValue::Text(_) => "VARCHAR",
            CellValue::Bytes(_) => "BLOB",
        }
    }

    fn from_json(value: serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Null => Ok(CellValue::Null),
            serde_json::Value::Bool(value) => Ok(CellValue::Boolean(value)),
            serde_json::Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Ok(CellValue::Integer(value))
                } else if let Some(value) = number.as_f64() {
                    Ok(CellValue::Float(value))
                } else {
                    Err(format!("unsupported number: {}", number))
                }
            }
            serde_json::Value::String(value) => Ok(CellValue::Text(value)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err("expected a scalar value".to_string())
            }
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Integer(value) => serializer.serialize_i64(*value),
            CellValue::Float(value) => {
                if value.is_finite() {
                    serializer.serialize_f64(*value)
                } else {
                    serializer.serialize_none()
                }
            }
            CellValue::Boolean(value) => serializer.serialize_bool(*value),
            CellValue::Text(value) => serializer.serialize_str(value),
            CellValue::Bytes(value) => serializer.serialize_str(&hex::encode(value)),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        CellValue::from_json(value).map_err(de::Error::custom)
    }
}

/// An ordered association of column names to values
///
/// Serialized as a JSON object with keys in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(Vec<(String, CellValue)>);

impl Row {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a column, replacing the value if the name is already present
    pub fn insert(&mut self, name: impl Into<String>, value: CellValue) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Look up a value by exact name, falling back to a case-insensitive match
    pub fn get_ignore_case(&self, name: &str) -> Option<&CellValue> {
        self.get(name).or_else(|| {
            self.0
                .iter()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert a driver row, keeping the driver's column order
    pub fn from_sql_row(row: rsfbclient::Row) -> Self {
        let mut converted = Row::new();
        for column in row.cols {
            let value = CellValue::from_sql(&column.name, column.value);
            converted.insert(column.name, value);
        }
        converted
    }

    /// Describe the columns of a result set from its first row
    ///
    /// Used for ad-hoc queries, where no catalog lookup is possible.
    pub fn infer_columns(&self) -> Vec<Column> {
        self.0
            .iter()
            .map(|(name, value)| Column {
                name: name.clone(),
                data_type: value.type_name().to_string(),
                read_only: is_row_key_column(name),
            })
            .collect()
    }
}

impl FromIterator<(String, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object mapping column names to scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut row = Row::new();
        while let Some((name, value)) = access.next_entry::<String, CellValue>()? {
            row.insert(name, value);
        }
        Ok(row)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Row::new())
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RowVisitor)
    }
}
