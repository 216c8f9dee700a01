use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Prefix markup-derived structures put in front of attribute names.
pub const ATTRIBUTE_PREFIX: &str = "@";

/// Tabular data with a header row, as produced from CSV payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|header| header == name)
    }

    /// Rows as objects keyed by header. Cells past the last header are dropped.
    pub fn to_records(&self) -> Value {
        let records = self
            .rows
            .iter()
            .map(|row| {
                let record: Map<String, Value> = self
                    .headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, cell)| (header.clone(), Value::String(cell.clone())))
                    .collect();
                Value::Object(record)
            })
            .collect();
        Value::Array(records)
    }

    /// Header row followed by the data rows, all as string arrays.
    pub fn to_rows(&self) -> Value {
        let row = |cells: &Vec<String>| Value::Array(cells.iter().cloned().map(Value::String).collect());
        Value::Array(
            std::iter::once(&self.headers)
                .chain(self.rows.iter())
                .map(row)
                .collect(),
        )
    }
}

/// A parsed payload: either a nested tree or a table exposing headers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Structure {
    Tree(Value),
    Table(Table),
}

impl Structure {
    pub fn headers(&self) -> Option<&[String]> {
        match self {
            Structure::Table(table) => Some(&table.headers),
            Structure::Tree(_) => None,
        }
    }

    /// Uniform nested view used by path walks. Tables read as records.
    pub fn as_value(&self) -> Cow<'_, Value> {
        match self {
            Structure::Tree(value) => Cow::Borrowed(value),
            Structure::Table(table) => Cow::Owned(table.to_records()),
        }
    }

    /// View used for similarity. Tables read as raw rows, header included,
    /// so a CSV scores against other payloads the way its text is laid out.
    pub fn as_rows_value(&self) -> Cow<'_, Value> {
        match self {
            Structure::Tree(value) => Cow::Borrowed(value),
            Structure::Table(table) => Cow::Owned(table.to_rows()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Structure::Tree(value) => ValueKind::of(value),
            Structure::Table(_) => ValueKind::Array,
        }
    }
}

impl From<Value> for Structure {
    fn from(value: Value) -> Self {
        Structure::Tree(value)
    }
}

impl From<Table> for Structure {
    fn from(table: Table) -> Self {
        Structure::Table(table)
    }
}

/// Output of a structured-data loader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadedStructure {
    pub structure: Option<Structure>,
    pub confidence: f64,
}

impl LoadedStructure {
    pub fn new(structure: impl Into<Structure>, confidence: f64) -> Self {
        Self {
            structure: Some(structure.into()),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn failed() -> Self {
        Self {
            structure: None,
            confidence: 0.0,
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.structure.is_some() && self.confidence > 0.0
    }

    /// The structure, if its confidence clears `threshold`.
    pub fn trusted(&self, threshold: f64) -> Option<&Structure> {
        if self.confidence >= threshold {
            self.structure.as_ref()
        } else {
            None
        }
    }
}

/// Runtime type tag of a parsed value. Integers and floats are distinct
/// kinds, as are booleans and numbers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(number) if number.is_f64() => ValueKind::Float,
            Value::Number(_) => ValueKind::Integer,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, ValueKind::Array | ValueKind::Object)
    }
}
