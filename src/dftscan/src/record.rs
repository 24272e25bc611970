//! Scanner output records

use serde::Serialize;
use std::collections::BTreeMap;

/// A single value recognised on a line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Float(f64),
    Int(i64),
    Text(String),
}

impl Field {
    /// Numeric view; integers widen to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Key → value mapping produced for one line or block
pub type Record = BTreeMap<&'static str, Field>;

/// Drop records that carry no fields
pub fn remove_empty(records: Vec<Record>) -> Vec<Record> {
    records.into_iter().filter(|r| !r.is_empty()).collect()
}

/// Turn a list of records into one column per key
///
/// Column order follows key order; a key missing from some records simply
/// yields a shorter column.
pub fn transpose(records: &[Record]) -> BTreeMap<&'static str, Vec<Field>> {
    let mut columns: BTreeMap<&'static str, Vec<Field>> = BTreeMap::new();
    for record in records {
        for (key, field) in record {
            columns.entry(*key).or_default().push(field.clone());
        }
    }
    columns
}
