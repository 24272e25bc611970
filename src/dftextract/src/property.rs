//! Uniform property schema
//!
//! Every backend reports its findings as [`Property`] values: a name, a
//! scalar/vector/matrix/file value, optional units and optional conditions
//! (e.g. the energy grid a density of states was sampled on).
//!
//! Properties are built with the constructors and `with_*` methods and are
//! read-only afterwards. The canonical name is attached by the driver.

use serde::Serialize;

/// A single value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Real(f64),
    Integer(i64),
    Text(String),
    Flag(bool),
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Pointer to a file inside the run directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReference {
    pub relative_path: String,
}

/// Scalar, vector, matrix or file-reference value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Value {
    Scalar(Scalar),
    Vector(Vec<Scalar>),
    Matrix(Vec<Vec<Scalar>>),
    Files(Vec<FileReference>),
}

impl Value {
    pub fn vector<T: Into<Scalar>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::Vector(items.into_iter().map(Into::into).collect())
    }

    pub fn matrix<T: Into<Scalar>, R: IntoIterator<Item = T>>(
        rows: impl IntoIterator<Item = R>,
    ) -> Self {
        Self::Matrix(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Scalar]> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&[Vec<Scalar>]> {
        match self {
            Self::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_files(&self) -> Option<&[FileReference]> {
        match self {
            Self::Files(f) => Some(f),
            _ => None,
        }
    }

    /// Real-valued matrix view, `None` if any entry is not numeric
    pub fn to_f64_matrix(&self) -> Option<Vec<Vec<f64>>> {
        self.as_matrix()?
            .iter()
            .map(|row| row.iter().map(Scalar::as_f64).collect())
            .collect()
    }

    /// Real-valued vector view, `None` if any entry is not numeric
    pub fn to_f64_vector(&self) -> Option<Vec<f64>> {
        self.as_vector()?.iter().map(Scalar::as_f64).collect()
    }
}

impl From<Scalar> for Value {
    fn from(v: Scalar) -> Self {
        Self::Scalar(v)
    }
}

macro_rules! scalar_value_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Scalar(v.into())
            }
        })*
    };
}

scalar_value_from!(f64, i64, bool, &str, String);

/// A named value a property was measured under
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub name: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

impl Condition {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            units: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }
}

/// One extracted physical property
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    name: String,
    value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    units: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conditions: Vec<Condition>,
}

impl Property {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            name: String::new(),
            value: value.into(),
            units: None,
            conditions: Vec::new(),
        }
    }

    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Self::new(Value::Scalar(value.into()))
    }

    /// Presence marker for boolean settings that are switched on
    pub fn flag() -> Self {
        Self::scalar(true)
    }

    pub fn files(paths: impl IntoIterator<Item = String>) -> Self {
        Self::new(Value::Files(
            paths
                .into_iter()
                .map(|relative_path| FileReference { relative_path })
                .collect(),
        ))
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub(crate) fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn condition(&self, name: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.name == name)
    }

    /// Shortcut for single real-valued properties
    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_scalar().and_then(Scalar::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_builder() {
        let p = Property::scalar(-10.5).with_units("eV").named("Total Energy");
        assert_eq!(p.name(), "Total Energy");
        assert_eq!(p.as_f64(), Some(-10.5));
        assert_eq!(p.units(), Some("eV"));
        assert!(p.conditions().is_empty());
    }

    #[test]
    fn test_matrix_view() {
        let v = Value::matrix([[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(v.to_f64_matrix(), Some(vec![vec![1.0, 2.0], vec![3.0, 4.0]]));

        let mixed = Value::Matrix(vec![vec![Scalar::from("Fe")]]);
        assert_eq!(mixed.to_f64_matrix(), None);
    }

    #[test]
    fn test_conditions() {
        let p = Property::new(Value::vector([0.1, 0.2]))
            .with_condition(Condition::new("energy", Value::vector([-1.0, 0.0])).with_units("eV"));
        let energy = p.condition("energy").unwrap();
        assert_eq!(energy.units.as_deref(), Some("eV"));
        assert_eq!(energy.value.to_f64_vector(), Some(vec![-1.0, 0.0]));
        assert!(p.condition("missing").is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let p = Property::files(["OUTCAR".to_string()]).named("Output File");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["name"], "Output File");
        assert_eq!(json["value"]["kind"], "files");
        assert_eq!(json["value"]["data"][0]["relative_path"], "OUTCAR");
        assert!(json.get("units").is_none());

        let p = Property::scalar(true);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["value"]["data"], true);
    }
}
