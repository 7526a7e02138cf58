//! Vector feature records with a typed field schema
//!
//! Attribute access goes through a schema resolved once at load time into
//! stable integer indices; a missing field raises `FieldNotFound` instead of
//! deferring to a silent `None`. Per-feature operations return explicit
//! per-item results aggregated into a batch report, so one bad record does
//! not abort the whole dataset.

use crate::error::{Error, Result};
use geo_types::Geometry;
use serde::{Deserialize, Serialize};

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Whether this value can be stored in a field of the given declared
    /// type. `Null` is storable in any field.
    pub fn matches(&self, field_type: FieldType) -> bool {
        matches!(
            (self, field_type),
            (AttributeValue::Null, _)
                | (AttributeValue::Bool(_), FieldType::Bool)
                | (AttributeValue::Int(_), FieldType::Int)
                | (AttributeValue::Float(_), FieldType::Float)
                | (AttributeValue::String(_), FieldType::String)
        )
    }
}

/// Declared type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    String,
}

/// A named, typed field in a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

/// An ordered list of named, typed fields.
///
/// Field names resolve to positional indices exactly once; features store
/// their attribute values positionally against those indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    fields: Vec<FieldDef>,
}

impl FieldSchema {
    /// Build a schema from (name, type) pairs
    pub fn new(fields: impl IntoIterator<Item = (String, FieldType)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, field_type)| FieldDef { name, field_type })
                .collect(),
        }
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field definitions in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Resolve a field name to its stable index.
    ///
    /// Fails with `FieldNotFound` — lookup failures surface immediately
    /// rather than propagating as missing values.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))
    }

    /// Resolve several field names at once, e.g. all fields an operation
    /// needs, before touching any feature.
    pub fn resolve(&self, names: &[&str]) -> Result<Vec<usize>> {
        names.iter().map(|n| self.index_of(n)).collect()
    }
}

/// A geographic feature: optional geometry plus positional attribute values
/// matching a `FieldSchema`.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub values: Vec<AttributeValue>,
}

impl Feature {
    /// Create a feature with geometry and values
    pub fn new(geometry: Option<Geometry<f64>>, values: Vec<AttributeValue>) -> Self {
        Self { geometry, values }
    }

    /// Value at a schema-resolved index
    pub fn value(&self, index: usize) -> &AttributeValue {
        self.values.get(index).unwrap_or(&AttributeValue::Null)
    }
}

/// A collection of features sharing one schema
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub schema: FieldSchema,
    pub features: Vec<Feature>,
}

/// Outcome of a per-feature batch operation: how many items succeeded and
/// which failed, with their errors. A failing item never aborts the batch.
#[derive(Debug)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: Vec<(usize, Error)>,
}

impl BatchReport {
    /// Whether every item succeeded
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl FeatureCollection {
    /// Create an empty collection with the given schema
    pub fn new(schema: FieldSchema) -> Self {
        Self {
            schema,
            features: Vec::new(),
        }
    }

    /// Append a feature.
    ///
    /// Fails with `InvalidParameter` when the value count does not match the
    /// schema or a value disagrees with its field's declared type (`Null` is
    /// accepted in any field).
    pub fn push(&mut self, feature: Feature) -> Result<()> {
        if feature.values.len() != self.schema.len() {
            return Err(Error::InvalidParameter {
                name: "feature",
                value: format!("{} values", feature.values.len()),
                reason: format!("schema has {} fields", self.schema.len()),
            });
        }
        for (value, field) in feature.values.iter().zip(self.schema.fields()) {
            if !value.matches(field.field_type) {
                return Err(Error::InvalidParameter {
                    name: "feature",
                    value: format!("{:?} in field '{}'", value, field.name),
                    reason: format!("field is declared {:?}", field.field_type),
                });
            }
        }
        self.features.push(feature);
        Ok(())
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Apply a fallible operation to every feature, collecting per-item
    /// errors into a `BatchReport` instead of aborting on the first failure.
    pub fn apply<F>(&mut self, mut op: F) -> BatchReport
    where
        F: FnMut(&mut Feature) -> Result<()>,
    {
        let mut succeeded = 0;
        let mut failed = Vec::new();
        for (index, feature) in self.features.iter_mut().enumerate() {
            match op(feature) {
                Ok(()) => succeeded += 1,
                Err(e) => failed.push((index, e)),
            }
        }
        BatchReport { succeeded, failed }
    }
}
