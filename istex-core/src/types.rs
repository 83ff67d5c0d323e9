use crate::error::{Error, Result};
use regex::Regex;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ===== FILE DESCRIPTORS =====
// One rendition of a document's content as listed in a docObject
// (`metadata`, `fulltext`, `enrichments[label]`). The field set is open.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileDescriptor(Map<String, Value>);

impl FileDescriptor {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style field insertion
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a JSON object into a descriptor
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::invalid(format!(
                "file descriptor must be a JSON object, got {other}"
            ))),
        }
    }

    /// Parse a JSON array of objects into a descriptor collection
    pub fn collection_from_value(value: Value) -> Result<Vec<Self>> {
        match value {
            Value::Array(items) => items.into_iter().map(Self::from_value).collect(),
            other => Err(Error::invalid(format!(
                "file collection must be a JSON array, got {other}"
            ))),
        }
    }
}

impl From<Map<String, Value>> for FileDescriptor {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<FileDescriptor> for Value {
    fn from(descriptor: FileDescriptor) -> Self {
        Value::Object(descriptor.0)
    }
}

// ===== CRITERIA =====

/// One field test of a criterion
#[derive(Debug, Clone)]
pub enum FieldTest {
    /// Strict equality with the descriptor's field value
    Literal(Value),
    /// Regex search on the stringified field value
    Pattern(Regex),
}

impl FieldTest {
    pub fn literal(value: impl Into<Value>) -> Self {
        FieldTest::Literal(value.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(FieldTest::Pattern(Regex::new(pattern)?))
    }

    /// Read the serialized form: `{ pattern: "<regex>" }` is a pattern,
    /// any other value is a literal.
    pub fn from_value(value: Value) -> Result<Self> {
        if let Value::Object(map) = &value {
            if map.len() == 1 {
                if let Some(pattern) = map.get("pattern") {
                    return match pattern {
                        Value::String(source) => Self::pattern(source),
                        other => Err(Error::invalid(format!(
                            "pattern must be a string, got {other}"
                        ))),
                    };
                }
            }
        }
        Ok(FieldTest::Literal(value))
    }

    fn to_value(&self) -> Value {
        match self {
            FieldTest::Literal(value) => value.clone(),
            FieldTest::Pattern(regex) => {
                let mut map = Map::new();
                map.insert("pattern".to_string(), Value::String(regex.as_str().to_string()));
                Value::Object(map)
            }
        }
    }
}

impl PartialEq for FieldTest {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldTest::Literal(a), FieldTest::Literal(b)) => a == b,
            (FieldTest::Pattern(a), FieldTest::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// An ordered set of field tests describing one acceptable file shape.
///
/// Fields are evaluated in insertion order. A field holds at most one test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criterion {
    tests: Vec<(String, FieldTest)>,
}

impl Criterion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an equality test
    pub fn literal(self, field: &str, value: impl Into<Value>) -> Self {
        self.with_test(field, FieldTest::literal(value))
    }

    /// Add (or replace) a regex test
    pub fn pattern(self, field: &str, pattern: &str) -> Result<Self> {
        Ok(self.with_test(field, FieldTest::pattern(pattern)?))
    }

    pub fn with_test(mut self, field: &str, test: FieldTest) -> Self {
        match self.tests.iter_mut().find(|(name, _)| name == field) {
            Some((_, existing)) => *existing = test,
            None => self.tests.push((field.to_string(), test)),
        }
        self
    }

    /// Add a test, rejecting a field that already has one
    pub fn push(&mut self, field: &str, test: FieldTest) -> Result<()> {
        if self.tests.iter().any(|(name, _)| name == field) {
            return Err(Error::invalid(format!(
                "field '{field}' is tested twice in the same criterion"
            )));
        }
        self.tests.push((field.to_string(), test));
        Ok(())
    }

    pub fn tests(&self) -> impl Iterator<Item = (&str, &FieldTest)> {
        self.tests.iter().map(|(name, test)| (name.as_str(), test))
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// All-literal criterion with one test per descriptor field
    pub fn from_descriptor(descriptor: &FileDescriptor) -> Self {
        Self {
            tests: descriptor
                .fields()
                .map(|(name, value)| (name.clone(), FieldTest::Literal(value.clone())))
                .collect(),
        }
    }

    /// Parse the serialized form (a JSON/YAML mapping)
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::invalid(e.to_string()))
    }

    /// Parse an ordered criteria list (a JSON/YAML sequence of mappings)
    pub fn list_from_value(value: Value) -> Result<Vec<Self>> {
        serde_json::from_value(value).map_err(|e| Error::invalid(e.to_string()))
    }
}

impl Serialize for Criterion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tests.len()))?;
        for (field, test) in &self.tests {
            map.serialize_entry(field, &test.to_value())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Criterion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct CriterionVisitor;

        impl<'de> Visitor<'de> for CriterionVisitor {
            type Value = Criterion;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of field names to literals or { pattern: <regex> }")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Criterion, A::Error> {
                let mut criterion = Criterion::new();
                while let Some((field, value)) = access.next_entry::<String, Value>()? {
                    let test = FieldTest::from_value(value).map_err(de::Error::custom)?;
                    criterion.push(&field, test).map_err(de::Error::custom)?;
                }
                Ok(criterion)
            }
        }

        deserializer.deserialize_map(CriterionVisitor)
    }
}
