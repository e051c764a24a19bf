//! Ordered attribute selections
//!
//! Maps attribute names to their selected values, keeping the order in
//! which entries were read or inserted. Serializes as a JSON object.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Attribute name → selected values, in insertion order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selections(Vec<(String, Vec<String>)>);

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the values for `name`, replacing any previous entry in place
    pub fn insert(&mut self, name: &str, values: Vec<String>) {
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.0.push((name.to_string(), values)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<(String, Vec<String>)> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for Selections {
    fn from_iter<I: IntoIterator<Item = (S, Vec<String>)>>(iter: I) -> Self {
        let mut selections = Self::new();
        for (name, values) in iter {
            let name: String = name.into();
            selections.insert(&name, values);
        }
        selections
    }
}

impl Serialize for Selections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, values) in &self.0 {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

struct SelectionsVisitor;

impl<'de> Visitor<'de> for SelectionsVisitor {
    type Value = Selections;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a map of attribute names to lists of values or null")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut selections = Selections::new();
        // null means "referenced, nothing selected"
        while let Some((name, values)) = access.next_entry::<String, Option<Vec<String>>>()? {
            selections.insert(&name, values.unwrap_or_default());
        }
        Ok(selections)
    }
}

impl<'de> Deserialize<'de> for Selections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SelectionsVisitor)
    }
}
