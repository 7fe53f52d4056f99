use std::collections::HashMap;

/// Typed value of a custom property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    I64(i64),
    F32(f32),
    /// `string`, `file`, `color`, `class` and untyped properties.
    String(String),
}

/// Custom properties attached to a map, tileset, tile, layer or object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, value: PropertyValue) {
        self.0.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// `None` if the value does not fit in an `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            PropertyValue::F32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
