//! Typed accessors over `fastnbt::Value` compounds.
//!
//! Getters return `None` when the key is missing or holds another tag type,
//! except that integer getters accept any integral tag that fits.

use fastnbt::{ByteArray, IntArray, LongArray, Value};
use std::collections::HashMap;

pub type Compound = HashMap<String, Value>;

pub trait CompoundExt {
    fn get_i8(&self, key: &str) -> Option<i8>;
    fn get_i16(&self, key: &str) -> Option<i16>;
    fn get_i32(&self, key: &str) -> Option<i32>;
    fn get_i64(&self, key: &str) -> Option<i64>;
    fn get_f32(&self, key: &str) -> Option<f32>;
    fn get_f64(&self, key: &str) -> Option<f64>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_str(&self, key: &str) -> Option<&str>;
    fn get_list(&self, key: &str) -> Option<&Vec<Value>>;
    fn get_compound(&self, key: &str) -> Option<&Compound>;
    fn get_compound_mut(&mut self, key: &str) -> Option<&mut Compound>;
    fn get_int_array(&self, key: &str) -> Option<&[i32]>;
    fn get_long_array(&self, key: &str) -> Option<&[i64]>;
    fn get_byte_array(&self, key: &str) -> Option<&[i8]>;
}

impl CompoundExt for Compound {
    fn get_i8(&self, key: &str) -> Option<i8> {
        value_as_i64(self.get(key)?).and_then(|v| i8::try_from(v).ok())
    }

    fn get_i16(&self, key: &str) -> Option<i16> {
        value_as_i64(self.get(key)?).and_then(|v| i16::try_from(v).ok())
    }

    fn get_i32(&self, key: &str) -> Option<i32> {
        value_as_i64(self.get(key)?).and_then(|v| i32::try_from(v).ok())
    }

    fn get_i64(&self, key: &str) -> Option<i64> {
        value_as_i64(self.get(key)?)
    }

    fn get_f32(&self, key: &str) -> Option<f32> {
        match self.get(key)? {
            Value::Float(v) => Some(*v),
            Value::Double(v) => Some(*v as f32),
            _ => None,
        }
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_i64(key).map(|v| v != 0)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn get_list(&self, key: &str) -> Option<&Vec<Value>> {
        match self.get(key)? {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    fn get_compound(&self, key: &str) -> Option<&Compound> {
        match self.get(key)? {
            Value::Compound(c) => Some(c),
            _ => None,
        }
    }

    fn get_compound_mut(&mut self, key: &str) -> Option<&mut Compound> {
        match self.get_mut(key)? {
            Value::Compound(c) => Some(c),
            _ => None,
        }
    }

    fn get_int_array(&self, key: &str) -> Option<&[i32]> {
        match self.get(key)? {
            Value::IntArray(a) => Some(a),
            _ => None,
        }
    }

    fn get_long_array(&self, key: &str) -> Option<&[i64]> {
        match self.get(key)? {
            Value::LongArray(a) => Some(a),
            _ => None,
        }
    }

    fn get_byte_array(&self, key: &str) -> Option<&[i8]> {
        match self.get(key)? {
            Value::ByteArray(a) => Some(a),
            _ => None,
        }
    }
}

pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Byte(v) => Some(i64::from(*v)),
        Value::Short(v) => Some(i64::from(*v)),
        Value::Int(v) => Some(i64::from(*v)),
        Value::Long(v) => Some(*v),
        _ => None,
    }
}

pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float(v) => Some(f64::from(*v)),
        Value::Double(v) => Some(*v),
        other => value_as_i64(other).map(|v| v as f64),
    }
}

pub fn as_compound(value: &Value) -> Option<&Compound> {
    match value {
        Value::Compound(c) => Some(c),
        _ => None,
    }
}

/// Builder for compounds whose shape depends on runtime data, where a serde
/// struct would not fit.
#[derive(Default)]
pub struct CompoundBuilder {
    inner: Compound,
}

impl CompoundBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(inner: Compound) -> Self {
        Self { inner }
    }

    pub fn byte(mut self, key: &str, v: i8) -> Self {
        self.inner.insert(key.to_string(), Value::Byte(v));
        self
    }

    pub fn flag(self, key: &str, v: bool) -> Self {
        self.byte(key, i8::from(v))
    }

    pub fn short(mut self, key: &str, v: i16) -> Self {
        self.inner.insert(key.to_string(), Value::Short(v));
        self
    }

    pub fn int(mut self, key: &str, v: i32) -> Self {
        self.inner.insert(key.to_string(), Value::Int(v));
        self
    }

    pub fn long(mut self, key: &str, v: i64) -> Self {
        self.inner.insert(key.to_string(), Value::Long(v));
        self
    }

    pub fn float(mut self, key: &str, v: f32) -> Self {
        self.inner.insert(key.to_string(), Value::Float(v));
        self
    }

    pub fn double(mut self, key: &str, v: f64) -> Self {
        self.inner.insert(key.to_string(), Value::Double(v));
        self
    }

    pub fn string(mut self, key: &str, v: impl Into<String>) -> Self {
        self.inner.insert(key.to_string(), Value::String(v.into()));
        self
    }

    pub fn list(mut self, key: &str, v: Vec<Value>) -> Self {
        self.inner.insert(key.to_string(), Value::List(v));
        self
    }

    pub fn compound(mut self, key: &str, v: Compound) -> Self {
        self.inner.insert(key.to_string(), Value::Compound(v));
        self
    }

    pub fn int_array(mut self, key: &str, v: Vec<i32>) -> Self {
        self.inner
            .insert(key.to_string(), Value::IntArray(IntArray::new(v)));
        self
    }

    pub fn long_array(mut self, key: &str, v: Vec<i64>) -> Self {
        self.inner
            .insert(key.to_string(), Value::LongArray(LongArray::new(v)));
        self
    }

    pub fn byte_array(mut self, key: &str, v: Vec<i8>) -> Self {
        self.inner
            .insert(key.to_string(), Value::ByteArray(ByteArray::new(v)));
        self
    }

    pub fn value(mut self, key: &str, v: Value) -> Self {
        self.inner.insert(key.to_string(), v);
        self
    }

    pub fn build(self) -> Compound {
        self.inner
    }

    pub fn into_value(self) -> Value {
        Value::Compound(self.inner)
    }
}

/// Reads a list of three numbers (e.g. `Pos`, `Motion`).
pub fn read_vec3(compound: &Compound, key: &str) -> Option<[f64; 3]> {
    let list = compound.get_list(key)?;
    if list.len() != 3 {
        return None;
    }
    Some([
        value_as_f64(&list[0])?,
        value_as_f64(&list[1])?,
        value_as_f64(&list[2])?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters_reject_wrong_types() {
        let c = CompoundBuilder::new()
            .byte("b", 3)
            .string("s", "hello")
            .int("i", 300)
            .build();
        assert_eq!(c.get_i32("b"), Some(3));
        assert_eq!(c.get_i8("i"), None);
        assert_eq!(c.get_str("i"), None);
        assert_eq!(c.get_str("s"), Some("hello"));
        assert_eq!(c.get_bool("b"), Some(true));
        assert!(c.get_compound("s").is_none());
        assert!(c.get_i32("missing").is_none());
    }

    #[test]
    fn test_read_vec3_mixed_tags() {
        let c = CompoundBuilder::new()
            .list(
                "Pos",
                vec![Value::Double(1.5), Value::Float(64.0), Value::Int(-3)],
            )
            .build();
        assert_eq!(read_vec3(&c, "Pos"), Some([1.5, 64.0, -3.0]));
    }
}
