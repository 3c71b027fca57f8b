//! Base implementation of records.
use crate::error::PerDqnError;
use std::collections::HashMap;

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, typically used for metrics like reward or loss.
    Scalar(f32),

    /// A text value.
    String(String),
}

/// A container for storing key-value pairs of various data types.
///
/// ```rust
/// use perdqn_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("reward", 0.5);
/// record.insert("env", RecordValue::String("corridor".to_string()));
/// assert_eq!(record.get_scalar("reward").unwrap(), 0.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, PerDqnError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(PerDqnError::RecordValueTypeError("Scalar".to_string())),
            None => Err(PerDqnError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, PerDqnError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(PerDqnError::RecordValueTypeError("String".to_string())),
            None => Err(PerDqnError::RecordKeyError(k.to_string())),
        }
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_getters_and_errors() {
        let mut r = Record::from_slice(&[
            ("a", RecordValue::Scalar(1.0)),
            ("b", RecordValue::String("x".to_string())),
        ]);
        r.insert("a", RecordValue::Scalar(2.0));

        assert_eq!(r.get_scalar("a").unwrap(), 2.0);
        assert_eq!(r.get_string("b").unwrap(), "x");
        assert_eq!(
            r.get_scalar("b"),
            Err(PerDqnError::RecordValueTypeError("Scalar".to_string()))
        );
        assert_eq!(
            r.get_scalar("c"),
            Err(PerDqnError::RecordKeyError("c".to_string()))
        );
    }
}
