//! Shared types used across the codebase

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A partial-update field as it arrived in a request body.
///
/// JSON has three distinct shapes for a key: missing, `null`, or a value.
/// Plain `Option<T>` folds the first two together, which is exactly the
/// distinction a PATCH handler needs to keep.
///
/// Use with `#[serde(default)]` so missing keys become [`Field::Absent`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Absent => Field::Absent,
            Field::Null => Field::Null,
            Field::Value(v) => Field::Value(f(v)),
        }
    }
}

impl<T: Clone + Into<Value>> Field<T> {
    /// Lower a typed field to its JSON column value
    pub fn to_json(&self) -> Field<Value> {
        self.clone().map(Into::into)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only called when the key is present; absence comes from #[serde(default)]
        Option::<T>::deserialize(deserializer).map(|opt| match opt {
            Some(v) => Field::Value(v),
            None => Field::Null,
        })
    }
}
