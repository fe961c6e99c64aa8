//! Opaque JSON values
//!
//! Request parameters and results travel through the engine without static
//! typing. [`AnyCodable`] keeps the JSON verbatim until a consumer asks for a
//! concrete type.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A JSON value of unknown shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnyCodable(Value);

impl AnyCodable {
    /// Wrap any serializable value
    pub fn new<T: Serialize>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        Ok(Self(value))
    }

    /// The JSON `null` value
    pub fn null() -> Self {
        Self(Value::Null)
    }

    /// Decode the carried value as `T`
    pub fn get<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.0).map_err(|e| Error::Decoding(e.to_string()))
    }

    /// Borrow the raw JSON value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

impl Default for AnyCodable {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Value> for AnyCodable {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for AnyCodable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
