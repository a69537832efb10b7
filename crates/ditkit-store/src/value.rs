//! Attribute value model
//!
//! Rows store attribute values in a small tagged form. The typed conversion
//! trait lets the object view offer `read_attribute::<T>` and
//! `set_attribute::<T>` without the caller touching the tags.

use chrono::{DateTime, TimeZone, Utc};
use ditkit_core::SecurityIdentifier;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// 32-bit integer.
    Int32(i32),
    /// 64-bit integer (USNs, timestamps).
    Int64(i64),
    /// Boolean flag.
    Bool(bool),
    /// Unicode text.
    Text(String),
    /// Opaque byte blob (GUIDs, SIDs, ciphertext).
    Bytes(Vec<u8>),
}

impl AttributeValue {
    /// Name of the stored kind, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
        }
    }
}

/// Conversion between Rust types and stored attribute values.
pub trait DirectoryValue: Sized {
    /// Decode from a stored value; `None` when the stored kind does not
    /// match.
    fn from_value(value: &AttributeValue) -> Option<Self>;

    /// Encode into the stored form.
    fn into_value(self) -> AttributeValue;
}

impl DirectoryValue for i32 {
    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> AttributeValue {
        AttributeValue::Int32(self)
    }
}

impl DirectoryValue for i64 {
    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Int64(v) => Some(*v),
            // Widening read: some engines store small counters as 32-bit.
            AttributeValue::Int32(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    fn into_value(self) -> AttributeValue {
        AttributeValue::Int64(self)
    }
}

impl DirectoryValue for bool {
    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Bool(v) => Some(*v),
            AttributeValue::Int32(v) => Some(*v != 0),
            _ => None,
        }
    }

    fn into_value(self) -> AttributeValue {
        AttributeValue::Bool(self)
    }
}

impl DirectoryValue for String {
    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> AttributeValue {
        AttributeValue::Text(self)
    }
}

impl DirectoryValue for Vec<u8> {
    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Bytes(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> AttributeValue {
        AttributeValue::Bytes(self)
    }
}

impl DirectoryValue for Uuid {
    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Bytes(v) => Uuid::from_slice(v).ok(),
            _ => None,
        }
    }

    fn into_value(self) -> AttributeValue {
        AttributeValue::Bytes(self.as_bytes().to_vec())
    }
}

impl DirectoryValue for SecurityIdentifier {
    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Bytes(v) => SecurityIdentifier::from_bytes(v).ok(),
            _ => None,
        }
    }

    fn into_value(self) -> AttributeValue {
        AttributeValue::Bytes(self.to_bytes())
    }
}

/// Timestamps are stored as microseconds since the Unix epoch.
impl DirectoryValue for DateTime<Utc> {
    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Int64(v) => Utc.timestamp_micros(*v).single(),
            _ => None,
        }
    }

    fn into_value(self) -> AttributeValue {
        AttributeValue::Int64(self.timestamp_micros())
    }
}
