//! Index key composition
//!
//! Secondary indexes order records by raw byte comparison, so every scalar is
//! encoded into a form whose byte order agrees with its logical order:
//! integers are big-endian with the sign bit flipped, text is case-folded,
//! SIDs use their big-endian form.

use crate::schema::KeySyntax;
use crate::value::AttributeValue;
use ditkit_core::{DirectoryError, DirectoryResult, SecurityIdentifier};

/// Encode a 32-bit integer.
#[must_use]
pub fn int32_key(value: i32) -> Vec<u8> {
    ((value as u32) ^ 0x8000_0000).to_be_bytes().to_vec()
}

/// Encode a 64-bit integer.
#[must_use]
pub fn int64_key(value: i64) -> Vec<u8> {
    ((value as u64) ^ 0x8000_0000_0000_0000).to_be_bytes().to_vec()
}

/// Encode text. Directory names match case-insensitively, so keys are
/// case-folded.
#[must_use]
pub fn text_key(value: &str) -> Vec<u8> {
    value.to_lowercase().into_bytes()
}

/// Encode an opaque byte value (GUIDs and other fixed blobs).
#[must_use]
pub fn bytes_key(value: &[u8]) -> Vec<u8> {
    value.to_vec()
}

/// Encode a stored attribute value under the given index syntax.
pub fn value_key(syntax: KeySyntax, value: &AttributeValue) -> DirectoryResult<Vec<u8>> {
    match (syntax, value) {
        (KeySyntax::Int32, AttributeValue::Int32(v)) => Ok(int32_key(*v)),
        (KeySyntax::Int64, AttributeValue::Int64(v)) => Ok(int64_key(*v)),
        (KeySyntax::Int64, AttributeValue::Int32(v)) => Ok(int64_key(i64::from(*v))),
        (KeySyntax::Text, AttributeValue::Text(v)) => Ok(text_key(v)),
        (KeySyntax::Binary, AttributeValue::Bytes(v)) => Ok(bytes_key(v)),
        (KeySyntax::Sid, AttributeValue::Bytes(v)) => {
            let sid = SecurityIdentifier::from_bytes(v)
                .map_err(|e| DirectoryError::storage_with_source("malformed stored SID", e))?;
            Ok(sid.to_key_bytes())
        }
        (syntax, value) => Err(DirectoryError::storage(format!(
            "cannot compose {syntax:?} key from {} value",
            value.kind()
        ))),
    }
}
