//! Schema catalogue
//!
//! The agent addresses attributes by LDAP display name; the catalogue
//! resolves names to fixed attribute ids, reports which secondary index backs
//! an attribute, and maps class names to the ids stored in `objectCategory`.

use crate::attributes::{AttributeDef, WELL_KNOWN, WELL_KNOWN_CLASSES};
use ditkit_core::{AttributeId, DirectoryError, DirectoryResult};
use std::collections::HashMap;

/// Key syntax of a secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySyntax {
    /// Raw bytes, compared as-is.
    Binary,
    /// Sign-flipped big-endian 32-bit integer.
    Int32,
    /// Sign-flipped big-endian 64-bit integer.
    Int64,
    /// Case-folded text.
    Text,
    /// Big-endian SID form.
    Sid,
}

/// The schema catalogue contract.
pub trait DirectorySchema: Send + Sync {
    /// Resolve an attribute display name to its id.
    fn attribute_id(&self, name: &str) -> DirectoryResult<AttributeId>;

    /// Name of the secondary index backing an attribute. Fails when the
    /// attribute exists but is not indexed.
    fn find_index_name(&self, attribute: &str) -> DirectoryResult<String>;

    /// Resolve a class name to the id stored in `objectCategory`.
    fn find_class_id(&self, class_name: &str) -> DirectoryResult<i32>;

    /// Every (attribute id, index name, key syntax) triple the engine must
    /// maintain an index for.
    fn indexed_attributes(&self) -> Vec<(AttributeId, String, KeySyntax)>;
}

/// Derive the index name for an attribute id.
///
/// Index names are a function of the id so that a renamed attribute keeps its
/// on-disk index.
#[must_use]
pub fn index_name_for(id: AttributeId) -> String {
    format!("idx_{:08x}", id.value())
}

struct AttributeEntry {
    id: AttributeId,
    index_syntax: Option<KeySyntax>,
}

/// Built-in catalogue backed by the well-known attribute table.
pub struct BuiltinSchema {
    attributes: HashMap<String, AttributeEntry>,
    classes: HashMap<String, i32>,
}

impl BuiltinSchema {
    /// Construct the catalogue from the well-known tables.
    #[must_use]
    pub fn new() -> Self {
        let attributes = WELL_KNOWN
            .iter()
            .map(|def: &AttributeDef| {
                (
                    def.name.to_ascii_lowercase(),
                    AttributeEntry {
                        id: def.id,
                        index_syntax: def.index_syntax,
                    },
                )
            })
            .collect();
        let classes = WELL_KNOWN_CLASSES
            .iter()
            .map(|(name, id)| (name.to_ascii_lowercase(), *id))
            .collect();
        Self {
            attributes,
            classes,
        }
    }

    fn entry(&self, name: &str) -> DirectoryResult<&AttributeEntry> {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| DirectoryError::schema_element(name))
    }
}

impl Default for BuiltinSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectorySchema for BuiltinSchema {
    fn attribute_id(&self, name: &str) -> DirectoryResult<AttributeId> {
        Ok(self.entry(name)?.id)
    }

    fn find_index_name(&self, attribute: &str) -> DirectoryResult<String> {
        let entry = self.entry(attribute)?;
        entry
            .index_syntax
            .map(|_| index_name_for(entry.id))
            .ok_or_else(|| {
                DirectoryError::schema_element(format!("index over attribute {attribute}"))
            })
    }

    fn find_class_id(&self, class_name: &str) -> DirectoryResult<i32> {
        self.classes
            .get(&class_name.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| DirectoryError::schema_element(class_name))
    }

    fn indexed_attributes(&self) -> Vec<(AttributeId, String, KeySyntax)> {
        self.attributes
            .values()
            .filter_map(|entry| {
                entry
                    .index_syntax
                    .map(|syntax| (entry.id, index_name_for(entry.id), syntax))
            })
            .collect()
    }
}
