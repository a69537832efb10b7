//! Cursor-bound object view
//!
//! A [`DirectoryObject`] is a thin typed view over the record the shared
//! cursor currently points at. It is only valid while the cursor stays put;
//! callers read what they need before stepping the cursor again.

use crate::cursor::DataCursor;
use crate::schema::DirectorySchema;
use crate::value::{AttributeValue, DirectoryValue};
use crate::{attributes, meta::AttributeMeta};
use chrono::{DateTime, Utc};
use ditkit_core::{DirectoryError, DirectoryResult, DnTag, SamAccountType};

/// Bit of `instanceType` set on writable replicas.
const INSTANCE_TYPE_WRITE: i32 = 0x4;

/// Typed view over the cursor's current record.
pub struct DirectoryObject<'a> {
    cursor: &'a mut dyn DataCursor,
    schema: &'a dyn DirectorySchema,
}

impl<'a> std::fmt::Debug for DirectoryObject<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryObject").finish_non_exhaustive()
    }
}

impl<'a> DirectoryObject<'a> {
    /// Bind a view to the cursor's current record.
    pub fn new(cursor: &'a mut dyn DataCursor, schema: &'a dyn DirectorySchema) -> Self {
        Self { cursor, schema }
    }

    /// Primary key of the record.
    pub fn tag(&self) -> DirectoryResult<DnTag> {
        self.cursor.current_tag()
    }

    /// Typed read of the first value of an attribute; absent attributes read
    /// as `None`.
    pub fn read_attribute<T: DirectoryValue>(&self, name: &str) -> DirectoryResult<Option<T>> {
        let attr = self.schema.attribute_id(name)?;
        match self.cursor.get_value(attr)? {
            None => Ok(None),
            Some(value) => decode::<T>(name, &value).map(Some),
        }
    }

    /// Typed read of every value of a multi-valued attribute.
    pub fn read_attribute_multi<T: DirectoryValue>(&self, name: &str) -> DirectoryResult<Vec<T>> {
        let attr = self.schema.attribute_id(name)?;
        self.cursor
            .get_values(attr)?
            .iter()
            .map(|value| decode::<T>(name, value))
            .collect()
    }

    /// Stage a typed single-valued write; `None` clears the attribute.
    /// Returns whether the stored value actually changed.
    pub fn set_attribute<T: DirectoryValue>(
        &mut self,
        name: &str,
        value: Option<T>,
    ) -> DirectoryResult<bool> {
        let attr = self.schema.attribute_id(name)?;
        self.cursor.set_value(attr, value.map(T::into_value))
    }

    /// Stage a multi-valued merge-append. Values already present are not
    /// duplicated; returns whether the value set grew.
    pub fn add_attribute<T: DirectoryValue>(
        &mut self,
        name: &str,
        values: Vec<T>,
    ) -> DirectoryResult<bool> {
        let attr = self.schema.attribute_id(name)?;
        self.cursor
            .add_values(attr, values.into_iter().map(T::into_value).collect())
    }

    /// Stage a replication-metadata write for one attribute. The version
    /// counter continues from the existing tuple when there is one.
    pub fn update_attribute_meta(
        &mut self,
        name: &str,
        usn: i64,
        time: DateTime<Utc>,
    ) -> DirectoryResult<()> {
        let attr = self.schema.attribute_id(name)?;
        let next = match self.cursor.get_meta(attr)? {
            Some(existing) => existing.originating_write(usn, time),
            None => AttributeMeta::first_write(usn, time),
        };
        self.cursor.set_meta(attr, next)
    }

    /// Read the replication metadata of one attribute.
    pub fn attribute_meta(&self, name: &str) -> DirectoryResult<Option<AttributeMeta>> {
        let attr = self.schema.attribute_id(name)?;
        self.cursor.get_meta(attr)
    }

    /// Open the edit buffer over this record.
    pub fn begin_edit(&mut self) -> DirectoryResult<()> {
        self.cursor.begin_edit_for_update()
    }

    /// Apply the staged edit.
    pub fn accept_changes(&mut self) -> DirectoryResult<()> {
        self.cursor.accept_changes()
    }

    /// Discard the staged edit.
    pub fn reject_changes(&mut self) -> DirectoryResult<()> {
        self.cursor.reject_changes()
    }

    /// Delete the record.
    pub fn delete(&mut self) -> DirectoryResult<()> {
        self.cursor.delete_current()
    }

    /// Whether the record is a tombstone.
    pub fn is_deleted(&self) -> DirectoryResult<bool> {
        Ok(self
            .read_attribute::<bool>(attributes::IS_DELETED)?
            .unwrap_or(false))
    }

    /// Whether the record lives on a writable replica.
    pub fn is_writable(&self) -> DirectoryResult<bool> {
        Ok(self
            .read_attribute::<i32>(attributes::INSTANCE_TYPE)?
            .is_some_and(|flags| flags & INSTANCE_TYPE_WRITE != 0))
    }

    /// The decoded SAM account type, when present and recognised.
    pub fn sam_account_type(&self) -> DirectoryResult<Option<SamAccountType>> {
        Ok(self
            .read_attribute::<i32>(attributes::SAM_ACCOUNT_TYPE)?
            .and_then(SamAccountType::from_code))
    }

    /// Whether the record is a security principal with an account role.
    pub fn is_account(&self) -> DirectoryResult<bool> {
        Ok(self
            .sam_account_type()?
            .is_some_and(SamAccountType::is_account))
    }

    /// Whether the record is a security principal.
    pub fn is_security_principal(&self) -> DirectoryResult<bool> {
        Ok(self
            .sam_account_type()?
            .is_some_and(SamAccountType::is_security_principal))
    }
}

fn decode<T: DirectoryValue>(name: &str, value: &AttributeValue) -> DirectoryResult<T> {
    T::from_value(value).ok_or_else(|| {
        DirectoryError::storage(format!(
            "attribute {name} holds a {} value of an unexpected shape",
            value.kind()
        ))
    })
}
