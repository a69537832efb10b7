//! DPAPI backup key projection

use crate::pek::SecretDecryptor;
use chrono::{DateTime, Utc};
use ditkit_core::{DirectoryResult, DnTag};
use ditkit_store::{attributes, DirectoryObject};
use std::sync::Arc;
use uuid::Uuid;

/// Name prefix of the `secret` objects that carry DPAPI backup keys.
pub const BACKUP_KEY_PREFIX: &str = "BCKUPKEY";

/// A domain DPAPI backup key, stored as a `secret` object.
#[derive(Debug)]
pub struct DpapiBackupKey {
    tag: DnTag,
    guid: Option<Uuid>,
    name: Option<String>,
    when_created: Option<DateTime<Utc>>,
    encrypted_value: Option<Vec<u8>>,
    decryptor: Option<Arc<SecretDecryptor>>,
}

impl DpapiBackupKey {
    /// Project the view's current record into a backup key.
    pub fn read_from(
        view: &DirectoryObject<'_>,
        decryptor: Option<Arc<SecretDecryptor>>,
    ) -> DirectoryResult<Self> {
        Ok(Self {
            tag: view.tag()?,
            guid: view.read_attribute(attributes::OBJECT_GUID)?,
            name: view.read_attribute(attributes::COMMON_NAME)?,
            when_created: view.read_attribute(attributes::WHEN_CREATED)?,
            encrypted_value: view.read_attribute(attributes::CURRENT_VALUE)?,
            decryptor,
        })
    }

    /// Primary key of the secret object.
    #[must_use]
    pub fn tag(&self) -> DnTag {
        self.tag
    }

    /// `objectGUID`.
    #[must_use]
    pub fn guid(&self) -> Option<Uuid> {
        self.guid
    }

    /// `cn` of the secret object (e.g. `BCKUPKEY_P Secret`).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `whenCreated`.
    #[must_use]
    pub fn when_created(&self) -> Option<DateTime<Utc>> {
        self.when_created
    }

    /// The backup key material, decrypted on access. Absent without a
    /// decryptor.
    pub fn data(&self) -> DirectoryResult<Option<Vec<u8>>> {
        match (&self.encrypted_value, &self.decryptor) {
            (Some(blob), Some(decryptor)) => decryptor.decrypt_secret(blob).map(Some),
            _ => Ok(None),
        }
    }
}
