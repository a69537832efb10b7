//! Account projection

use crate::pek::SecretDecryptor;
use chrono::{DateTime, Utc};
use ditkit_core::{DirectoryResult, DnTag, SamAccountType, SecurityIdentifier, UserAccountControl};
use ditkit_store::{attributes, DirectoryObject};
use std::sync::Arc;
use uuid::Uuid;

/// Length of an NT hash in bytes.
pub const NT_HASH_LENGTH: usize = 16;

/// A security-principal account read from the directory.
///
/// Plain attributes are copied out eagerly; the secret attributes keep their
/// ciphertext and decrypt lazily on access. Without a decryptor the secret
/// accessors report the fields as absent.
#[derive(Debug)]
pub struct Account {
    tag: DnTag,
    guid: Option<Uuid>,
    sid: Option<SecurityIdentifier>,
    sam_account_name: Option<String>,
    sam_account_type: Option<SamAccountType>,
    user_account_control: Option<UserAccountControl>,
    primary_group_id: Option<i32>,
    sid_history: Vec<SecurityIdentifier>,
    when_created: Option<DateTime<Utc>>,
    encrypted_nt_hash: Option<Vec<u8>>,
    encrypted_lm_hash: Option<Vec<u8>>,
    encrypted_nt_hash_history: Option<Vec<u8>>,
    encrypted_supplemental_credentials: Option<Vec<u8>>,
    decryptor: Option<Arc<SecretDecryptor>>,
}

impl Account {
    /// Project the view's current record into an account.
    pub fn read_from(
        view: &DirectoryObject<'_>,
        decryptor: Option<Arc<SecretDecryptor>>,
    ) -> DirectoryResult<Self> {
        Ok(Self {
            tag: view.tag()?,
            guid: view.read_attribute(attributes::OBJECT_GUID)?,
            sid: view.read_attribute(attributes::OBJECT_SID)?,
            sam_account_name: view.read_attribute(attributes::SAM_ACCOUNT_NAME)?,
            sam_account_type: view.sam_account_type()?,
            user_account_control: view
                .read_attribute::<i32>(attributes::USER_ACCOUNT_CONTROL)?
                .map(UserAccountControl::from),
            primary_group_id: view.read_attribute(attributes::PRIMARY_GROUP_ID)?,
            sid_history: view.read_attribute_multi(attributes::SID_HISTORY)?,
            when_created: view.read_attribute(attributes::WHEN_CREATED)?,
            encrypted_nt_hash: view.read_attribute(attributes::UNICODE_PWD)?,
            encrypted_lm_hash: view.read_attribute(attributes::DBCS_PWD)?,
            encrypted_nt_hash_history: view.read_attribute(attributes::NT_PWD_HISTORY)?,
            encrypted_supplemental_credentials: view
                .read_attribute(attributes::SUPPLEMENTAL_CREDENTIALS)?,
            decryptor,
        })
    }

    /// Primary key of the account object.
    #[must_use]
    pub fn tag(&self) -> DnTag {
        self.tag
    }

    /// `objectGUID`.
    #[must_use]
    pub fn guid(&self) -> Option<Uuid> {
        self.guid
    }

    /// `objectSid`.
    #[must_use]
    pub fn sid(&self) -> Option<&SecurityIdentifier> {
        self.sid.as_ref()
    }

    /// `sAMAccountName`.
    #[must_use]
    pub fn sam_account_name(&self) -> Option<&str> {
        self.sam_account_name.as_deref()
    }

    /// Decoded `sAMAccountType`.
    #[must_use]
    pub fn sam_account_type(&self) -> Option<SamAccountType> {
        self.sam_account_type
    }

    /// Decoded `userAccountControl`.
    #[must_use]
    pub fn user_account_control(&self) -> Option<UserAccountControl> {
        self.user_account_control
    }

    /// Whether the account can log on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.user_account_control
            .is_some_and(UserAccountControl::is_enabled)
    }

    /// `primaryGroupID`.
    #[must_use]
    pub fn primary_group_id(&self) -> Option<i32> {
        self.primary_group_id
    }

    /// `sIDHistory`.
    #[must_use]
    pub fn sid_history(&self) -> &[SecurityIdentifier] {
        &self.sid_history
    }

    /// `whenCreated`.
    #[must_use]
    pub fn when_created(&self) -> Option<DateTime<Utc>> {
        self.when_created
    }

    /// The NT hash, decrypted on access. Absent when the account stores no
    /// password or no decryptor is available.
    pub fn nt_hash(&self) -> DirectoryResult<Option<Vec<u8>>> {
        self.decrypt_field(self.encrypted_nt_hash.as_deref())
    }

    /// The LM hash, decrypted on access.
    pub fn lm_hash(&self) -> DirectoryResult<Option<Vec<u8>>> {
        self.decrypt_field(self.encrypted_lm_hash.as_deref())
    }

    /// NT hash history, newest first, decrypted on access.
    pub fn nt_hash_history(&self) -> DirectoryResult<Option<Vec<Vec<u8>>>> {
        let Some(blob) = self.decrypt_field(self.encrypted_nt_hash_history.as_deref())? else {
            return Ok(None);
        };
        Ok(Some(
            blob.chunks(NT_HASH_LENGTH).map(<[u8]>::to_vec).collect(),
        ))
    }

    /// The supplemental-credentials blob, decrypted on access.
    pub fn supplemental_credentials(&self) -> DirectoryResult<Option<Vec<u8>>> {
        self.decrypt_field(self.encrypted_supplemental_credentials.as_deref())
    }

    fn decrypt_field(&self, ciphertext: Option<&[u8]>) -> DirectoryResult<Option<Vec<u8>>> {
        match (ciphertext, &self.decryptor) {
            (Some(blob), Some(decryptor)) => decryptor.decrypt_secret(blob).map(Some),
            _ => Ok(None),
        }
    }
}
