//! KDS root key projection

use chrono::{DateTime, Utc};
use ditkit_core::{DirectoryResult, DnTag};
use ditkit_store::{attributes, DirectoryObject};
use uuid::Uuid;

/// A Group Key Distribution Service root key (`msKds-ProvRootKey` object).
///
/// Root key material is not wrapped by the PEK list, so no decryptor is
/// involved.
#[derive(Debug)]
pub struct KdsRootKey {
    tag: DnTag,
    id: Option<Uuid>,
    kdf_algorithm: Option<String>,
    kdf_parameters: Option<Vec<u8>>,
    secret_agreement_parameters: Option<Vec<u8>>,
    key_data: Option<Vec<u8>>,
    creation_time: Option<DateTime<Utc>>,
    use_start_time: Option<DateTime<Utc>>,
    version: Option<i32>,
    domain_id: Option<String>,
}

impl KdsRootKey {
    /// Project the view's current record into a root key.
    pub fn read_from(view: &DirectoryObject<'_>) -> DirectoryResult<Self> {
        // The root key id is the object's cn.
        let id = view
            .read_attribute::<String>(attributes::COMMON_NAME)?
            .and_then(|cn| Uuid::parse_str(&cn).ok());
        Ok(Self {
            tag: view.tag()?,
            id,
            kdf_algorithm: view.read_attribute(attributes::KDS_KDF_ALGORITHM)?,
            kdf_parameters: view.read_attribute(attributes::KDS_KDF_PARAMETERS)?,
            secret_agreement_parameters: view
                .read_attribute(attributes::KDS_SECRET_AGREEMENT_PARAMETERS)?,
            key_data: view.read_attribute(attributes::KDS_ROOT_KEY_DATA)?,
            creation_time: view.read_attribute(attributes::KDS_CREATE_TIME)?,
            use_start_time: view.read_attribute(attributes::KDS_USE_START_TIME)?,
            version: view.read_attribute(attributes::KDS_VERSION)?,
            domain_id: view.read_attribute(attributes::KDS_DOMAIN_ID)?,
        })
    }

    /// Primary key of the root key object.
    #[must_use]
    pub fn tag(&self) -> DnTag {
        self.tag
    }

    /// Root key id (the object's `cn`).
    #[must_use]
    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// `msKds-KDFAlgorithmID`.
    #[must_use]
    pub fn kdf_algorithm(&self) -> Option<&str> {
        self.kdf_algorithm.as_deref()
    }

    /// `msKds-KDFParam`.
    #[must_use]
    pub fn kdf_parameters(&self) -> Option<&[u8]> {
        self.kdf_parameters.as_deref()
    }

    /// `msKds-SecretAgreementParam`.
    #[must_use]
    pub fn secret_agreement_parameters(&self) -> Option<&[u8]> {
        self.secret_agreement_parameters.as_deref()
    }

    /// `msKds-RootKeyData`.
    #[must_use]
    pub fn key_data(&self) -> Option<&[u8]> {
        self.key_data.as_deref()
    }

    /// `msKds-CreateTime`.
    #[must_use]
    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.creation_time
    }

    /// `msKds-UseStartTime`.
    #[must_use]
    pub fn use_start_time(&self) -> Option<DateTime<Utc>> {
        self.use_start_time
    }

    /// `msKds-Version`.
    #[must_use]
    pub fn version(&self) -> Option<i32> {
        self.version
    }

    /// `msKds-DomainID`.
    #[must_use]
    pub fn domain_id(&self) -> Option<&str> {
        self.domain_id.as_deref()
    }
}
