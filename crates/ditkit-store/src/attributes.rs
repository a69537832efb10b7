//! Well-known attribute catalogue
//!
//! LDAP display names and fixed attribute ids for every attribute this layer
//! touches. The built-in schema catalogue is constructed from this table;
//! callers address attributes by display name and the schema resolves the id.

use crate::schema::KeySyntax;
use ditkit_core::AttributeId;

/// `pekList` - the wrapped password encryption key list.
pub const PEK_LIST: &str = "pekList";
/// `sAMAccountName`.
pub const SAM_ACCOUNT_NAME: &str = "sAMAccountName";
/// `sAMAccountType`.
pub const SAM_ACCOUNT_TYPE: &str = "sAMAccountType";
/// `objectSid`.
pub const OBJECT_SID: &str = "objectSid";
/// `objectGUID`.
pub const OBJECT_GUID: &str = "objectGUID";
/// `objectCategory`.
pub const OBJECT_CATEGORY: &str = "objectCategory";
/// `userAccountControl`.
pub const USER_ACCOUNT_CONTROL: &str = "userAccountControl";
/// `sIDHistory` (multi-valued).
pub const SID_HISTORY: &str = "sIDHistory";
/// `primaryGroupID`.
pub const PRIMARY_GROUP_ID: &str = "primaryGroupID";
/// `isDeleted`.
pub const IS_DELETED: &str = "isDeleted";
/// `instanceType` (bit 0x4 set on writable replicas).
pub const INSTANCE_TYPE: &str = "instanceType";
/// `cn`.
pub const COMMON_NAME: &str = "cn";
/// `whenCreated`.
pub const WHEN_CREATED: &str = "whenCreated";

/// `unicodePwd` - encrypted NT hash.
pub const UNICODE_PWD: &str = "unicodePwd";
/// `dBCSPwd` - encrypted LM hash.
pub const DBCS_PWD: &str = "dBCSPwd";
/// `ntPwdHistory` - encrypted NT hash history.
pub const NT_PWD_HISTORY: &str = "ntPwdHistory";
/// `lmPwdHistory` - encrypted LM hash history.
pub const LM_PWD_HISTORY: &str = "lmPwdHistory";
/// `supplementalCredentials` - encrypted supplemental credential blob.
pub const SUPPLEMENTAL_CREDENTIALS: &str = "supplementalCredentials";
/// `currentValue` - encrypted value of a `secret` object.
pub const CURRENT_VALUE: &str = "currentValue";

/// `msKds-KDFAlgorithmID`.
pub const KDS_KDF_ALGORITHM: &str = "msKds-KDFAlgorithmID";
/// `msKds-KDFParam`.
pub const KDS_KDF_PARAMETERS: &str = "msKds-KDFParam";
/// `msKds-SecretAgreementParam`.
pub const KDS_SECRET_AGREEMENT_PARAMETERS: &str = "msKds-SecretAgreementParam";
/// `msKds-RootKeyData`.
pub const KDS_ROOT_KEY_DATA: &str = "msKds-RootKeyData";
/// `msKds-CreateTime`.
pub const KDS_CREATE_TIME: &str = "msKds-CreateTime";
/// `msKds-UseStartTime`.
pub const KDS_USE_START_TIME: &str = "msKds-UseStartTime";
/// `msKds-Version`.
pub const KDS_VERSION: &str = "msKds-Version";
/// `msKds-DomainID`.
pub const KDS_DOMAIN_ID: &str = "msKds-DomainID";

/// Definition of one well-known attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDef {
    /// LDAP display name.
    pub name: &'static str,
    /// Fixed attribute id.
    pub id: AttributeId,
    /// Key syntax, present iff a secondary index backs the attribute.
    pub index_syntax: Option<KeySyntax>,
}

const fn attr(name: &'static str, id: u32, index_syntax: Option<KeySyntax>) -> AttributeDef {
    AttributeDef {
        name,
        id: AttributeId::new(id),
        index_syntax,
    }
}

/// The complete built-in catalogue.
pub const WELL_KNOWN: &[AttributeDef] = &[
    attr(OBJECT_GUID, 0x0009_0001, Some(KeySyntax::Binary)),
    attr(OBJECT_SID, 0x0009_0092, Some(KeySyntax::Sid)),
    attr(SAM_ACCOUNT_NAME, 0x0009_00dd, Some(KeySyntax::Text)),
    attr(SAM_ACCOUNT_TYPE, 0x0009_012e, Some(KeySyntax::Int32)),
    attr(OBJECT_CATEGORY, 0x0009_005b, Some(KeySyntax::Int32)),
    attr(USER_ACCOUNT_CONTROL, 0x0009_0008, None),
    attr(SID_HISTORY, 0x0009_0261, None),
    attr(PRIMARY_GROUP_ID, 0x0009_0062, None),
    attr(IS_DELETED, 0x0002_0030, None),
    attr(INSTANCE_TYPE, 0x0002_0001, None),
    attr(COMMON_NAME, 0x0000_0003, None),
    attr(WHEN_CREATED, 0x0002_0010, None),
    attr(PEK_LIST, 0x0009_02e1, None),
    attr(UNICODE_PWD, 0x0009_005a, None),
    attr(DBCS_PWD, 0x0009_0037, None),
    attr(NT_PWD_HISTORY, 0x0009_005e, None),
    attr(LM_PWD_HISTORY, 0x0009_00a0, None),
    attr(SUPPLEMENTAL_CREDENTIALS, 0x0009_007d, None),
    attr(CURRENT_VALUE, 0x0000_0094, None),
    attr(KDS_KDF_ALGORITHM, 0x000a_0001, None),
    attr(KDS_KDF_PARAMETERS, 0x000a_0002, None),
    attr(KDS_SECRET_AGREEMENT_PARAMETERS, 0x000a_0008, None),
    attr(KDS_ROOT_KEY_DATA, 0x000a_0003, None),
    attr(KDS_CREATE_TIME, 0x000a_0004, None),
    attr(KDS_USE_START_TIME, 0x000a_0005, None),
    attr(KDS_VERSION, 0x000a_0006, None),
    attr(KDS_DOMAIN_ID, 0x000a_0007, None),
];

/// Well-known object classes resolvable through the schema catalogue.
///
/// Format: (name, class id).
pub const WELL_KNOWN_CLASSES: &[(&str, i32)] = &[
    ("top", 1),
    ("user", 2),
    ("computer", 3),
    ("group", 4),
    ("organizationalUnit", 5),
    ("secret", 6),
    ("msKds-ProvRootKey", 7),
    ("classSchema", 8),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let mut seen = HashSet::new();
        for def in WELL_KNOWN {
            assert!(seen.insert(def.id), "duplicate id for {}", def.name);
        }
    }

    #[test]
    fn test_names_are_unique_case_insensitive() {
        let mut seen = HashSet::new();
        for def in WELL_KNOWN {
            assert!(
                seen.insert(def.name.to_ascii_lowercase()),
                "duplicate name {}",
                def.name
            );
        }
    }

    #[test]
    fn test_lookup_attributes_are_indexed() {
        for name in [OBJECT_GUID, OBJECT_SID, SAM_ACCOUNT_NAME, SAM_ACCOUNT_TYPE, OBJECT_CATEGORY]
        {
            let def = WELL_KNOWN.iter().find(|d| d.name == name).unwrap();
            assert!(def.index_syntax.is_some(), "{name} must be indexed");
        }
    }
}
