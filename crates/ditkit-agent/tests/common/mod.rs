//! Shared fixtures: seeded in-memory directories for the three database
//! shapes the agent distinguishes (DS, LDS, freshly-booted DS).

// Not every test binary exercises every fixture.
#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use ditkit_agent::bootkey::compose_boot_key;
use ditkit_agent::pek::{PekKey, PekList, SecretDecryptor};
use ditkit_agent::DirectoryAgent;
use ditkit_core::{
    DatabaseVariant, DcState, DnTag, FixedClock, SecurityIdentifier,
};
use ditkit_store::value::AttributeValue;
use ditkit_store::{attributes, BuiltinSchema, DcHeader, DirectoryDatabase, DirectorySchema,
    MemoryDirectory,
};
use std::sync::Arc;
use uuid::Uuid;

/// The externally supplied boot key of the DS fixtures (`0x00…01`).
pub const BOOT_KEY: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
/// An alternative boot key for rotation tests.
pub const OTHER_BOOT_KEY: [u8; 16] = [0x77; 16];

pub const PEK_SALT: [u8; 16] = [0x11; 16];
pub const PEK_KEY: [u8; 32] = [0x22; 32];

/// LDS boot-key fragments.
pub const ROOT_FRAGMENT: [u8; 16] = [0xaa; 16];
pub const SCHEMA_FRAGMENT: [u8; 16] = [0xbb; 16];

/// Plaintext secrets seeded into the fixtures.
pub const ALICE_NT_HASH: [u8; 16] = [0xa1; 16];
pub const KDS_KEY_MATERIAL: [u8; 64] = [0x77; 64];
pub const KDS_SECRET_AGREEMENT_PARAMETERS: [u8; 3] = [0x0a, 0x0b, 0x0c];

/// Backup-key material, carried in base64 as key exports are.
pub const BACKUP_KEY_MATERIAL_B64: &str = "WlpaWlpaWlpaWlpaWlpaWlpaWlpaWlpaWlpaWlpaWlo=";

pub fn backup_key_material() -> Vec<u8> {
    STANDARD.decode(BACKUP_KEY_MATERIAL_B64).unwrap()
}

pub const ROOT_OBJECT: DnTag = DnTag::new(2);
pub const DOMAIN_NC: DnTag = DnTag::new(1787);
pub const CONFIG_NC: DnTag = DnTag::new(1790);
pub const SCHEMA_NC: DnTag = DnTag::new(1793);
pub const ALICE_TOMBSTONE: DnTag = DnTag::new(3000);
pub const ALICE: DnTag = DnTag::new(3001);
pub const BOB: DnTag = DnTag::new(3002);
pub const STAFF_GROUP: DnTag = DnTag::new(3003);
pub const USERS_OU: DnTag = DnTag::new(3010);
pub const BACKUP_KEY_SECRET: DnTag = DnTag::new(3100);
pub const KDS_ROOT_KEY: DnTag = DnTag::new(3200);

pub const INITIAL_USN: i64 = 5000;

pub const ALICE_DN: &str = "CN=Alice,OU=Users,DC=contoso,DC=com";
pub const USERS_OU_DN: &str = "OU=Users,DC=contoso,DC=com";
pub const KDS_KEY_ID: &str = "2f4b3a1c-9d0e-4c6a-8f21-5e7b9a3d1c44";

pub fn alice_sid() -> SecurityIdentifier {
    "S-1-5-21-3623811015-3361044348-30300820-1103"
        .parse()
        .unwrap()
}

pub fn alice_guid() -> Uuid {
    Uuid::from_bytes([0x10; 16])
}

pub fn migrated_sid() -> SecurityIdentifier {
    "S-1-5-21-100-200-300-1103".parse().unwrap()
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn pek_list() -> PekList {
    PekList::with_key(PEK_SALT, 1, PekKey::new(PEK_KEY))
}

fn ds_header(state: DcState) -> DcHeader {
    DcHeader {
        epoch: 1,
        highest_committed_usn: INITIAL_USN,
        variant: DatabaseVariant::DirectoryServices,
        state,
        domain_nc: Some(DOMAIN_NC),
        configuration_nc: CONFIG_NC,
        schema_nc: SCHEMA_NC,
        root_object: ROOT_OBJECT,
    }
}

fn lds_header() -> DcHeader {
    DcHeader {
        epoch: 1,
        highest_committed_usn: INITIAL_USN,
        variant: DatabaseVariant::LightweightDirectoryServices,
        state: DcState::Normal,
        domain_nc: None,
        configuration_nc: CONFIG_NC,
        schema_nc: SCHEMA_NC,
        root_object: ROOT_OBJECT,
    }
}

/// Seed the object population shared by every fixture. `pek_holder` gets the
/// PEK list blob; `root_pek`/`schema_pek` carry the LDS fragments when set.
fn seed(
    schema: Arc<BuiltinSchema>,
    header: DcHeader,
    pek_holder: Option<(DnTag, Vec<u8>)>,
    root_pek: Option<Vec<u8>>,
    schema_pek: Option<Vec<u8>>,
    decryptor: &SecretDecryptor,
) -> Arc<dyn DirectoryDatabase> {
    let user_class = schema.find_class_id("user").unwrap();
    let computer_class = schema.find_class_id("computer").unwrap();
    let group_class = schema.find_class_id("group").unwrap();
    let ou_class = schema.find_class_id("organizationalUnit").unwrap();
    let secret_class = schema.find_class_id("secret").unwrap();
    let kds_class = schema.find_class_id("msKds-ProvRootKey").unwrap();

    let encrypted_nt_hash = decryptor.encrypt_secret(&ALICE_NT_HASH).unwrap();
    let encrypted_backup_key = decryptor.encrypt_secret(&backup_key_material()).unwrap();

    let mut root_attrs = vec![(attributes::COMMON_NAME, AttributeValue::Text("rootdse".into()))];
    if let Some(fragment) = root_pek {
        root_attrs.push((attributes::PEK_LIST, AttributeValue::Bytes(fragment)));
    }
    let mut schema_attrs = vec![(attributes::COMMON_NAME, AttributeValue::Text("Schema".into()))];
    if let Some(fragment) = schema_pek {
        schema_attrs.push((attributes::PEK_LIST, AttributeValue::Bytes(fragment)));
    }

    let mut domain_attrs = vec![(
        attributes::COMMON_NAME,
        AttributeValue::Text("contoso".into()),
    )];
    let mut config_attrs = vec![(
        attributes::COMMON_NAME,
        AttributeValue::Text("Configuration".into()),
    )];
    if let Some((holder, blob)) = pek_holder {
        let entry = (attributes::PEK_LIST, AttributeValue::Bytes(blob));
        if holder == DOMAIN_NC {
            domain_attrs.push(entry);
        } else {
            config_attrs.push(entry);
        }
    }

    let db = MemoryDirectory::builder(schema)
        .header(header)
        .object(ROOT_OBJECT, "O=rootdse", root_attrs)
        .unwrap()
        .object(DOMAIN_NC, "DC=contoso,DC=com", domain_attrs)
        .unwrap()
        .object(
            CONFIG_NC,
            "CN=Configuration,DC=contoso,DC=com",
            config_attrs,
        )
        .unwrap()
        .object(
            SCHEMA_NC,
            "CN=Schema,CN=Configuration,DC=contoso,DC=com",
            schema_attrs,
        )
        .unwrap()
        .object(
            ALICE_TOMBSTONE,
            "CN=Alice DEL,CN=Deleted Objects,DC=contoso,DC=com",
            vec![
                (
                    attributes::SAM_ACCOUNT_NAME,
                    AttributeValue::Text("alice".into()),
                ),
                (
                    attributes::SAM_ACCOUNT_TYPE,
                    AttributeValue::Int32(0x3000_0000),
                ),
                (attributes::OBJECT_CATEGORY, AttributeValue::Int32(user_class)),
                (
                    attributes::USER_ACCOUNT_CONTROL,
                    AttributeValue::Int32(0x0202),
                ),
                (attributes::IS_DELETED, AttributeValue::Bool(true)),
            ],
        )
        .unwrap()
        .object(
            ALICE,
            ALICE_DN,
            vec![
                (
                    attributes::SAM_ACCOUNT_NAME,
                    AttributeValue::Text("alice".into()),
                ),
                (
                    attributes::SAM_ACCOUNT_TYPE,
                    AttributeValue::Int32(0x3000_0000),
                ),
                (attributes::OBJECT_CATEGORY, AttributeValue::Int32(user_class)),
                (
                    attributes::USER_ACCOUNT_CONTROL,
                    AttributeValue::Int32(0x0200),
                ),
                (
                    attributes::OBJECT_SID,
                    AttributeValue::Bytes(alice_sid().to_bytes()),
                ),
                (
                    attributes::OBJECT_GUID,
                    AttributeValue::Bytes(alice_guid().as_bytes().to_vec()),
                ),
                (
                    attributes::UNICODE_PWD,
                    AttributeValue::Bytes(encrypted_nt_hash),
                ),
            ],
        )
        .unwrap()
        .object(
            BOB,
            "CN=Bob,OU=Users,DC=contoso,DC=com",
            vec![
                (
                    attributes::SAM_ACCOUNT_NAME,
                    AttributeValue::Text("bob$".into()),
                ),
                (
                    attributes::SAM_ACCOUNT_TYPE,
                    AttributeValue::Int32(0x3000_0001),
                ),
                (
                    attributes::OBJECT_CATEGORY,
                    AttributeValue::Int32(computer_class),
                ),
                (
                    attributes::USER_ACCOUNT_CONTROL,
                    AttributeValue::Int32(0x1000),
                ),
            ],
        )
        .unwrap()
        .object(
            STAFF_GROUP,
            "CN=Staff,OU=Users,DC=contoso,DC=com",
            vec![
                (
                    attributes::SAM_ACCOUNT_NAME,
                    AttributeValue::Text("staff".into()),
                ),
                (
                    attributes::SAM_ACCOUNT_TYPE,
                    AttributeValue::Int32(0x1000_0000),
                ),
                (attributes::OBJECT_CATEGORY, AttributeValue::Int32(group_class)),
            ],
        )
        .unwrap()
        .object(
            USERS_OU,
            USERS_OU_DN,
            vec![(attributes::OBJECT_CATEGORY, AttributeValue::Int32(ou_class))],
        )
        .unwrap()
        .object(
            BACKUP_KEY_SECRET,
            "CN=BCKUPKEY_P Secret,CN=System,DC=contoso,DC=com",
            vec![
                (
                    attributes::COMMON_NAME,
                    AttributeValue::Text("BCKUPKEY_P Secret".into()),
                ),
                (
                    attributes::OBJECT_CATEGORY,
                    AttributeValue::Int32(secret_class),
                ),
                (
                    attributes::CURRENT_VALUE,
                    AttributeValue::Bytes(encrypted_backup_key),
                ),
            ],
        )
        .unwrap()
        .object(
            KDS_ROOT_KEY,
            "CN=2f4b3a1c-9d0e-4c6a-8f21-5e7b9a3d1c44,CN=Master Root Keys,DC=contoso,DC=com",
            vec![
                (
                    attributes::COMMON_NAME,
                    AttributeValue::Text(KDS_KEY_ID.into()),
                ),
                (attributes::OBJECT_CATEGORY, AttributeValue::Int32(kds_class)),
                (
                    attributes::KDS_KDF_ALGORITHM,
                    AttributeValue::Text("SP800_108_CTR_HMAC".into()),
                ),
                (
                    attributes::KDS_KDF_PARAMETERS,
                    AttributeValue::Bytes(vec![0x01, 0x02, 0x03]),
                ),
                (
                    attributes::KDS_SECRET_AGREEMENT_PARAMETERS,
                    AttributeValue::Bytes(KDS_SECRET_AGREEMENT_PARAMETERS.to_vec()),
                ),
                (
                    attributes::KDS_ROOT_KEY_DATA,
                    AttributeValue::Bytes(KDS_KEY_MATERIAL.to_vec()),
                ),
                (
                    attributes::KDS_CREATE_TIME,
                    AttributeValue::Int64(fixed_time().timestamp_micros()),
                ),
                (
                    attributes::KDS_USE_START_TIME,
                    AttributeValue::Int64(fixed_time().timestamp_micros()),
                ),
                (attributes::KDS_VERSION, AttributeValue::Int32(1)),
                (
                    attributes::KDS_DOMAIN_ID,
                    AttributeValue::Text("DC=contoso,DC=com".into()),
                ),
            ],
        )
        .unwrap()
        .build();
    Arc::new(db)
}

fn open_agent(db: Arc<dyn DirectoryDatabase>, schema: Arc<BuiltinSchema>) -> DirectoryAgent {
    DirectoryAgent::open_with_clock(db, schema, Arc::new(FixedClock(fixed_time()))).unwrap()
}

/// A promoted AD DS database; the PEK list lives on the domain NC, wrapped
/// by [`BOOT_KEY`].
pub fn ds_agent() -> DirectoryAgent {
    let schema = Arc::new(BuiltinSchema::new());
    let list = pek_list();
    let blob = list.encode(Some(&BOOT_KEY)).unwrap();
    let decryptor = SecretDecryptor::new(list);
    let db = seed(
        Arc::clone(&schema),
        ds_header(DcState::Normal),
        Some((DOMAIN_NC, blob)),
        None,
        None,
        &decryptor,
    );
    open_agent(db, schema)
}

/// A freshly created (Boot-state) AD DS database.
pub fn boot_state_agent() -> DirectoryAgent {
    let schema = Arc::new(BuiltinSchema::new());
    let decryptor = SecretDecryptor::new(pek_list());
    let db = seed(
        Arc::clone(&schema),
        ds_header(DcState::Boot),
        None,
        None,
        None,
        &decryptor,
    );
    open_agent(db, schema)
}

/// An AD LDS instance; the PEK list lives on the configuration NC, wrapped
/// by the key composed from the root and schema fragments.
pub fn lds_agent() -> DirectoryAgent {
    let schema = Arc::new(BuiltinSchema::new());
    let list = pek_list();
    let composed = compose_boot_key(&ROOT_FRAGMENT, &SCHEMA_FRAGMENT).unwrap();
    let blob = list.encode(Some(&composed)).unwrap();
    let decryptor = SecretDecryptor::new(list);
    let db = seed(
        Arc::clone(&schema),
        lds_header(),
        Some((CONFIG_NC, blob)),
        Some(ROOT_FRAGMENT.to_vec()),
        Some(SCHEMA_FRAGMENT.to_vec()),
        &decryptor,
    );
    open_agent(db, schema)
}
