//! LDS boot-key composer
//!
//! Lightweight directory instances keep no out-of-band boot key. Instead two
//! key fragments live inside the database, on the root object and on the
//! schema naming context; the effective boot key is derived from both.

use crate::pek::BOOT_KEY_LENGTH;
use ditkit_core::{DirectoryError, DirectoryResult};
use sha2::{Digest, Sha256};

/// Derive the boot key from the two stored fragments.
pub fn compose_boot_key(
    root_fragment: &[u8],
    schema_fragment: &[u8],
) -> DirectoryResult<[u8; BOOT_KEY_LENGTH]> {
    if root_fragment.is_empty() {
        return Err(DirectoryError::decryption("the root boot-key fragment is empty"));
    }
    if schema_fragment.is_empty() {
        return Err(DirectoryError::decryption(
            "the schema boot-key fragment is empty",
        ));
    }
    let mut hasher = Sha256::new();
    hasher.update(root_fragment);
    hasher.update(schema_fragment);
    let digest = hasher.finalize();
    let mut key = [0u8; BOOT_KEY_LENGTH];
    key.copy_from_slice(&digest[..BOOT_KEY_LENGTH]);
    Ok(key)
}
