//! Password encryption key list
//!
//! Per-object secrets are encrypted with symmetric keys from a versioned key
//! ring, the PEK list. The list itself is stored on the PEK-holder object,
//! wrapped by the boot key.
//!
//! Wire form: `[format u32][salt 16][payload]`. Format 1 carries the payload
//! in the clear (used when the boot key is absent, empty or all-zero);
//! format 2 carries it under AES-256-GCM with the key and nonce derived from
//! `(boot key, salt)` via HKDF-SHA256. The salt survives rekeying, so
//! re-encrypting an unchanged list under the same boot key reproduces the
//! stored bytes exactly.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use ditkit_core::{DirectoryError, DirectoryResult};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::collections::BTreeMap;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a boot key in bytes.
pub const BOOT_KEY_LENGTH: usize = 16;

/// Length of a password encryption key in bytes.
pub const PEK_LENGTH: usize = 32;

const SALT_LENGTH: usize = 16;
const NONCE_LENGTH: usize = 12;
const FORMAT_CLEAR: u32 = 1;
const FORMAT_WRAPPED: u32 = 2;

const LIST_KEY_INFO: &[u8] = b"pek-list-wrap-key";
const LIST_NONCE_INFO: &[u8] = b"pek-list-wrap-nonce";
const SECRET_KEY_INFO: &[u8] = b"pek-secret-key";
const SECRET_NONCE_INFO: &[u8] = b"pek-secret-nonce";

/// Reject a boot key of the wrong length before any database work.
pub fn validate_boot_key(param: &'static str, key: &[u8]) -> DirectoryResult<()> {
    if key.len() == BOOT_KEY_LENGTH {
        Ok(())
    } else {
        Err(DirectoryError::invalid_argument(
            param,
            format!("must be {BOOT_KEY_LENGTH} bytes, got {}", key.len()),
        ))
    }
}

/// Whether a boot key selects the cleartext encoding.
fn is_null_key(key: Option<&[u8]>) -> bool {
    match key {
        None => true,
        Some(k) => k.is_empty() || k.iter().all(|b| *b == 0),
    }
}

fn derive_key_and_nonce(
    secret: &[u8],
    salt: &[u8],
    key_info: &[u8],
    nonce_info: &[u8],
) -> DirectoryResult<([u8; PEK_LENGTH], [u8; NONCE_LENGTH])> {
    let hk = Hkdf::<Sha256>::new(Some(salt), secret);
    let mut key = [0u8; PEK_LENGTH];
    let mut nonce = [0u8; NONCE_LENGTH];
    hk.expand(key_info, &mut key)
        .map_err(|_| DirectoryError::decryption("key derivation failed"))?;
    hk.expand(nonce_info, &mut nonce)
        .map_err(|_| DirectoryError::decryption("nonce derivation failed"))?;
    Ok((key, nonce))
}

fn seal(key: &[u8; PEK_LENGTH], nonce: &[u8; NONCE_LENGTH], plaintext: &[u8]) -> DirectoryResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| DirectoryError::decryption("cipher initialisation failed"))?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| DirectoryError::decryption("encryption failed"))
}

fn open(key: &[u8; PEK_LENGTH], nonce: &[u8; NONCE_LENGTH], ciphertext: &[u8]) -> DirectoryResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| DirectoryError::decryption("cipher initialisation failed"))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| DirectoryError::decryption("wrong key or corrupted ciphertext"))
}

fn read_u32(blob: &[u8], offset: &mut usize) -> DirectoryResult<u32> {
    let end = *offset + 4;
    let bytes = blob
        .get(*offset..end)
        .ok_or_else(|| DirectoryError::decryption("truncated blob"))?;
    *offset = end;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_exact<'a>(blob: &'a [u8], offset: &mut usize, len: usize) -> DirectoryResult<&'a [u8]> {
    let end = *offset + len;
    let bytes = blob
        .get(*offset..end)
        .ok_or_else(|| DirectoryError::decryption("truncated blob"))?;
    *offset = end;
    Ok(bytes)
}

/// One password encryption key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PekKey([u8; PEK_LENGTH]);

impl PekKey {
    /// Wrap raw key material.
    #[must_use]
    pub fn new(bytes: [u8; PEK_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for PekKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PekKey([REDACTED])")
    }
}

/// The versioned password encryption key ring.
#[derive(Debug, Clone)]
pub struct PekList {
    salt: [u8; SALT_LENGTH],
    current_key_id: u32,
    keys: BTreeMap<u32, PekKey>,
}

impl PekList {
    /// A fresh single-key list with a random salt and key.
    #[must_use]
    pub fn generate() -> Self {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);
        let mut key = [0u8; PEK_LENGTH];
        OsRng.fill_bytes(&mut key);
        let mut keys = BTreeMap::new();
        keys.insert(0, PekKey::new(key));
        Self {
            salt,
            current_key_id: 0,
            keys,
        }
    }

    /// A single-key list with caller-chosen material (fixtures and seeding).
    #[must_use]
    pub fn with_key(salt: [u8; SALT_LENGTH], key_id: u32, key: PekKey) -> Self {
        let mut keys = BTreeMap::new();
        keys.insert(key_id, key);
        Self {
            salt,
            current_key_id: key_id,
            keys,
        }
    }

    /// Decode a stored blob, unwrapping with the boot key when the stored
    /// format requires one.
    pub fn decode(blob: &[u8], boot_key: Option<&[u8]>) -> DirectoryResult<Self> {
        let mut offset = 0usize;
        let format = read_u32(blob, &mut offset)?;
        let mut salt = [0u8; SALT_LENGTH];
        salt.copy_from_slice(read_exact(blob, &mut offset, SALT_LENGTH)?);
        let mut payload = match format {
            FORMAT_CLEAR => blob[offset..].to_vec(),
            FORMAT_WRAPPED => {
                if is_null_key(boot_key) {
                    return Err(DirectoryError::decryption(
                        "the PEK list is wrapped and no boot key was supplied",
                    ));
                }
                let boot_key = boot_key.unwrap_or_default();
                let (key, nonce) =
                    derive_key_and_nonce(boot_key, &salt, LIST_KEY_INFO, LIST_NONCE_INFO)?;
                open(&key, &nonce, &blob[offset..])?
            }
            other => {
                return Err(DirectoryError::decryption(format!(
                    "unsupported PEK list format {other}"
                )))
            }
        };
        let list = Self::parse_payload(salt, &payload);
        payload.zeroize();
        list
    }

    fn parse_payload(salt: [u8; SALT_LENGTH], payload: &[u8]) -> DirectoryResult<Self> {
        let mut offset = 0usize;
        let current_key_id = read_u32(payload, &mut offset)?;
        let count = read_u32(payload, &mut offset)?;
        let mut keys = BTreeMap::new();
        for _ in 0..count {
            let id = read_u32(payload, &mut offset)?;
            let mut key = [0u8; PEK_LENGTH];
            key.copy_from_slice(read_exact(payload, &mut offset, PEK_LENGTH)?);
            keys.insert(id, PekKey::new(key));
        }
        if !keys.contains_key(&current_key_id) {
            return Err(DirectoryError::decryption(format!(
                "current key {current_key_id} is not in the key ring"
            )));
        }
        Ok(Self {
            salt,
            current_key_id,
            keys,
        })
    }

    /// Encode for storage, wrapping with the boot key unless it is null.
    ///
    /// The salt is reused, so the output is a deterministic function of the
    /// key ring and the boot key.
    pub fn encode(&self, boot_key: Option<&[u8]>) -> DirectoryResult<Vec<u8>> {
        let mut payload = Vec::with_capacity(8 + self.keys.len() * (4 + PEK_LENGTH));
        payload.extend_from_slice(&self.current_key_id.to_le_bytes());
        payload.extend_from_slice(&(self.keys.len() as u32).to_le_bytes());
        for (id, key) in &self.keys {
            payload.extend_from_slice(&id.to_le_bytes());
            payload.extend_from_slice(&key.0);
        }

        let (format, body) = if is_null_key(boot_key) {
            (FORMAT_CLEAR, payload.clone())
        } else {
            let boot_key = boot_key.unwrap_or_default();
            let (key, nonce) =
                derive_key_and_nonce(boot_key, &self.salt, LIST_KEY_INFO, LIST_NONCE_INFO)?;
            (FORMAT_WRAPPED, seal(&key, &nonce, &payload)?)
        };
        payload.zeroize();

        let mut out = Vec::with_capacity(4 + SALT_LENGTH + body.len());
        out.extend_from_slice(&format.to_le_bytes());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Id of the key new secrets are sealed with.
    #[must_use]
    pub fn current_key_id(&self) -> u32 {
        self.current_key_id
    }
}

/// Decrypts per-object secret blobs with keys from the PEK list.
///
/// Secret blob form: `[key_id u32][salt 16][AES-256-GCM ciphertext]`.
pub struct SecretDecryptor {
    list: PekList,
}

impl SecretDecryptor {
    /// Build a decryptor over an unwrapped key ring.
    #[must_use]
    pub fn new(list: PekList) -> Self {
        Self { list }
    }

    /// Decrypt a secret blob.
    pub fn decrypt_secret(&self, blob: &[u8]) -> DirectoryResult<Vec<u8>> {
        let mut offset = 0usize;
        let key_id = read_u32(blob, &mut offset)?;
        let salt = read_exact(blob, &mut offset, SALT_LENGTH)?;
        let pek = self.list.keys.get(&key_id).ok_or_else(|| {
            DirectoryError::decryption(format!("key {key_id} is not in the key ring"))
        })?;
        let (key, nonce) =
            derive_key_and_nonce(&pek.0, salt, SECRET_KEY_INFO, SECRET_NONCE_INFO)?;
        open(&key, &nonce, &blob[offset..])
    }

    /// Encrypt a secret blob with the current key and a fresh random salt.
    pub fn encrypt_secret(&self, plaintext: &[u8]) -> DirectoryResult<Vec<u8>> {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);
        let key_id = self.list.current_key_id;
        let pek = self.list.keys.get(&key_id).ok_or_else(|| {
            DirectoryError::decryption(format!("key {key_id} is not in the key ring"))
        })?;
        let (key, nonce) =
            derive_key_and_nonce(&pek.0, &salt, SECRET_KEY_INFO, SECRET_NONCE_INFO)?;
        let ciphertext = seal(&key, &nonce, plaintext)?;

        let mut out = Vec::with_capacity(4 + SALT_LENGTH + ciphertext.len());
        out.extend_from_slice(&key_id.to_le_bytes());
        out.extend_from_slice(&salt);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }
}

impl std::fmt::Debug for SecretDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretDecryptor")
            .field("current_key_id", &self.list.current_key_id)
            .field("keys", &self.list.keys.len())
            .finish()
    }
}
