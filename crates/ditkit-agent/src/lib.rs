//! # ditkit-agent
//!
//! Read/write access layer over an on-disk directory-service database of the
//! kind used by domain controllers and their lightweight (LDS) variant.
//!
//! The [`agent::DirectoryAgent`] locates objects by several identifiers,
//! retrieves account records containing encrypted secrets, decrypts those
//! secrets using the per-database password-encryption-key (PEK) list wrapped
//! by a boot key, and performs a small set of transactional attribute
//! mutations with replication-metadata bookkeeping.
//!
//! ## Architecture
//!
//! - [`agent`] - The orchestrator: lookups, lazy enumerators, mutators and
//!   the commit state machine over one shared table cursor
//! - [`pek`] - The PEK list codec and the [`pek::SecretDecryptor`]
//! - [`bootkey`] - Boot-key composition for LDS instances
//! - [`projections`] - Account, DPAPI backup key and KDS root key records
//!
//! The storage engine itself is a collaborator: the agent drives any
//! implementation of the `ditkit-store` contracts, including the reference
//! in-memory engine the test suites use.
//!
//! ## Example
//!
//! ```ignore
//! use ditkit_agent::prelude::*;
//!
//! let mut agent = DirectoryAgent::open(db, schema)?;
//! let account = agent.get_account(&ObjectIdentifier::sam("alice"), Some(&boot_key))?;
//! if let Some(hash) = account.nt_hash()? {
//!     println!("{}", hex::encode(hash));
//! }
//! agent.set_account_status(&ObjectIdentifier::sam("alice"), false, false)?;
//! ```

pub mod agent;
pub mod bootkey;
pub mod pek;
pub mod projections;

pub use agent::{AccountIter, BackupKeyIter, CategoryCursor, DirectoryAgent, KdsRootKeyIter};
pub use bootkey::compose_boot_key;
pub use pek::{PekKey, PekList, SecretDecryptor, BOOT_KEY_LENGTH};
pub use projections::{Account, DpapiBackupKey, KdsRootKey};

/// Prelude module for convenient imports.
///
/// ```
/// use ditkit_agent::prelude::*;
/// ```
pub mod prelude {
    pub use crate::agent::DirectoryAgent;
    pub use crate::pek::{PekList, SecretDecryptor, BOOT_KEY_LENGTH};
    pub use crate::projections::{Account, DpapiBackupKey, KdsRootKey};

    pub use ditkit_core::{
        DatabaseVariant, DcState, DirectoryError, DirectoryResult, Dn, DnTag, ObjectIdentifier,
        SamAccountType, SecurityIdentifier, UserAccountControl,
    };
    pub use ditkit_store::{
        DcHeader, DirectoryContext, DirectoryDatabase, DirectoryObject, DirectorySchema,
    };
}
