//! Domain Controller header record
//!
//! One mutable record per database, loaded into the context at open time.
//! It carries the epoch, the highest committed USN, the database variant and
//! promotion state, and the naming-context anchors.

use ditkit_core::{DatabaseVariant, DcState, DnTag};
use serde::{Deserialize, Serialize};

/// The Domain Controller header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcHeader {
    /// Backup/restore epoch.
    pub epoch: i32,
    /// Highest committed USN; strictly non-decreasing across commits.
    pub highest_committed_usn: i64,
    /// Database variant.
    pub variant: DatabaseVariant,
    /// Promotion state.
    pub state: DcState,
    /// Domain naming context anchor; absent on LDS instances.
    pub domain_nc: Option<DnTag>,
    /// Configuration naming context anchor.
    pub configuration_nc: DnTag,
    /// Schema naming context anchor.
    pub schema_nc: DnTag,
    /// The root object of the instance (LDS boot-key fragment holder).
    pub root_object: DnTag,
}

impl DcHeader {
    /// Allocate the next USN. The counter only moves forward.
    pub fn next_usn(&mut self) -> i64 {
        self.highest_committed_usn += 1;
        self.highest_committed_usn
    }

    /// Tag of the object holding the PEK list for this variant, when known.
    ///
    /// DS databases keep it on the domain naming context; LDS instances keep
    /// it on the configuration naming context.
    #[must_use]
    pub fn pek_holder(&self) -> Option<DnTag> {
        match self.variant {
            DatabaseVariant::DirectoryServices => self.domain_nc,
            DatabaseVariant::LightweightDirectoryServices => Some(self.configuration_nc),
        }
    }
}
