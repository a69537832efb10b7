//! Distinguished-name resolution contract

use ditkit_core::{Dn, DirectoryResult, DnTag};

/// Resolves distinguished names to object-table tags.
pub trait DnResolver: Send + Sync {
    /// Resolve a DN. Fails with `ObjectNotFound` when no object carries it.
    fn resolve(&self, dn: &Dn) -> DirectoryResult<DnTag>;
}
