//! Transaction contract
//!
//! Each mutator runs inside exactly one transaction; the commit pipeline is
//! the only site that commits or aborts it.

use ditkit_core::DirectoryResult;

/// Commit durability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Let the engine flush at its leisure.
    Lazy,
    /// Force the commit to stable storage before returning.
    Flush,
}

/// An open transaction.
pub trait StoreTransaction {
    /// Commit the transaction.
    fn commit(self: Box<Self>, durability: Durability) -> DirectoryResult<()>;

    /// Roll the transaction back.
    fn abort(self: Box<Self>) -> DirectoryResult<()>;
}
