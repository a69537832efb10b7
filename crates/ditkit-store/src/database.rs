//! Database handle contract

use crate::cursor::DataCursor;
use crate::header::DcHeader;
use crate::resolver::DnResolver;
use crate::transaction::StoreTransaction;
use ditkit_core::DirectoryResult;
use std::sync::Arc;

/// An open directory database.
pub trait DirectoryDatabase: Send + Sync {
    /// Open a cursor over the data table.
    fn open_data_table(&self) -> DirectoryResult<Box<dyn DataCursor>>;

    /// Begin a transaction. At most one may be open at a time per database
    /// handle.
    fn begin_transaction(&self) -> DirectoryResult<Box<dyn StoreTransaction>>;

    /// Load the Domain Controller header.
    fn load_dc_header(&self) -> DirectoryResult<DcHeader>;

    /// Persist the Domain Controller header. Takes effect with the enclosing
    /// transaction.
    fn save_dc_header(&self, header: &DcHeader) -> DirectoryResult<()>;

    /// The DN resolver backed by this database.
    fn dn_resolver(&self) -> Arc<dyn DnResolver>;
}
