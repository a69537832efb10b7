//! Per-session database context
//!
//! A context owns the database session state: the handle used as a
//! transaction factory, the schema catalogue, the DN resolver, and the
//! mutable Domain Controller header loaded at open time. It lives for the
//! agent's lifetime; callers that need parallelism open independent
//! contexts.

use crate::cursor::DataCursor;
use crate::database::DirectoryDatabase;
use crate::header::DcHeader;
use crate::resolver::DnResolver;
use crate::schema::DirectorySchema;
use crate::transaction::StoreTransaction;
use ditkit_core::DirectoryResult;
use std::sync::Arc;

/// An open database session.
pub struct DirectoryContext {
    db: Arc<dyn DirectoryDatabase>,
    schema: Arc<dyn DirectorySchema>,
    resolver: Arc<dyn DnResolver>,
    header: DcHeader,
}

impl DirectoryContext {
    /// Open a session: loads the DC header and wires up the collaborators.
    pub fn open(
        db: Arc<dyn DirectoryDatabase>,
        schema: Arc<dyn DirectorySchema>,
    ) -> DirectoryResult<Self> {
        let header = db.load_dc_header()?;
        let resolver = db.dn_resolver();
        Ok(Self {
            db,
            schema,
            resolver,
            header,
        })
    }

    /// Begin a transaction.
    pub fn begin_transaction(&self) -> DirectoryResult<Box<dyn StoreTransaction>> {
        self.db.begin_transaction()
    }

    /// Open a cursor over the data table.
    pub fn open_data_table(&self) -> DirectoryResult<Box<dyn DataCursor>> {
        self.db.open_data_table()
    }

    /// The Domain Controller header.
    #[must_use]
    pub fn header(&self) -> &DcHeader {
        &self.header
    }

    /// Mutable access to the Domain Controller header. Changes become
    /// durable via [`Self::save_header`].
    pub fn header_mut(&mut self) -> &mut DcHeader {
        &mut self.header
    }

    /// Persist the in-memory header; takes effect with the enclosing
    /// transaction.
    pub fn save_header(&self) -> DirectoryResult<()> {
        self.db.save_dc_header(&self.header)
    }

    /// Reload the header from the database, discarding in-memory changes.
    pub fn reload_header(&mut self) -> DirectoryResult<()> {
        self.header = self.db.load_dc_header()?;
        Ok(())
    }

    /// The schema catalogue.
    #[must_use]
    pub fn schema(&self) -> &Arc<dyn DirectorySchema> {
        &self.schema
    }

    /// The DN resolver.
    #[must_use]
    pub fn resolver(&self) -> &Arc<dyn DnResolver> {
        &self.resolver
    }
}
