//! Directory agent
//!
//! The orchestrator over one database session. It drives the single shared
//! cursor through index switches and key lookups, materialises cursor-bound
//! object views, and either yields them (read paths) or runs an edit/commit
//! cycle with replication-metadata bookkeeping (write paths).
//!
//! The agent is not thread-safe: every operation repositions the one cursor.
//! Enumerators borrow the agent mutably, so a write cannot be interleaved
//! with an in-flight enumeration.

use crate::bootkey::compose_boot_key;
use crate::pek::{validate_boot_key, PekList, SecretDecryptor};
use crate::projections::{Account, DpapiBackupKey, KdsRootKey};
use ditkit_core::{
    Clock, DatabaseVariant, DcState, DirectoryError, DirectoryResult, Dn, DnTag, ObjectIdentifier,
    SecurityIdentifier, SystemClock, UserAccountControl,
};
use ditkit_store::{
    attributes, key, DataCursor, DirectoryContext, DirectoryDatabase, DirectoryObject,
    DirectorySchema, Durability, MatchKind, StoreTransaction,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Class of the objects carrying DPAPI backup keys.
const SECRET_CLASS: &str = "secret";
/// Class of the KDS root key objects.
const KDS_ROOT_KEY_CLASS: &str = "msKds-ProvRootKey";
/// Exclusive upper bound of the documented RID range.
const RID_RANGE_END: i32 = 1 << 30;

/// Bind a view over the cursor's current record.
fn bind_view<'a>(
    cursor: &'a mut dyn DataCursor,
    ctx: &'a DirectoryContext,
) -> DirectoryObject<'a> {
    DirectoryObject::new(cursor, ctx.schema().as_ref())
}

/// Read/write access layer over one open directory database.
pub struct DirectoryAgent {
    ctx: DirectoryContext,
    cursor: Box<dyn DataCursor>,
    clock: Arc<dyn Clock>,
}

impl DirectoryAgent {
    /// Open an agent over a database, using the wall clock for replication
    /// timestamps.
    pub fn open(
        db: Arc<dyn DirectoryDatabase>,
        schema: Arc<dyn DirectorySchema>,
    ) -> DirectoryResult<Self> {
        Self::open_with_clock(db, schema, Arc::new(SystemClock))
    }

    /// Open an agent with an injected clock.
    pub fn open_with_clock(
        db: Arc<dyn DirectoryDatabase>,
        schema: Arc<dyn DirectorySchema>,
        clock: Arc<dyn Clock>,
    ) -> DirectoryResult<Self> {
        let ctx = DirectoryContext::open(db, schema)?;
        let cursor = ctx.open_data_table()?;
        Ok(Self { ctx, cursor, clock })
    }

    /// The session context.
    #[must_use]
    pub fn context(&self) -> &DirectoryContext {
        &self.ctx
    }

    // ── Lookups ─────────────────────────────────────────────────────────

    /// Locate an object and bind a view over it.
    ///
    /// Unique identifiers (tag, GUID, SID) go straight to the record; SAM
    /// names scan their index partition and return the first live writable
    /// row, since tombstoned duplicates may share the name.
    #[instrument(skip(self), level = "debug")]
    pub fn find_object(&mut self, id: &ObjectIdentifier) -> DirectoryResult<DirectoryObject<'_>> {
        self.position_at(id)?;
        Ok(bind_view(self.cursor.as_mut(), &self.ctx))
    }

    /// Bind a view over whatever record the cursor currently points at,
    /// without repositioning.
    pub fn current_object(&mut self) -> DirectoryResult<DirectoryObject<'_>> {
        let view = bind_view(self.cursor.as_mut(), &self.ctx);
        view.tag()?;
        Ok(view)
    }

    /// Enumerate the objects of one class.
    ///
    /// The sequence is lazy, finite, single-pass and not restartable: it
    /// shares the agent's one cursor with every other operation.
    #[instrument(skip(self), level = "debug")]
    pub fn find_objects_by_category(
        &mut self,
        class_name: &str,
        include_deleted: bool,
    ) -> DirectoryResult<CategoryCursor<'_>> {
        self.seek_category(class_name)?;
        Ok(CategoryCursor {
            agent: self,
            include_deleted,
        })
    }

    // ── Account and secret reads ────────────────────────────────────────

    /// Fetch one account.
    ///
    /// The decryptor is acquired after the type check so that queries
    /// against non-accounts never pay decryption cost.
    #[instrument(skip(self, boot_key), level = "debug")]
    pub fn get_account(
        &mut self,
        id: &ObjectIdentifier,
        boot_key: Option<&[u8]>,
    ) -> DirectoryResult<Account> {
        self.position_at(id)?;
        let is_account = bind_view(self.cursor.as_mut(), &self.ctx).is_account()?;
        if !is_account {
            return Err(DirectoryError::object_operation(
                "not a security principal",
                id,
            ));
        }
        let decryptor = self.get_secret_decryptor(boot_key)?.map(Arc::new);
        let view = bind_view(self.cursor.as_mut(), &self.ctx);
        Account::read_from(&view, decryptor)
    }

    /// Enumerate every live writable account.
    #[instrument(skip(self, boot_key), level = "debug")]
    pub fn get_accounts(&mut self, boot_key: Option<&[u8]>) -> DirectoryResult<AccountIter<'_>> {
        let decryptor = self.get_secret_decryptor(boot_key)?.map(Arc::new);
        // TODO: a dedicated account index would avoid scanning group and
        // alias partitions of the sAMAccountType index.
        let index = self
            .ctx
            .schema()
            .find_index_name(attributes::SAM_ACCOUNT_TYPE)?;
        self.cursor.set_current_index(Some(&index))?;
        Ok(AccountIter {
            agent: self,
            decryptor,
        })
    }

    /// Enumerate the domain DPAPI backup keys.
    #[instrument(skip(self, boot_key), level = "debug")]
    pub fn get_dpapi_backup_keys(
        &mut self,
        boot_key: Option<&[u8]>,
    ) -> DirectoryResult<BackupKeyIter<'_>> {
        let decryptor = self.get_secret_decryptor(boot_key)?.map(Arc::new);
        self.seek_category(SECRET_CLASS)?;
        Ok(BackupKeyIter {
            agent: self,
            decryptor,
        })
    }

    /// Enumerate the KDS root keys. Root key material is not PEK-wrapped,
    /// so no boot key is involved.
    #[instrument(skip(self), level = "debug")]
    pub fn get_kds_root_keys(&mut self) -> DirectoryResult<KdsRootKeyIter<'_>> {
        self.seek_category(KDS_ROOT_KEY_CLASS)?;
        Ok(KdsRootKeyIter { agent: self })
    }

    /// Acquire a secret decryptor according to the variant/state policy.
    ///
    /// | variant | state  | boot key | result                               |
    /// |---------|--------|----------|--------------------------------------|
    /// | DS      | any    | none     | `None`                               |
    /// | any     | Boot   | any      | `None` (a fresh DB has no secrets)   |
    /// | DS      | ≠ Boot | present  | unwrap the domain-NC PEK list        |
    /// | LDS     | ≠ Boot | ignored  | compose the key, unwrap the config-NC list |
    ///
    /// The caller's cursor position is identical before and after this call,
    /// on every exit path.
    pub fn get_secret_decryptor(
        &mut self,
        boot_key: Option<&[u8]>,
    ) -> DirectoryResult<Option<SecretDecryptor>> {
        if let Some(key) = boot_key {
            if !key.is_empty() {
                validate_boot_key("boot_key", key)?;
            }
        }
        let header = self.ctx.header();
        if header.state == DcState::Boot {
            return Ok(None);
        }
        match header.variant {
            DatabaseVariant::DirectoryServices => {
                let Some(key) = boot_key else {
                    return Ok(None);
                };
                let holder = header
                    .pek_holder()
                    .ok_or_else(|| DirectoryError::object_not_found("domain"))?;
                let key = key.to_vec();
                self.with_saved_cursor(|agent| {
                    let blob = agent.read_pek_blob(holder)?;
                    let list = PekList::decode(&blob, Some(&key))?;
                    Ok(Some(SecretDecryptor::new(list)))
                })
            }
            DatabaseVariant::LightweightDirectoryServices => {
                let root = header.root_object;
                let schema_nc = header.schema_nc;
                let holder = header.configuration_nc;
                self.with_saved_cursor(|agent| {
                    let root_fragment = agent.read_pek_blob(root)?;
                    let schema_fragment = agent.read_pek_blob(schema_nc)?;
                    let composed = compose_boot_key(&root_fragment, &schema_fragment)?;
                    let blob = agent.read_pek_blob(holder)?;
                    let list = PekList::decode(&blob, Some(&composed))?;
                    Ok(Some(SecretDecryptor::new(list)))
                })
            }
        }
    }

    // ── Boot-key rotation ───────────────────────────────────────────────

    /// Re-wrap the stored PEK list under a new boot key.
    ///
    /// An empty or all-zero new key stores the list in the clear, which is
    /// the supported path for database migration. The rotation is
    /// administrative: it neither burns a USN nor advances replication
    /// metadata.
    #[instrument(skip(self, old_boot_key, new_boot_key))]
    pub fn change_boot_key(
        &mut self,
        old_boot_key: Option<&[u8]>,
        new_boot_key: Option<&[u8]>,
    ) -> DirectoryResult<()> {
        if let Some(key) = old_boot_key {
            if !key.is_empty() {
                validate_boot_key("old_boot_key", key)?;
            }
        }
        if let Some(key) = new_boot_key {
            if !key.is_empty() {
                validate_boot_key("new_boot_key", key)?;
            }
        }
        let domain = self
            .ctx
            .header()
            .domain_nc
            .ok_or_else(|| DirectoryError::object_not_found("domain"))?;

        let txn = self.ctx.begin_transaction()?;
        let staged = (|| {
            self.position_at(&ObjectIdentifier::tag(domain))?;
            let mut view = bind_view(self.cursor.as_mut(), &self.ctx);
            let blob: Vec<u8> = view
                .read_attribute(attributes::PEK_LIST)?
                .ok_or_else(|| {
                    DirectoryError::decryption("the PEK holder carries no PEK list")
                })?;
            let list = PekList::decode(&blob, old_boot_key)?;
            let rewrapped = list.encode(new_boot_key)?;
            view.begin_edit()?;
            match view.set_attribute(attributes::PEK_LIST, Some(rewrapped)) {
                Ok(changed) => Ok(changed),
                Err(e) => {
                    let _ = view.reject_changes();
                    Err(e)
                }
            }
        })();
        let changed = match staged {
            Ok(changed) => changed,
            Err(e) => {
                let _ = txn.abort();
                return Err(e);
            }
        };
        self.commit_attribute_update(attributes::PEK_LIST, txn, changed, true)
    }

    // ── Mutators ────────────────────────────────────────────────────────

    /// Enable or disable an account by flipping the ACCOUNTDISABLE bit of
    /// `userAccountControl`. Returns whether the stored value changed.
    #[instrument(skip(self))]
    pub fn set_account_status(
        &mut self,
        id: &ObjectIdentifier,
        enabled: bool,
        skip_meta_update: bool,
    ) -> DirectoryResult<bool> {
        let txn = self.ctx.begin_transaction()?;
        let staged = (|| {
            self.position_at(id)?;
            let mut view = bind_view(self.cursor.as_mut(), &self.ctx);
            let uac: i32 = view
                .read_attribute(attributes::USER_ACCOUNT_CONTROL)?
                .ok_or_else(|| DirectoryError::object_operation("not an account", id))?;
            let updated = UserAccountControl::from(uac).with_enabled(enabled);
            view.begin_edit()?;
            match view.set_attribute(attributes::USER_ACCOUNT_CONTROL, Some(i32::from(updated)))
            {
                Ok(changed) => Ok(changed),
                Err(e) => {
                    let _ = view.reject_changes();
                    Err(e)
                }
            }
        })();
        self.finish_attribute_update(attributes::USER_ACCOUNT_CONTROL, txn, staged, skip_meta_update)
    }

    /// Set the primary group of an account.
    #[instrument(skip(self))]
    pub fn set_primary_group_id(
        &mut self,
        id: &ObjectIdentifier,
        group_rid: i32,
        skip_meta_update: bool,
    ) -> DirectoryResult<bool> {
        // TODO: validate that the RID refers to an existing group.
        if !(1..RID_RANGE_END).contains(&group_rid) {
            warn!(group_rid, "primary group RID lies outside [1, 2^30)");
        }
        let txn = self.ctx.begin_transaction()?;
        let staged = (|| {
            self.position_at(id)?;
            let mut view = bind_view(self.cursor.as_mut(), &self.ctx);
            if !view.is_account()? {
                return Err(DirectoryError::object_operation("not an account", id));
            }
            view.begin_edit()?;
            match view.set_attribute(attributes::PRIMARY_GROUP_ID, Some(group_rid)) {
                Ok(changed) => Ok(changed),
                Err(e) => {
                    let _ = view.reject_changes();
                    Err(e)
                }
            }
        })();
        self.finish_attribute_update(attributes::PRIMARY_GROUP_ID, txn, staged, skip_meta_update)
    }

    /// Merge SIDs into the `sIDHistory` of a security principal. Returns
    /// whether the stored set grew.
    #[instrument(skip(self, sids))]
    pub fn add_sid_history(
        &mut self,
        id: &ObjectIdentifier,
        sids: &[SecurityIdentifier],
        skip_meta_update: bool,
    ) -> DirectoryResult<bool> {
        let txn = self.ctx.begin_transaction()?;
        let staged = (|| {
            self.position_at(id)?;
            let mut view = bind_view(self.cursor.as_mut(), &self.ctx);
            if !view.is_security_principal()? {
                return Err(DirectoryError::object_operation(
                    "not a security principal",
                    id,
                ));
            }
            view.begin_edit()?;
            match view.add_attribute(attributes::SID_HISTORY, sids.to_vec()) {
                Ok(grew) => Ok(grew),
                Err(e) => {
                    let _ = view.reject_changes();
                    Err(e)
                }
            }
        })();
        self.finish_attribute_update(attributes::SID_HISTORY, txn, staged, skip_meta_update)
    }

    /// Delete an object.
    #[instrument(skip(self))]
    pub fn remove_object(&mut self, id: &ObjectIdentifier) -> DirectoryResult<()> {
        let txn = self.ctx.begin_transaction()?;
        let staged = (|| {
            self.position_at(id)?;
            bind_view(self.cursor.as_mut(), &self.ctx).delete()
        })();
        match staged {
            Ok(()) => txn.commit(Durability::Lazy),
            Err(e) => {
                let _ = txn.abort();
                Err(e)
            }
        }
    }

    // ── DC-header writes ────────────────────────────────────────────────

    /// Set the backup/restore epoch. Committed with a flush; the header is
    /// not an ordinary object and bypasses the attribute pipeline.
    #[instrument(skip(self))]
    pub fn set_epoch(&mut self, epoch: i32) -> DirectoryResult<()> {
        let txn = self.ctx.begin_transaction()?;
        self.ctx.header_mut().epoch = epoch;
        self.commit_header_write(txn)
    }

    /// Set the highest committed USN. Committed with a flush.
    #[instrument(skip(self))]
    pub fn set_usn(&mut self, highest_committed_usn: i64) -> DirectoryResult<()> {
        if highest_committed_usn < self.ctx.header().highest_committed_usn {
            warn!(
                highest_committed_usn,
                current = self.ctx.header().highest_committed_usn,
                "lowering the highest committed USN"
            );
        }
        let txn = self.ctx.begin_transaction()?;
        self.ctx.header_mut().highest_committed_usn = highest_committed_usn;
        self.commit_header_write(txn)
    }

    // ── Administrative stubs ────────────────────────────────────────────

    /// Authoritative restore of attributes selected by object GUID.
    pub fn authoritative_restore_by_guid(
        &mut self,
        _object_guid: Uuid,
        _attribute_names: &[&str],
    ) -> DirectoryResult<()> {
        Err(DirectoryError::not_implemented("authoritative_restore"))
    }

    /// Authoritative restore of attributes selected by distinguished name.
    pub fn authoritative_restore_by_dn(
        &mut self,
        _dn: &Dn,
        _attribute_names: &[&str],
    ) -> DirectoryResult<()> {
        Err(DirectoryError::not_implemented("authoritative_restore"))
    }

    // ── Internal machinery ──────────────────────────────────────────────

    /// Position the cursor on the record an identifier denotes.
    fn position_at(&mut self, id: &ObjectIdentifier) -> DirectoryResult<()> {
        match id {
            ObjectIdentifier::Tag(tag) => {
                self.cursor.set_current_index(None)?;
                if !self.cursor.goto_key(&key::int32_key(tag.value()))? {
                    return Err(DirectoryError::object_not_found(id));
                }
                Ok(())
            }
            ObjectIdentifier::Guid(guid) => {
                let index = self.ctx.schema().find_index_name(attributes::OBJECT_GUID)?;
                self.cursor.set_current_index(Some(&index))?;
                if !self.cursor.goto_key(guid.as_bytes())? {
                    return Err(DirectoryError::object_not_found(id));
                }
                Ok(())
            }
            ObjectIdentifier::Sid(sid) => {
                let index = self.ctx.schema().find_index_name(attributes::OBJECT_SID)?;
                self.cursor.set_current_index(Some(&index))?;
                if !self.cursor.goto_key(&sid.to_key_bytes())? {
                    return Err(DirectoryError::object_not_found(id));
                }
                Ok(())
            }
            ObjectIdentifier::Dn(dn) => {
                let tag = self.ctx.resolver().resolve(dn)?;
                self.cursor.set_current_index(None)?;
                if !self.cursor.goto_key(&key::int32_key(tag.value()))? {
                    return Err(DirectoryError::object_not_found(id));
                }
                Ok(())
            }
            ObjectIdentifier::Sam(name) => {
                let index = self
                    .ctx
                    .schema()
                    .find_index_name(attributes::SAM_ACCOUNT_NAME)?;
                self.cursor.set_current_index(Some(&index))?;
                self.cursor
                    .find_records(MatchKind::Equal, &key::text_key(name))?;
                // Accounts can appear more than once (tombstones); the
                // lookup returns the first live writable instance.
                while self.cursor.move_next()? {
                    let view = bind_view(self.cursor.as_mut(), &self.ctx);
                    if view.is_writable()? && !view.is_deleted()? {
                        return Ok(());
                    }
                }
                Err(DirectoryError::object_not_found(id))
            }
        }
    }

    /// Switch to the `objectCategory` index and range-seek one class.
    fn seek_category(&mut self, class_name: &str) -> DirectoryResult<()> {
        let class_id = self.ctx.schema().find_class_id(class_name)?;
        let index = self
            .ctx
            .schema()
            .find_index_name(attributes::OBJECT_CATEGORY)?;
        self.cursor.set_current_index(Some(&index))?;
        self.cursor
            .find_records(MatchKind::Equal, &key::int32_key(class_id))?;
        Ok(())
    }

    /// Run `f` with the cursor position saved, restoring it on every exit
    /// path. The cursor is shared with the caller's in-flight enumeration;
    /// internal re-seeks must leave no trace.
    fn with_saved_cursor<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> DirectoryResult<T>,
    ) -> DirectoryResult<T> {
        let saved = self.cursor.save_location()?;
        let result = f(self);
        let restored = self.cursor.restore_location(&saved);
        match (result, restored) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    /// Read the `pekList` blob off one object.
    fn read_pek_blob(&mut self, tag: DnTag) -> DirectoryResult<Vec<u8>> {
        self.position_at(&ObjectIdentifier::tag(tag))?;
        let view = bind_view(self.cursor.as_mut(), &self.ctx);
        view.read_attribute::<Vec<u8>>(attributes::PEK_LIST)?
            .ok_or_else(|| DirectoryError::decryption("the PEK holder carries no PEK list"))
    }

    /// Close out a mutator: turn the staging result into the commit state
    /// machine, aborting the transaction when staging failed.
    fn finish_attribute_update(
        &mut self,
        attribute: &str,
        txn: Box<dyn StoreTransaction>,
        staged: DirectoryResult<bool>,
        skip_meta_update: bool,
    ) -> DirectoryResult<bool> {
        let changed = match staged {
            Ok(changed) => changed,
            Err(e) => {
                let _ = txn.abort();
                return Err(e);
            }
        };
        self.commit_attribute_update(attribute, txn, changed, skip_meta_update)?;
        Ok(changed)
    }

    /// The commit state machine: `Editing → {NoOp, MetaUpdated} →
    /// {Committed, Aborted}`.
    ///
    /// The USN advances only when a real write occurred and metadata is
    /// being maintained; anything else would show replication spurious or
    /// non-progressing versions.
    fn commit_attribute_update(
        &mut self,
        attribute: &str,
        txn: Box<dyn StoreTransaction>,
        changed: bool,
        skip_meta_update: bool,
    ) -> DirectoryResult<()> {
        if !changed {
            debug!(attribute, "write is a no-op; aborting");
            let rejected = self.cursor.reject_changes();
            let aborted = txn.abort();
            rejected?;
            aborted?;
            return Ok(());
        }

        let staged: DirectoryResult<()> = (|| {
            if !skip_meta_update {
                let usn = self.ctx.header_mut().next_usn();
                let time = self.clock.now();
                let mut view = bind_view(self.cursor.as_mut(), &self.ctx);
                view.update_attribute_meta(attribute, usn, time)?;
                self.ctx.save_header()?;
            }
            self.cursor.accept_changes()
        })();

        match staged {
            Ok(()) => match txn.commit(Durability::Lazy) {
                Ok(()) => Ok(()),
                Err(e) => {
                    let _ = self.ctx.reload_header();
                    Err(e)
                }
            },
            Err(e) => {
                let _ = self.cursor.reject_changes();
                if let Err(abort_err) = txn.abort() {
                    warn!(error = %abort_err, "transaction abort failed");
                }
                let _ = self.ctx.reload_header();
                Err(e)
            }
        }
    }

    /// Commit a DC-header write durably, resynchronising the in-memory
    /// header on failure.
    fn commit_header_write(&mut self, txn: Box<dyn StoreTransaction>) -> DirectoryResult<()> {
        match self.ctx.save_header() {
            Ok(()) => match txn.commit(Durability::Flush) {
                Ok(()) => Ok(()),
                Err(e) => {
                    let _ = self.ctx.reload_header();
                    Err(e)
                }
            },
            Err(e) => {
                let _ = txn.abort();
                let _ = self.ctx.reload_header();
                Err(e)
            }
        }
    }
}

/// Lazy cursor over the objects of one class.
///
/// Not an `Iterator`: each element is a view bound to the shared cursor, so
/// the previous element must be dropped before the next is produced.
pub struct CategoryCursor<'a> {
    agent: &'a mut DirectoryAgent,
    include_deleted: bool,
}

impl CategoryCursor<'_> {
    /// Step to the next object of the class, skipping tombstones unless
    /// deleted objects were requested.
    pub fn next_object(&mut self) -> DirectoryResult<Option<DirectoryObject<'_>>> {
        loop {
            if !self.agent.cursor.move_next()? {
                return Ok(None);
            }
            let deleted =
                bind_view(self.agent.cursor.as_mut(), &self.agent.ctx).is_deleted()?;
            if deleted && !self.include_deleted {
                continue;
            }
            return Ok(Some(bind_view(
                self.agent.cursor.as_mut(),
                &self.agent.ctx,
            )));
        }
    }
}

/// Lazy account enumeration over the `sAMAccountType` index.
pub struct AccountIter<'a> {
    agent: &'a mut DirectoryAgent,
    decryptor: Option<Arc<SecretDecryptor>>,
}

impl Iterator for AccountIter<'_> {
    type Item = DirectoryResult<Account>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.agent.cursor.move_next() {
                Ok(false) => return None,
                Ok(true) => {}
                Err(e) => return Some(Err(e)),
            }
            let view = bind_view(self.agent.cursor.as_mut(), &self.agent.ctx);
            let wanted = (|| {
                Ok::<bool, DirectoryError>(
                    view.is_account()? && view.is_writable()? && !view.is_deleted()?,
                )
            })();
            match wanted {
                Ok(false) => continue,
                Ok(true) => {
                    return Some(Account::read_from(&view, self.decryptor.clone()));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Lazy DPAPI backup key enumeration over the `secret` class.
pub struct BackupKeyIter<'a> {
    agent: &'a mut DirectoryAgent,
    decryptor: Option<Arc<SecretDecryptor>>,
}

impl Iterator for BackupKeyIter<'_> {
    type Item = DirectoryResult<DpapiBackupKey>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.agent.cursor.move_next() {
                Ok(false) => return None,
                Ok(true) => {}
                Err(e) => return Some(Err(e)),
            }
            let view = bind_view(self.agent.cursor.as_mut(), &self.agent.ctx);
            let wanted = (|| {
                if view.is_deleted()? {
                    return Ok::<bool, DirectoryError>(false);
                }
                let name: Option<String> =
                    view.read_attribute(attributes::COMMON_NAME)?;
                Ok(name.is_some_and(|n| {
                    n.starts_with(crate::projections::backup_key::BACKUP_KEY_PREFIX)
                }))
            })();
            match wanted {
                Ok(false) => continue,
                Ok(true) => {
                    return Some(DpapiBackupKey::read_from(&view, self.decryptor.clone()));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Lazy KDS root key enumeration over the `msKds-ProvRootKey` class.
pub struct KdsRootKeyIter<'a> {
    agent: &'a mut DirectoryAgent,
}

impl Iterator for KdsRootKeyIter<'_> {
    type Item = DirectoryResult<KdsRootKey>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.agent.cursor.move_next() {
                Ok(false) => return None,
                Ok(true) => {}
                Err(e) => return Some(Err(e)),
            }
            let view = bind_view(self.agent.cursor.as_mut(), &self.agent.ctx);
            match view.is_deleted() {
                Ok(true) => continue,
                Ok(false) => return Some(KdsRootKey::read_from(&view)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
