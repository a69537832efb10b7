//! Reference in-memory engine
//!
//! Implements the storage contracts over a BTreeMap row store with
//! materialized secondary indexes, snapshot transactions and a staged cursor
//! edit buffer. The engine exists so the agent's end-to-end behavior can be
//! exercised against a real cursor; it is not an on-disk format.

use crate::cursor::{CursorLocation, DataCursor, MatchKind};
use crate::database::DirectoryDatabase;
use crate::header::DcHeader;
use crate::key::{int32_key, value_key};
use crate::meta::AttributeMeta;
use crate::resolver::DnResolver;
use crate::schema::{DirectorySchema, KeySyntax};
use crate::transaction::{Durability, StoreTransaction};
use crate::value::AttributeValue;
use crate::attributes;
use ditkit_core::{AttributeId, Dn, DirectoryError, DirectoryResult, DnTag};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tracing::warn;

/// One row of the data table.
#[derive(Debug, Clone, Default)]
struct Row {
    values: BTreeMap<AttributeId, Vec<AttributeValue>>,
    meta: BTreeMap<AttributeId, AttributeMeta>,
}

/// Mutable engine state behind the lock.
#[derive(Debug, Clone, Default)]
struct StoreData {
    rows: BTreeMap<i32, Row>,
    header: Option<DcHeader>,
    dn_map: HashMap<String, i32>,
    txn_active: bool,
}

fn normalize_dn(dn: &Dn) -> String {
    dn.components()
        .collect::<Vec<_>>()
        .join(",")
        .to_lowercase()
}

fn lock_poisoned<T>(_: T) -> DirectoryError {
    DirectoryError::storage("engine lock poisoned")
}

/// In-memory directory database.
pub struct MemoryDirectory {
    inner: Arc<RwLock<StoreData>>,
    schema: Arc<dyn DirectorySchema>,
}

impl MemoryDirectory {
    /// Start building a seeded database.
    #[must_use]
    pub fn builder(schema: Arc<dyn DirectorySchema>) -> MemoryDirectoryBuilder {
        MemoryDirectoryBuilder {
            schema,
            data: StoreData::default(),
        }
    }
}

impl DirectoryDatabase for MemoryDirectory {
    fn open_data_table(&self) -> DirectoryResult<Box<dyn DataCursor>> {
        let mut cursor = MemoryCursor {
            inner: Arc::clone(&self.inner),
            schema: Arc::clone(&self.schema),
            index: None,
            entries: Vec::new(),
            pos: Pos::BeforeFirst,
            range: None,
            scan_start: 0,
            edit: None,
        };
        cursor.materialize()?;
        Ok(Box::new(cursor))
    }

    fn begin_transaction(&self) -> DirectoryResult<Box<dyn StoreTransaction>> {
        let mut data = self.inner.write().map_err(lock_poisoned)?;
        if data.txn_active {
            return Err(DirectoryError::storage("a transaction is already active"));
        }
        data.txn_active = true;
        let snapshot = data.clone();
        Ok(Box::new(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            snapshot,
            finished: false,
        }))
    }

    fn load_dc_header(&self) -> DirectoryResult<DcHeader> {
        let data = self.inner.read().map_err(lock_poisoned)?;
        data.header
            .clone()
            .ok_or_else(|| DirectoryError::storage("database has no DC header"))
    }

    fn save_dc_header(&self, header: &DcHeader) -> DirectoryResult<()> {
        let mut data = self.inner.write().map_err(lock_poisoned)?;
        data.header = Some(header.clone());
        Ok(())
    }

    fn dn_resolver(&self) -> Arc<dyn DnResolver> {
        Arc::new(MemoryDnResolver {
            inner: Arc::clone(&self.inner),
        })
    }
}

/// Seeds a [`MemoryDirectory`].
pub struct MemoryDirectoryBuilder {
    schema: Arc<dyn DirectorySchema>,
    data: StoreData,
}

impl MemoryDirectoryBuilder {
    /// Set the DC header.
    #[must_use]
    pub fn header(mut self, header: DcHeader) -> Self {
        self.data.header = Some(header);
        self
    }

    /// Insert an object. Multi-valued attributes appear once per value in
    /// `attrs`. Objects are seeded writable unless `instanceType` is given
    /// explicitly.
    pub fn object(
        mut self,
        tag: DnTag,
        dn: &str,
        attrs: Vec<(&str, AttributeValue)>,
    ) -> DirectoryResult<Self> {
        if self.data.rows.contains_key(&tag.value()) {
            return Err(DirectoryError::storage(format!(
                "duplicate seed tag {tag}"
            )));
        }
        let mut row = Row::default();
        for (name, value) in attrs {
            let attr = self.schema.attribute_id(name)?;
            row.values.entry(attr).or_default().push(value);
        }
        let instance_type = self.schema.attribute_id(attributes::INSTANCE_TYPE)?;
        row.values
            .entry(instance_type)
            .or_insert_with(|| vec![AttributeValue::Int32(0x4)]);
        self.data.rows.insert(tag.value(), row);
        self.data
            .dn_map
            .insert(normalize_dn(&Dn::new(dn)), tag.value());
        Ok(self)
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> MemoryDirectory {
        MemoryDirectory {
            inner: Arc::new(RwLock::new(self.data)),
            schema: self.schema,
        }
    }
}

struct MemoryDnResolver {
    inner: Arc<RwLock<StoreData>>,
}

impl DnResolver for MemoryDnResolver {
    fn resolve(&self, dn: &Dn) -> DirectoryResult<DnTag> {
        let data = self.inner.read().map_err(lock_poisoned)?;
        data.dn_map
            .get(&normalize_dn(dn))
            .map(|tag| DnTag::new(*tag))
            .ok_or_else(|| DirectoryError::object_not_found(dn))
    }
}

struct MemoryTransaction {
    inner: Arc<RwLock<StoreData>>,
    snapshot: StoreData,
    finished: bool,
}

impl MemoryTransaction {
    fn rollback(&mut self) -> DirectoryResult<()> {
        let mut data = self.inner.write().map_err(lock_poisoned)?;
        *data = self.snapshot.clone();
        data.txn_active = false;
        self.finished = true;
        Ok(())
    }
}

impl StoreTransaction for MemoryTransaction {
    fn commit(mut self: Box<Self>, _durability: Durability) -> DirectoryResult<()> {
        let mut data = self.inner.write().map_err(lock_poisoned)?;
        data.txn_active = false;
        self.finished = true;
        Ok(())
    }

    fn abort(mut self: Box<Self>) -> DirectoryResult<()> {
        self.rollback()
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            warn!("transaction dropped without commit or abort; rolling back");
            let _ = self.rollback();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pos {
    BeforeFirst,
    On(usize),
    End,
}

struct EditBuffer {
    tag: i32,
    row: Row,
}

struct MemoryCursor {
    inner: Arc<RwLock<StoreData>>,
    schema: Arc<dyn DirectorySchema>,
    index: Option<String>,
    /// (key, tag) pairs in index order, materialized on index selection.
    entries: Vec<(Vec<u8>, i32)>,
    pos: Pos,
    range: Option<(MatchKind, Vec<u8>)>,
    scan_start: usize,
    edit: Option<EditBuffer>,
}

impl MemoryCursor {
    fn materialize(&mut self) -> DirectoryResult<()> {
        let data = self.inner.read().map_err(lock_poisoned)?;
        let mut entries = Vec::new();
        match &self.index {
            None => {
                for tag in data.rows.keys() {
                    entries.push((int32_key(*tag), *tag));
                }
            }
            Some(name) => {
                let (attr, syntax) = self.index_definition(name)?;
                for (tag, row) in &data.rows {
                    for value in row.values.get(&attr).map(Vec::as_slice).unwrap_or(&[]) {
                        entries.push((value_key(syntax, value)?, *tag));
                    }
                }
                entries.sort();
            }
        }
        self.entries = entries;
        Ok(())
    }

    fn index_definition(&self, name: &str) -> DirectoryResult<(AttributeId, KeySyntax)> {
        self.schema
            .indexed_attributes()
            .into_iter()
            .find(|(_, index, _)| index == name)
            .map(|(attr, _, syntax)| (attr, syntax))
            .ok_or_else(|| DirectoryError::storage(format!("unknown index {name}")))
    }

    fn current_row_tag(&self) -> DirectoryResult<i32> {
        match self.pos {
            Pos::On(i) => Ok(self.entries[i].1),
            _ => Err(DirectoryError::storage("cursor has no current record")),
        }
    }

    /// Read through the edit buffer when one is open over the current row.
    fn with_row<T>(&self, f: impl FnOnce(&Row) -> T) -> DirectoryResult<T> {
        let tag = self.current_row_tag()?;
        if let Some(edit) = &self.edit {
            if edit.tag == tag {
                return Ok(f(&edit.row));
            }
        }
        let data = self.inner.read().map_err(lock_poisoned)?;
        let row = data
            .rows
            .get(&tag)
            .ok_or_else(|| DirectoryError::storage("current record no longer exists"))?;
        Ok(f(row))
    }

    fn edit_row(&mut self) -> DirectoryResult<&mut Row> {
        let tag = self.current_row_tag()?;
        match self.edit.as_mut() {
            Some(edit) if edit.tag == tag => Ok(&mut edit.row),
            Some(_) => Err(DirectoryError::storage(
                "edit buffer is open over a different record",
            )),
            None => Err(DirectoryError::storage("no edit in progress")),
        }
    }
}

impl DataCursor for MemoryCursor {
    fn current_index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    fn set_current_index(&mut self, index: Option<&str>) -> DirectoryResult<()> {
        if self.edit.is_some() {
            return Err(DirectoryError::storage(
                "cannot switch index with an edit in progress",
            ));
        }
        self.index = index.map(str::to_owned);
        self.range = None;
        self.scan_start = 0;
        self.pos = Pos::BeforeFirst;
        self.materialize()
    }

    fn goto_key(&mut self, key: &[u8]) -> DirectoryResult<bool> {
        let lb = self.entries.partition_point(|(k, _)| k.as_slice() < key);
        if lb < self.entries.len() && self.entries[lb].0 == key {
            self.pos = Pos::On(lb);
            self.range = None;
            self.scan_start = 0;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn find_records(&mut self, matching: MatchKind, key: &[u8]) -> DirectoryResult<bool> {
        let lb = self.entries.partition_point(|(k, _)| k.as_slice() < key);
        self.scan_start = lb;
        self.range = Some((matching, key.to_vec()));
        self.pos = Pos::BeforeFirst;
        let exists = match matching {
            MatchKind::Equal => lb < self.entries.len() && self.entries[lb].0 == key,
            MatchKind::GreaterOrEqual => lb < self.entries.len(),
        };
        Ok(exists)
    }

    fn move_next(&mut self) -> DirectoryResult<bool> {
        let next = match self.pos {
            Pos::BeforeFirst => self.scan_start,
            Pos::On(i) => i + 1,
            Pos::End => return Ok(false),
        };
        if next >= self.entries.len() {
            self.pos = Pos::End;
            return Ok(false);
        }
        if let Some((MatchKind::Equal, key)) = &self.range {
            if self.entries[next].0 != *key {
                self.pos = Pos::End;
                return Ok(false);
            }
        }
        self.pos = Pos::On(next);
        Ok(true)
    }

    fn save_location(&self) -> DirectoryResult<CursorLocation> {
        Ok(CursorLocation {
            index: self.index.clone(),
            tag: match self.pos {
                Pos::On(i) => Some(DnTag::new(self.entries[i].1)),
                _ => None,
            },
            range: self.range.clone(),
        })
    }

    fn restore_location(&mut self, location: &CursorLocation) -> DirectoryResult<()> {
        self.set_current_index(location.index.as_deref())?;
        if let Some((matching, key)) = &location.range {
            self.find_records(*matching, key)?;
        }
        if let Some(tag) = location.tag {
            let found = self
                .entries
                .iter()
                .position(|(_, t)| *t == tag.value())
                .ok_or_else(|| {
                    DirectoryError::storage("saved cursor record no longer exists")
                })?;
            self.pos = Pos::On(found);
        }
        Ok(())
    }

    fn current_tag(&self) -> DirectoryResult<DnTag> {
        self.current_row_tag().map(DnTag::new)
    }

    fn begin_edit_for_update(&mut self) -> DirectoryResult<()> {
        if self.edit.is_some() {
            return Err(DirectoryError::storage("an edit is already in progress"));
        }
        let tag = self.current_row_tag()?;
        let data = self.inner.read().map_err(lock_poisoned)?;
        let row = data
            .rows
            .get(&tag)
            .ok_or_else(|| DirectoryError::storage("current record no longer exists"))?
            .clone();
        drop(data);
        self.edit = Some(EditBuffer { tag, row });
        Ok(())
    }

    fn accept_changes(&mut self) -> DirectoryResult<()> {
        let edit = self
            .edit
            .take()
            .ok_or_else(|| DirectoryError::storage("no edit in progress"))?;
        let mut data = self.inner.write().map_err(lock_poisoned)?;
        data.rows.insert(edit.tag, edit.row);
        Ok(())
    }

    fn reject_changes(&mut self) -> DirectoryResult<()> {
        self.edit
            .take()
            .map(|_| ())
            .ok_or_else(|| DirectoryError::storage("no edit in progress"))
    }

    fn get_value(&self, attr: AttributeId) -> DirectoryResult<Option<AttributeValue>> {
        self.with_row(|row| row.values.get(&attr).and_then(|v| v.first().cloned()))
    }

    fn get_values(&self, attr: AttributeId) -> DirectoryResult<Vec<AttributeValue>> {
        self.with_row(|row| row.values.get(&attr).cloned().unwrap_or_default())
    }

    fn set_value(
        &mut self,
        attr: AttributeId,
        value: Option<AttributeValue>,
    ) -> DirectoryResult<bool> {
        let row = self.edit_row()?;
        match value {
            None => Ok(row.values.remove(&attr).is_some_and(|v| !v.is_empty())),
            Some(value) => {
                let new = vec![value];
                if row.values.get(&attr) == Some(&new) {
                    return Ok(false);
                }
                row.values.insert(attr, new);
                Ok(true)
            }
        }
    }

    fn add_values(
        &mut self,
        attr: AttributeId,
        values: Vec<AttributeValue>,
    ) -> DirectoryResult<bool> {
        let row = self.edit_row()?;
        let existing = row.values.entry(attr).or_default();
        let mut grew = false;
        for value in values {
            if !existing.contains(&value) {
                existing.push(value);
                grew = true;
            }
        }
        Ok(grew)
    }

    fn get_meta(&self, attr: AttributeId) -> DirectoryResult<Option<AttributeMeta>> {
        self.with_row(|row| row.meta.get(&attr).copied())
    }

    fn set_meta(&mut self, attr: AttributeId, meta: AttributeMeta) -> DirectoryResult<()> {
        let row = self.edit_row()?;
        row.meta.insert(attr, meta);
        Ok(())
    }

    fn delete_current(&mut self) -> DirectoryResult<()> {
        if self.edit.is_some() {
            return Err(DirectoryError::storage(
                "cannot delete with an edit in progress",
            ));
        }
        let tag = self.current_row_tag()?;
        let mut data = self.inner.write().map_err(lock_poisoned)?;
        data.rows.remove(&tag);
        data.dn_map.retain(|_, t| *t != tag);
        drop(data);
        if let Pos::On(i) = self.pos {
            self.entries.remove(i);
            self.scan_start = i;
            self.pos = Pos::BeforeFirst;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{OBJECT_SID, SAM_ACCOUNT_NAME, SAM_ACCOUNT_TYPE};
    use crate::key::text_key;
    use crate::schema::BuiltinSchema;
    use ditkit_core::{DatabaseVariant, DcState, SecurityIdentifier};

    fn schema() -> Arc<dyn DirectorySchema> {
        Arc::new(BuiltinSchema::new())
    }

    fn test_header() -> DcHeader {
        DcHeader {
            epoch: 1,
            highest_committed_usn: 1000,
            variant: DatabaseVariant::DirectoryServices,
            state: DcState::Normal,
            domain_nc: Some(DnTag::new(1787)),
            configuration_nc: DnTag::new(1790),
            schema_nc: DnTag::new(1793),
            root_object: DnTag::new(2),
        }
    }

    fn seeded() -> MemoryDirectory {
        let schema = schema();
        MemoryDirectory::builder(Arc::clone(&schema))
            .header(test_header())
            .object(
                DnTag::new(10),
                "CN=Alice,DC=contoso,DC=com",
                vec![
                    (SAM_ACCOUNT_NAME, AttributeValue::Text("alice".into())),
                    (SAM_ACCOUNT_TYPE, AttributeValue::Int32(0x3000_0000)),
                ],
            )
            .unwrap()
            .object(
                DnTag::new(11),
                "CN=Bob,DC=contoso,DC=com",
                vec![
                    (SAM_ACCOUNT_NAME, AttributeValue::Text("bob".into())),
                    (SAM_ACCOUNT_TYPE, AttributeValue::Int32(0x3000_0000)),
                ],
            )
            .unwrap()
            .build()
    }

    #[test]
    fn test_primary_index_scan() {
        let db = seeded();
        let mut cursor = db.open_data_table().unwrap();
        let mut tags = Vec::new();
        while cursor.move_next().unwrap() {
            tags.push(cursor.current_tag().unwrap());
        }
        assert_eq!(tags, vec![DnTag::new(10), DnTag::new(11)]);
    }

    #[test]
    fn test_secondary_index_goto_key() {
        let db = seeded();
        let schema = schema();
        let index = schema.find_index_name(SAM_ACCOUNT_NAME).unwrap();
        let mut cursor = db.open_data_table().unwrap();
        cursor.set_current_index(Some(&index)).unwrap();
        assert!(cursor.goto_key(&text_key("BOB")).unwrap());
        assert_eq!(cursor.current_tag().unwrap(), DnTag::new(11));
        assert!(!cursor.goto_key(&text_key("carol")).unwrap());
    }

    #[test]
    fn test_equal_range_scan_stops_at_partition_end() {
        let db = seeded();
        let schema = schema();
        let index = schema.find_index_name(SAM_ACCOUNT_TYPE).unwrap();
        let mut cursor = db.open_data_table().unwrap();
        cursor.set_current_index(Some(&index)).unwrap();
        assert!(cursor
            .find_records(MatchKind::Equal, &crate::key::int32_key(0x3000_0000))
            .unwrap());
        let mut count = 0;
        while cursor.move_next().unwrap() {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn test_save_restore_roundtrip() {
        let db = seeded();
        let schema = schema();
        let index = schema.find_index_name(SAM_ACCOUNT_NAME).unwrap();
        let mut cursor = db.open_data_table().unwrap();
        cursor.set_current_index(Some(&index)).unwrap();
        assert!(cursor.goto_key(&text_key("alice")).unwrap());
        let saved = cursor.save_location().unwrap();

        cursor.set_current_index(None).unwrap();
        assert!(cursor.move_next().unwrap());

        cursor.restore_location(&saved).unwrap();
        assert_eq!(cursor.current_index(), Some(index.as_str()));
        assert_eq!(cursor.current_tag().unwrap(), DnTag::new(10));
    }

    #[test]
    fn test_edit_requires_begin() {
        let db = seeded();
        let schema = schema();
        let mut cursor = db.open_data_table().unwrap();
        assert!(cursor.move_next().unwrap());
        let attr = schema.attribute_id(SAM_ACCOUNT_NAME).unwrap();
        assert!(cursor
            .set_value(attr, Some(AttributeValue::Text("eve".into())))
            .is_err());
    }

    #[test]
    fn test_edit_accept_and_change_detection() {
        let db = seeded();
        let schema = schema();
        let mut cursor = db.open_data_table().unwrap();
        assert!(cursor.move_next().unwrap());
        let attr = schema.attribute_id(SAM_ACCOUNT_NAME).unwrap();

        cursor.begin_edit_for_update().unwrap();
        // Same value: no change reported.
        assert!(!cursor
            .set_value(attr, Some(AttributeValue::Text("alice".into())))
            .unwrap());
        assert!(cursor
            .set_value(attr, Some(AttributeValue::Text("alicia".into())))
            .unwrap());
        cursor.accept_changes().unwrap();

        assert_eq!(
            cursor.get_value(attr).unwrap(),
            Some(AttributeValue::Text("alicia".into()))
        );
    }

    #[test]
    fn test_reject_discards_staged_write() {
        let db = seeded();
        let schema = schema();
        let mut cursor = db.open_data_table().unwrap();
        assert!(cursor.move_next().unwrap());
        let attr = schema.attribute_id(SAM_ACCOUNT_NAME).unwrap();

        cursor.begin_edit_for_update().unwrap();
        assert!(cursor
            .set_value(attr, Some(AttributeValue::Text("eve".into())))
            .unwrap());
        cursor.reject_changes().unwrap();

        assert_eq!(
            cursor.get_value(attr).unwrap(),
            Some(AttributeValue::Text("alice".into()))
        );
    }

    #[test]
    fn test_transaction_abort_rolls_back() {
        let db = seeded();
        let schema = schema();
        let attr = schema.attribute_id(SAM_ACCOUNT_NAME).unwrap();

        let txn = db.begin_transaction().unwrap();
        let mut cursor = db.open_data_table().unwrap();
        assert!(cursor.move_next().unwrap());
        cursor.begin_edit_for_update().unwrap();
        cursor
            .set_value(attr, Some(AttributeValue::Text("eve".into())))
            .unwrap();
        cursor.accept_changes().unwrap();
        txn.abort().unwrap();

        let mut cursor = db.open_data_table().unwrap();
        assert!(cursor.move_next().unwrap());
        assert_eq!(
            cursor.get_value(attr).unwrap(),
            Some(AttributeValue::Text("alice".into()))
        );
    }

    #[test]
    fn test_nested_transactions_rejected() {
        let db = seeded();
        let txn = db.begin_transaction().unwrap();
        assert!(db.begin_transaction().is_err());
        txn.commit(Durability::Lazy).unwrap();
        let txn = db.begin_transaction().unwrap();
        txn.commit(Durability::Flush).unwrap();
    }

    #[test]
    fn test_dn_resolution() {
        let db = seeded();
        let resolver = db.dn_resolver();
        let tag = resolver
            .resolve(&Dn::new("cn=ALICE,dc=Contoso,dc=com"))
            .unwrap();
        assert_eq!(tag, DnTag::new(10));
        assert!(resolver
            .resolve(&Dn::new("cn=Carol,dc=contoso,dc=com"))
            .is_err());
    }

    #[test]
    fn test_delete_current_removes_row_and_dn() {
        let db = seeded();
        let mut cursor = db.open_data_table().unwrap();
        assert!(cursor.move_next().unwrap());
        cursor.delete_current().unwrap();
        assert!(cursor.current_tag().is_err());
        // Remaining record is still reachable.
        assert!(cursor.move_next().unwrap());
        assert_eq!(cursor.current_tag().unwrap(), DnTag::new(11));
        assert!(db
            .dn_resolver()
            .resolve(&Dn::new("CN=Alice,DC=contoso,DC=com"))
            .is_err());
    }

    #[test]
    fn test_sid_index_lookup() {
        let schema = schema();
        let sid: SecurityIdentifier = "S-1-5-21-1-2-3-500".parse().unwrap();
        let db = MemoryDirectory::builder(Arc::clone(&schema))
            .header(test_header())
            .object(
                DnTag::new(20),
                "CN=Admin,DC=contoso,DC=com",
                vec![(OBJECT_SID, AttributeValue::Bytes(sid.to_bytes()))],
            )
            .unwrap()
            .build();
        let index = schema.find_index_name(OBJECT_SID).unwrap();
        let mut cursor = db.open_data_table().unwrap();
        cursor.set_current_index(Some(&index)).unwrap();
        assert!(cursor.goto_key(&sid.to_key_bytes()).unwrap());
        assert_eq!(cursor.current_tag().unwrap(), DnTag::new(20));
    }
}
