//! Data-table cursor contract
//!
//! One cursor is shared by every operation of an agent session. It carries
//! three pieces of position state: the current index, an optional range
//! filter, and the current record. `find_records` positions *before* the
//! first match, so scans are uniform `while cursor.move_next()?` loops;
//! `goto_key` lands directly on the record of a unique index.
//!
//! Internal helpers that re-seek the cursor from within a caller's in-flight
//! enumeration save the location first and restore it on every exit path.

use crate::meta::AttributeMeta;
use crate::value::AttributeValue;
use ditkit_core::{AttributeId, DirectoryResult, DnTag};
use serde::{Deserialize, Serialize};

/// Match semantics for a range seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// Only records whose key equals the sought key.
    Equal,
    /// All records at or after the sought key.
    GreaterOrEqual,
}

/// A saved cursor position.
///
/// The record is remembered by primary key so the position survives
/// unrelated record mutations in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorLocation {
    /// Current index; `None` is the primary index.
    pub index: Option<String>,
    /// Tag of the current record, when positioned on one.
    pub tag: Option<DnTag>,
    /// Active range filter, if a range seek was in progress.
    pub range: Option<(MatchKind, Vec<u8>)>,
}

/// The shared data-table cursor.
pub trait DataCursor {
    /// Name of the current index; `None` is the primary index.
    fn current_index(&self) -> Option<&str>;

    /// Switch the current index and position before its first record. Any
    /// active range filter is cleared.
    fn set_current_index(&mut self, index: Option<&str>) -> DirectoryResult<()>;

    /// Seek directly to the record with the given key on a unique index.
    /// Returns whether a record was found; on `false` the position is
    /// unchanged.
    fn goto_key(&mut self, key: &[u8]) -> DirectoryResult<bool>;

    /// Establish a range filter and position before its first record.
    /// Returns whether at least one record falls in the range.
    fn find_records(&mut self, matching: MatchKind, key: &[u8]) -> DirectoryResult<bool>;

    /// Step to the next record within the active range (or the whole index
    /// when no range is active). Returns `false` once exhausted.
    fn move_next(&mut self) -> DirectoryResult<bool>;

    /// Capture the current position.
    fn save_location(&self) -> DirectoryResult<CursorLocation>;

    /// Return to a previously captured position.
    fn restore_location(&mut self, location: &CursorLocation) -> DirectoryResult<()>;

    /// Primary key of the current record.
    fn current_tag(&self) -> DirectoryResult<DnTag>;

    /// Open an edit buffer over the current record. Writes are staged until
    /// [`Self::accept_changes`].
    fn begin_edit_for_update(&mut self) -> DirectoryResult<()>;

    /// Apply the staged edit to the table.
    fn accept_changes(&mut self) -> DirectoryResult<()>;

    /// Discard the staged edit.
    fn reject_changes(&mut self) -> DirectoryResult<()>;

    /// Read the first value of an attribute of the current record.
    fn get_value(&self, attr: AttributeId) -> DirectoryResult<Option<AttributeValue>>;

    /// Read all values of a multi-valued attribute of the current record.
    fn get_values(&self, attr: AttributeId) -> DirectoryResult<Vec<AttributeValue>>;

    /// Stage a single-valued write. `None` clears the attribute. Returns
    /// whether the stored value actually changed.
    fn set_value(
        &mut self,
        attr: AttributeId,
        value: Option<AttributeValue>,
    ) -> DirectoryResult<bool>;

    /// Stage a multi-valued merge-append. Returns whether the value set
    /// grew.
    fn add_values(
        &mut self,
        attr: AttributeId,
        values: Vec<AttributeValue>,
    ) -> DirectoryResult<bool>;

    /// Read the replication metadata of an attribute of the current record.
    fn get_meta(&self, attr: AttributeId) -> DirectoryResult<Option<AttributeMeta>>;

    /// Stage a metadata write.
    fn set_meta(&mut self, attr: AttributeId, meta: AttributeMeta) -> DirectoryResult<()>;

    /// Delete the current record and its index entries. The cursor is left
    /// without a current record.
    fn delete_current(&mut self) -> DirectoryResult<()>;
}
