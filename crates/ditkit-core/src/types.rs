//! Database variant/state enums and the object identifier sum type

use crate::dn::Dn;
use crate::ids::DnTag;
use crate::sid::SecurityIdentifier;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two directory database flavors.
///
/// They differ only in where the PEK-holder object lives and whether the
/// boot key is supplied out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseVariant {
    /// Full domain controller database (boot key supplied externally,
    /// PEK list on the domain naming context).
    DirectoryServices,
    /// Lightweight directory services instance (boot key reconstructed from
    /// in-database fragments, PEK list on the configuration naming context).
    LightweightDirectoryServices,
}

impl std::fmt::Display for DatabaseVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryServices => f.write_str("AD DS"),
            Self::LightweightDirectoryServices => f.write_str("AD LDS"),
        }
    }
}

/// Promotion state of the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DcState {
    /// Freshly created database; no secrets present yet.
    Boot,
    /// Mid-promotion.
    Intermediate,
    /// Fully promoted.
    Normal,
}

impl DcState {
    /// Decode the stored state code, if recognised.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Boot),
            1 => Some(Self::Intermediate),
            2 => Some(Self::Normal),
            _ => None,
        }
    }

    /// The stored state code.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Boot => 0,
            Self::Intermediate => 1,
            Self::Normal => 2,
        }
    }
}

/// The identifier kinds an object can be located by.
///
/// One sum type replaces per-kind lookup overloads; the agent dispatches on
/// the variant to pick the backing index and compose the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectIdentifier {
    /// `sAMAccountName` (non-unique index; the first live writable row wins).
    Sam(String),
    /// `objectSid` in its binary index form.
    Sid(SecurityIdentifier),
    /// Distinguished name, resolved to a tag before lookup.
    Dn(Dn),
    /// `objectGUID`.
    Guid(Uuid),
    /// The primary key itself.
    Tag(DnTag),
}

impl ObjectIdentifier {
    /// Identifier by SAM account name.
    pub fn sam(name: impl Into<String>) -> Self {
        Self::Sam(name.into())
    }

    /// Identifier by SID.
    #[must_use]
    pub fn sid(sid: SecurityIdentifier) -> Self {
        Self::Sid(sid)
    }

    /// Identifier by distinguished name.
    pub fn dn(dn: impl Into<Dn>) -> Self {
        Self::Dn(dn.into())
    }

    /// Identifier by object GUID.
    #[must_use]
    pub fn guid(guid: Uuid) -> Self {
        Self::Guid(guid)
    }

    /// Identifier by distinguished name tag.
    #[must_use]
    pub fn tag(tag: DnTag) -> Self {
        Self::Tag(tag)
    }
}

impl std::fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sam(name) => write!(f, "sAMAccountName={name}"),
            Self::Sid(sid) => write!(f, "objectSid={sid}"),
            Self::Dn(dn) => write!(f, "dn={dn}"),
            Self::Guid(guid) => write!(f, "objectGUID={guid}"),
            Self::Tag(tag) => write!(f, "DNT={tag}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_code_roundtrip() {
        for state in [DcState::Boot, DcState::Intermediate, DcState::Normal] {
            assert_eq!(DcState::from_code(state.code()), Some(state));
        }
        assert_eq!(DcState::from_code(7), None);
    }

    #[test]
    fn test_variant_display() {
        assert_eq!(DatabaseVariant::DirectoryServices.to_string(), "AD DS");
        assert_eq!(
            DatabaseVariant::LightweightDirectoryServices.to_string(),
            "AD LDS"
        );
    }

    #[test]
    fn test_identifier_display() {
        assert_eq!(
            ObjectIdentifier::sam("alice").to_string(),
            "sAMAccountName=alice"
        );
        assert_eq!(
            ObjectIdentifier::tag(DnTag::new(3562)).to_string(),
            "DNT=3562"
        );
        let sid: SecurityIdentifier = "S-1-5-21-1-2-3-500".parse().unwrap();
        assert_eq!(
            ObjectIdentifier::sid(sid).to_string(),
            "objectSid=S-1-5-21-1-2-3-500"
        );
    }
}
