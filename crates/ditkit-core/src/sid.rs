//! Security identifiers
//!
//! The [`SecurityIdentifier`] type carries the three forms a SID takes in the
//! database layer: the `S-1-…` display string, the packed binary form stored
//! in `objectSid`, and the big-endian form used as a secondary index key
//! (big-endian sub-authorities make byte order agree with numeric order, so a
//! B-tree over the key sorts SIDs correctly).

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Maximum number of sub-authorities a SID may carry.
pub const MAX_SUB_AUTHORITIES: usize = 15;

/// Length of the fixed SID header (revision, count, 48-bit authority).
const HEADER_LEN: usize = 8;

/// A Windows security identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityIdentifier {
    revision: u8,
    /// 48-bit identifier authority.
    authority: u64,
    sub_authorities: Vec<u32>,
}

/// Error produced when a SID string or blob cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSidError {
    /// Human-readable description of the malformed input.
    pub message: String,
}

impl Display for ParseSidError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid security identifier: {}", self.message)
    }
}

impl std::error::Error for ParseSidError {}

fn parse_err(message: impl Into<String>) -> ParseSidError {
    ParseSidError {
        message: message.into(),
    }
}

impl SecurityIdentifier {
    /// Build a SID from its parts.
    pub fn new(authority: u64, sub_authorities: Vec<u32>) -> Result<Self, ParseSidError> {
        if authority > 0xFFFF_FFFF_FFFF {
            return Err(parse_err("identifier authority exceeds 48 bits"));
        }
        if sub_authorities.len() > MAX_SUB_AUTHORITIES {
            return Err(parse_err(format!(
                "too many sub-authorities: {}",
                sub_authorities.len()
            )));
        }
        Ok(Self {
            revision: 1,
            authority,
            sub_authorities,
        })
    }

    /// The identifier authority (48-bit).
    #[must_use]
    pub fn authority(&self) -> u64 {
        self.authority
    }

    /// The sub-authority values.
    #[must_use]
    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }

    /// The relative identifier: the last sub-authority, if any.
    #[must_use]
    pub fn rid(&self) -> Option<u32> {
        self.sub_authorities.last().copied()
    }

    /// The domain portion of this SID (everything except the RID).
    #[must_use]
    pub fn domain_sid(&self) -> Option<SecurityIdentifier> {
        if self.sub_authorities.is_empty() {
            return None;
        }
        Some(Self {
            revision: self.revision,
            authority: self.authority,
            sub_authorities: self.sub_authorities[..self.sub_authorities.len() - 1].to_vec(),
        })
    }

    /// Append a relative identifier, producing a new SID.
    pub fn with_rid(&self, rid: u32) -> Result<Self, ParseSidError> {
        let mut subs = self.sub_authorities.clone();
        subs.push(rid);
        Self::new(self.authority, subs)
    }

    /// Packed binary form as stored in `objectSid`: revision, sub-authority
    /// count, big-endian 48-bit authority, then little-endian sub-authorities.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + 4 * self.sub_authorities.len());
        out.push(self.revision);
        out.push(self.sub_authorities.len() as u8);
        out.extend_from_slice(&self.authority.to_be_bytes()[2..8]);
        for sub in &self.sub_authorities {
            out.extend_from_slice(&sub.to_le_bytes());
        }
        out
    }

    /// Big-endian binary form used to compose index keys. Identical to
    /// [`Self::to_bytes`] except the sub-authorities are big-endian.
    #[must_use]
    pub fn to_key_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + 4 * self.sub_authorities.len());
        out.push(self.revision);
        out.push(self.sub_authorities.len() as u8);
        out.extend_from_slice(&self.authority.to_be_bytes()[2..8]);
        for sub in &self.sub_authorities {
            out.extend_from_slice(&sub.to_be_bytes());
        }
        out
    }

    /// Parse the packed binary form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseSidError> {
        if bytes.len() < HEADER_LEN {
            return Err(parse_err(format!("blob too short: {} bytes", bytes.len())));
        }
        let revision = bytes[0];
        if revision != 1 {
            return Err(parse_err(format!("unsupported revision {revision}")));
        }
        let count = bytes[1] as usize;
        if count > MAX_SUB_AUTHORITIES {
            return Err(parse_err(format!("too many sub-authorities: {count}")));
        }
        if bytes.len() != HEADER_LEN + 4 * count {
            return Err(parse_err(format!(
                "expected {} bytes for {} sub-authorities, got {}",
                HEADER_LEN + 4 * count,
                count,
                bytes.len()
            )));
        }
        let mut authority_bytes = [0u8; 8];
        authority_bytes[2..8].copy_from_slice(&bytes[2..8]);
        let authority = u64::from_be_bytes(authority_bytes);
        let sub_authorities = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self {
            revision,
            authority,
            sub_authorities,
        })
    }
}

impl Display for SecurityIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "S-{}-{}", self.revision, self.authority)?;
        for sub in &self.sub_authorities {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

impl FromStr for SecurityIdentifier {
    type Err = ParseSidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        match parts.next() {
            Some(p) if p.eq_ignore_ascii_case("s") => {}
            _ => return Err(parse_err("missing `S-` prefix")),
        }
        let revision: u8 = parts
            .next()
            .ok_or_else(|| parse_err("missing revision"))?
            .parse()
            .map_err(|_| parse_err("revision is not a number"))?;
        if revision != 1 {
            return Err(parse_err(format!("unsupported revision {revision}")));
        }
        let authority: u64 = parts
            .next()
            .ok_or_else(|| parse_err("missing identifier authority"))?
            .parse()
            .map_err(|_| parse_err("identifier authority is not a number"))?;
        let sub_authorities = parts
            .map(|p| {
                p.parse::<u32>()
                    .map_err(|_| parse_err(format!("sub-authority `{p}` is not a number")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(authority, sub_authorities)
    }
}

impl Serialize for SecurityIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SecurityIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
