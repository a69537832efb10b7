//! Distinguished names
//!
//! A thin value type over the textual DN form. Comparison is
//! case-insensitive on both attribute types and values, matching directory
//! semantics; the original spelling is preserved for display.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A distinguished name such as `CN=Alice,OU=Users,DC=contoso,DC=com`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dn(String);

impl Dn {
    /// Wrap a textual DN.
    pub fn new(dn: impl Into<String>) -> Self {
        Self(dn.into())
    }

    /// The DN as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The relative distinguished name: the first component.
    #[must_use]
    pub fn rdn(&self) -> Option<&str> {
        self.components().next()
    }

    /// The parent DN, if this is not a root entry.
    #[must_use]
    pub fn parent(&self) -> Option<Dn> {
        let mut components = self.components();
        components.next()?;
        let rest = components.collect::<Vec<_>>().join(",");
        if rest.is_empty() {
            None
        } else {
            Some(Dn(rest))
        }
    }

    /// Iterate over the DN components, leftmost first. Splitting honors
    /// backslash escapes but not quoted forms.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        let mut out = Vec::new();
        let bytes = self.0.as_bytes();
        let mut start = 0usize;
        let mut escaped = false;
        for (i, b) in bytes.iter().enumerate() {
            if escaped {
                escaped = false;
            } else if *b == b'\\' {
                escaped = true;
            } else if *b == b',' {
                out.push(self.0[start..i].trim());
                start = i + 1;
            }
        }
        if start <= self.0.len() {
            let last = self.0[start..].trim();
            if !last.is_empty() {
                out.push(last);
            }
        }
        out.into_iter()
    }
}

impl PartialEq for Dn {
    fn eq(&self, other: &Self) -> bool {
        let mine = self.components().collect::<Vec<_>>();
        let theirs = other.components().collect::<Vec<_>>();
        mine.len() == theirs.len()
            && mine
                .iter()
                .zip(theirs.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Eq for Dn {}

impl Display for Dn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Dn {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Dn {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        let dn = Dn::new("CN=Alice,OU=Users,DC=contoso,DC=com");
        let parts: Vec<_> = dn.components().collect();
        assert_eq!(parts, vec!["CN=Alice", "OU=Users", "DC=contoso", "DC=com"]);
        assert_eq!(dn.rdn(), Some("CN=Alice"));
    }

    #[test]
    fn test_parent() {
        let dn = Dn::new("CN=Alice,OU=Users,DC=contoso,DC=com");
        let parent = dn.parent().unwrap();
        assert_eq!(parent.as_str(), "OU=Users,DC=contoso,DC=com");
        assert_eq!(Dn::new("DC=com").parent(), None);
    }

    #[test]
    fn test_case_insensitive_equality() {
        let a = Dn::new("CN=Alice,DC=contoso,DC=com");
        let b = Dn::new("cn=alice,dc=CONTOSO,dc=com");
        assert_eq!(a, b);
        assert_ne!(a, Dn::new("CN=Bob,DC=contoso,DC=com"));
    }

    #[test]
    fn test_escaped_comma_stays_in_component() {
        let dn = Dn::new("CN=Smith\\, Alice,OU=Users,DC=contoso,DC=com");
        let parts: Vec<_> = dn.components().collect();
        assert_eq!(parts[0], "CN=Smith\\, Alice");
        assert_eq!(parts.len(), 4);
    }

    #[test]
    fn test_whitespace_between_components() {
        let dn = Dn::new("CN=Alice, OU=Users , DC=contoso,DC=com");
        assert_eq!(dn, Dn::new("CN=Alice,OU=Users,DC=contoso,DC=com"));
    }
}
