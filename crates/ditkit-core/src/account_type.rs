//! Decoded `sAMAccountType` code points
//!
//! The data table stores an object's SAM role as one of a fixed set of
//! 32-bit codes. The agent classifies objects through this decoded form:
//! an "account" is a security principal with an account role (user, machine
//! or trust), while groups and aliases are security principals without one.

use serde::{Deserialize, Serialize};

/// SAM account type code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamAccountType {
    /// A domain object.
    DomainObject,
    /// A security-enabled global group.
    GroupObject,
    /// A distribution global group.
    NonSecurityGroupObject,
    /// A security-enabled local group (alias).
    AliasObject,
    /// A distribution local group.
    NonSecurityAliasObject,
    /// A normal user account.
    UserObject,
    /// A computer account.
    MachineAccount,
    /// An inter-domain trust account.
    TrustAccount,
    /// An application basic group.
    AppBasicGroup,
    /// An application query group.
    AppQueryGroup,
}

impl SamAccountType {
    /// Decode the stored 32-bit code, if recognised.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code as u32 {
            0x0000_0000 => Some(Self::DomainObject),
            0x1000_0000 => Some(Self::GroupObject),
            0x1000_0001 => Some(Self::NonSecurityGroupObject),
            0x2000_0000 => Some(Self::AliasObject),
            0x2000_0001 => Some(Self::NonSecurityAliasObject),
            0x3000_0000 => Some(Self::UserObject),
            0x3000_0001 => Some(Self::MachineAccount),
            0x3000_0002 => Some(Self::TrustAccount),
            0x4000_0000 => Some(Self::AppBasicGroup),
            0x4000_0001 => Some(Self::AppQueryGroup),
            _ => None,
        }
    }

    /// The stored 32-bit code.
    #[must_use]
    pub fn code(self) -> i32 {
        (match self {
            Self::DomainObject => 0x0000_0000u32,
            Self::GroupObject => 0x1000_0000,
            Self::NonSecurityGroupObject => 0x1000_0001,
            Self::AliasObject => 0x2000_0000,
            Self::NonSecurityAliasObject => 0x2000_0001,
            Self::UserObject => 0x3000_0000,
            Self::MachineAccount => 0x3000_0001,
            Self::TrustAccount => 0x3000_0002,
            Self::AppBasicGroup => 0x4000_0000,
            Self::AppQueryGroup => 0x4000_0001,
        }) as i32
    }

    /// Whether this is a security principal with an account role.
    #[must_use]
    pub fn is_account(self) -> bool {
        matches!(
            self,
            Self::UserObject | Self::MachineAccount | Self::TrustAccount
        )
    }

    /// Whether this object carries a SID of its own.
    #[must_use]
    pub fn is_security_principal(self) -> bool {
        self.is_account() || matches!(self, Self::GroupObject | Self::AliasObject)
    }
}

impl std::fmt::Display for SamAccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DomainObject => "domain",
            Self::GroupObject => "group",
            Self::NonSecurityGroupObject => "distribution group",
            Self::AliasObject => "alias",
            Self::NonSecurityAliasObject => "distribution alias",
            Self::UserObject => "user",
            Self::MachineAccount => "machine",
            Self::TrustAccount => "trust",
            Self::AppBasicGroup => "application basic group",
            Self::AppQueryGroup => "application query group",
        };
        f.write_str(name)
    }
}
